//! Dependency observer.
//!
//! The observer is driven by three build events:
//!
//! ```text
//! on_configured ──▶ on_module_resolved (× N) ──▶ on_complete
//!   fresh set         classify + record            candidate ∩ observed
//! ```
//!
//! Only modules reported as external by the [`ExternalTest`] contribute a
//! package name. At completion a candidate manifest is requested from a
//! [`ManifestSource`] and its dependency map is narrowed to exactly the names
//! that were observed, keeping version strings verbatim.

use async_trait::async_trait;
use rustc_hash::FxHashSet;
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::manifest::{DependencyMap, MANIFEST_FILE_NAME, PackageManifest};
use crate::matcher::ExternalTest;
use crate::package_name::{extract_package_name, is_plausible_package_name, relative_module_path};
use crate::source::{ManifestRequest, ManifestSource, ProjectIdentity};
use crate::Result;

/// Canonical package names observed during one build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObservedDependencySet {
    names: FxHashSet<String>,
}

impl ObservedDependencySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a package name. Returns true if it was not present yet.
    pub fn insert(&mut self, name: impl Into<String>) -> bool {
        self.names.insert(name.into())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Names in lexical order.
    pub fn sorted(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.names.iter().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for ObservedDependencySet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Observed dependencies that the candidate manifest did not declare.
///
/// This usually means the package is a dev or peer dependency of the project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyWarning {
    /// Omitted package names, sorted.
    pub omitted: Vec<String>,
}

impl fmt::Display for DependencyWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Some dependencies were not added to the package.json. This probably happened, \
             because it is a dev/peer dependency. The following dependencies were not added: {}",
            self.omitted.join(", ")
        )
    }
}

/// The outcome of manifest synthesis.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesizedManifest {
    /// Candidate manifest with dependencies narrowed to observed names.
    pub manifest: PackageManifest,
    /// At most one aggregated warning.
    pub warning: Option<DependencyWarning>,
}

impl SynthesizedManifest {
    /// Name of the emitted artifact.
    pub fn file_name(&self) -> &'static str {
        MANIFEST_FILE_NAME
    }

    /// Serialized artifact content.
    pub fn to_json(&self) -> Result<String> {
        self.manifest.to_json_pretty()
    }
}

/// Host-agnostic build event interface.
///
/// Any bundler integration drives an observer through these three calls, in
/// order, once per build.
#[async_trait]
pub trait BuildObserver: Send {
    /// The build has been configured; start from an empty state.
    fn on_configured(&mut self);

    /// A module request has been resolved.
    ///
    /// Errors only when the external test fails; the caller must abort.
    fn on_module_resolved(&mut self, resolved: &str, importer: Option<&str>) -> Result<()>;

    /// All modules are resolved; produce the manifest artifact.
    async fn on_complete(&mut self, source: &dyn ManifestSource) -> Result<SynthesizedManifest>;
}

/// Collects external package names for a single project build.
#[derive(Debug, Clone)]
pub struct DependencyObserver {
    test: ExternalTest,
    project: ProjectIdentity,
    build_root: PathBuf,
    observed: ObservedDependencySet,
}

impl DependencyObserver {
    /// Create an observer. `build_root` is the directory resolved module
    /// paths are relativized against.
    pub fn new(test: ExternalTest, project: ProjectIdentity, build_root: impl Into<PathBuf>) -> Self {
        Self {
            test,
            project,
            build_root: build_root.into(),
            observed: ObservedDependencySet::new(),
        }
    }

    pub fn project(&self) -> &ProjectIdentity {
        &self.project
    }

    pub fn build_root(&self) -> &Path {
        &self.build_root
    }

    pub fn observed(&self) -> &ObservedDependencySet {
        &self.observed
    }

    /// Classify one resolved module and record its package if external.
    pub fn observe(&mut self, resolved: &str, importer: Option<&str>) -> Result<()> {
        let relative = relative_module_path(resolved, &self.build_root);
        if relative.is_empty() {
            return Ok(());
        }

        if !self.test.is_external(&relative, importer)? {
            return Ok(());
        }

        let name = extract_package_name(&relative);
        if !is_plausible_package_name(name) {
            debug!(module = %relative, "matched module is not a package; skipping");
            return Ok(());
        }
        if self.observed.insert(name) {
            debug!(package = %name, module = %relative, "observed external dependency");
        }
        Ok(())
    }

    /// Hand out the observed set, leaving the observer empty.
    pub fn finish(&mut self) -> ObservedDependencySet {
        std::mem::take(&mut self.observed)
    }
}

#[async_trait]
impl BuildObserver for DependencyObserver {
    fn on_configured(&mut self) {
        if self.test.is_empty() {
            debug!(
                project = %self.project.name,
                "no external matcher configured; dependency collection is disabled"
            );
        }
        self.observed = ObservedDependencySet::new();
    }

    fn on_module_resolved(&mut self, resolved: &str, importer: Option<&str>) -> Result<()> {
        self.observe(resolved, importer)
    }

    async fn on_complete(&mut self, source: &dyn ManifestSource) -> Result<SynthesizedManifest> {
        let observed = self.finish();
        synthesize_manifest(&self.project, &observed, source).await
    }
}

/// Request a candidate manifest and narrow it to the observed names.
pub async fn synthesize_manifest(
    project: &ProjectIdentity,
    observed: &ObservedDependencySet,
    source: &dyn ManifestSource,
) -> Result<SynthesizedManifest> {
    let request = ManifestRequest::production()
        .with_helpers(observed.iter().map(str::to_string));
    let candidate = source.candidate_manifest(project, &request).await?;

    let synthesized = narrow_manifest(candidate, observed);
    if let Some(warning) = &synthesized.warning {
        warn!(project = %project.name, omitted = ?warning.omitted, "{}", warning);
    }
    Ok(synthesized)
}

/// Replace the candidate's dependency map by its intersection with
/// `observed`, reporting observed names the candidate lacks.
pub fn narrow_manifest(
    mut candidate: PackageManifest,
    observed: &ObservedDependencySet,
) -> SynthesizedManifest {
    let mut inserted = BTreeSet::new();
    let mut dependencies = DependencyMap::with_capacity(observed.len());

    for (name, version) in std::mem::take(&mut candidate.dependencies) {
        if !observed.contains(&name) {
            continue;
        }
        inserted.insert(name.clone());
        dependencies.insert(name, version);
    }
    candidate.dependencies = dependencies;

    let omitted: Vec<String> = observed
        .sorted()
        .into_iter()
        .filter(|name| !inserted.contains(*name))
        .map(str::to_string)
        .collect();

    SynthesizedManifest {
        manifest: candidate,
        warning: (!omitted.is_empty()).then_some(DependencyWarning { omitted }),
    }
}
