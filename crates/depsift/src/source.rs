//! Candidate manifest sources.
//!
//! A [`ManifestSource`] computes the full dependency manifest of a project,
//! a superset of what a given build actually uses. The observer narrows it
//! down afterwards.

use async_trait::async_trait;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::manifest::{MANIFEST_FILE_NAME, PackageManifest};
use crate::{Error, Result};

/// Version used when neither the project nor the identity carries one.
const DEFAULT_VERSION: &str = "0.0.1";

/// The project a build belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectIdentity {
    /// Project name, used when the project has no manifest of its own.
    pub name: String,
    /// Project root, relative to the workspace root or absolute.
    pub root: PathBuf,
}

impl ProjectIdentity {
    pub fn new(name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            root: root.into(),
        }
    }
}

/// What the caller needs from the candidate manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestRequest {
    /// Leave out development dependencies.
    pub production_only: bool,
    /// Helper dependencies that must be declared even when static analysis
    /// does not see them.
    pub force_include: BTreeSet<String>,
}

impl ManifestRequest {
    pub fn production() -> Self {
        Self {
            production_only: true,
            force_include: BTreeSet::new(),
        }
    }

    pub fn with_helpers(mut self, helpers: impl IntoIterator<Item = String>) -> Self {
        self.force_include.extend(helpers);
        self
    }
}

/// Computes the full dependency manifest for a project.
#[async_trait]
pub trait ManifestSource: Send + Sync {
    async fn candidate_manifest(
        &self,
        project: &ProjectIdentity,
        request: &ManifestRequest,
    ) -> Result<PackageManifest>;
}

/// A source that always hands out the same manifest.
#[derive(Debug, Clone, Default)]
pub struct StaticManifestSource {
    manifest: PackageManifest,
}

impl StaticManifestSource {
    pub fn new(manifest: PackageManifest) -> Self {
        Self { manifest }
    }
}

#[async_trait]
impl ManifestSource for StaticManifestSource {
    async fn candidate_manifest(
        &self,
        _project: &ProjectIdentity,
        _request: &ManifestRequest,
    ) -> Result<PackageManifest> {
        Ok(self.manifest.clone())
    }
}

/// Derives candidate manifests from the package.json files of a workspace.
///
/// The workspace root manifest supplies versions for anything the project
/// manifest does not pin itself. Helper dependencies are added only when
/// they resolve to a production-eligible declaration; peer-only helpers and,
/// for production requests, dev-only helpers are left out.
#[derive(Debug, Clone)]
pub struct WorkspaceManifestSource {
    workspace_root: PathBuf,
}

impl WorkspaceManifestSource {
    pub fn new(workspace_root: impl Into<PathBuf>) -> Self {
        Self {
            workspace_root: workspace_root.into(),
        }
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    fn project_root(&self, project: &ProjectIdentity) -> PathBuf {
        if project.root.is_absolute() {
            project.root.clone()
        } else {
            self.workspace_root.join(&project.root)
        }
    }
}

#[async_trait]
impl ManifestSource for WorkspaceManifestSource {
    async fn candidate_manifest(
        &self,
        project: &ProjectIdentity,
        request: &ManifestRequest,
    ) -> Result<PackageManifest> {
        let root_path = self.workspace_root.join(MANIFEST_FILE_NAME);
        let root = PackageManifest::read_optional(&root_path)
            .await?
            .ok_or(Error::WorkspaceManifestNotFound(root_path))?;

        let project_root = self.project_root(project);
        let own = if project_root == self.workspace_root {
            None
        } else {
            PackageManifest::read_optional(&project_root.join(MANIFEST_FILE_NAME)).await?
        };

        Ok(compose_candidate(project, &root, own.as_ref(), request))
    }
}

/// Build the candidate manifest for `project` from the workspace root
/// manifest and the project's own manifest.
pub fn compose_candidate(
    project: &ProjectIdentity,
    root: &PackageManifest,
    own: Option<&PackageManifest>,
    request: &ManifestRequest,
) -> PackageManifest {
    let declared = own.unwrap_or(root);

    let mut candidate = PackageManifest {
        name: declared
            .name
            .clone()
            .filter(|_| own.is_some())
            .or_else(|| Some(project.name.clone())),
        version: own
            .and_then(|m| m.version.clone())
            .or_else(|| Some(DEFAULT_VERSION.to_string())),
        metadata: own.map(|m| m.metadata.clone()).unwrap_or_default(),
        ..Default::default()
    };

    let resolve = |name: &str, version: &String| -> String {
        if own.is_some() && is_workspace_protocol(version) {
            root.production_version(name)
                .or_else(|| root.dev_dependencies.get(name))
                .cloned()
                .unwrap_or_else(|| version.clone())
        } else {
            version.clone()
        }
    };

    for (name, version) in declared
        .dependencies
        .iter()
        .chain(declared.optional_dependencies.iter())
    {
        candidate
            .dependencies
            .insert(name.clone(), resolve(name, version));
    }

    if !request.production_only {
        for (name, version) in &declared.dev_dependencies {
            candidate
                .dependencies
                .entry(name.clone())
                .or_insert_with(|| resolve(name, version));
        }
    }

    for helper in &request.force_include {
        if candidate.dependencies.contains_key(helper) {
            continue;
        }
        let version = own
            .and_then(|m| helper_version(m, helper, request.production_only))
            .or_else(|| helper_version(root, helper, request.production_only));

        match version {
            Some(version) => {
                candidate
                    .dependencies
                    .insert(helper.clone(), resolve(helper, version));
            }
            None => debug!(package = %helper, "helper dependency has no production declaration"),
        }
    }

    candidate
}

fn helper_version<'a>(
    manifest: &'a PackageManifest,
    name: &str,
    production_only: bool,
) -> Option<&'a String> {
    manifest.production_version(name).or_else(|| {
        if production_only {
            None
        } else {
            manifest.dev_dependencies.get(name)
        }
    })
}

fn is_workspace_protocol(version: &str) -> bool {
    version.starts_with("workspace:") || version == "*"
}
