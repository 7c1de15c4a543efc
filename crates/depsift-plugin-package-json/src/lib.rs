//! Rolldown plugin that emits a narrowed `package.json`.
//!
//! The plugin watches module resolution, records the packages its matchers
//! classify as external, and appends a `package.json` asset to the bundle
//! listing exactly those packages with the versions the workspace declares.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use depsift::ProjectIdentity;
//! use depsift_plugin_package_json::{PackageJsonPlugin, PackageJsonPluginOptions};
//!
//! # fn main() -> Result<(), depsift::Error> {
//! let options = PackageJsonPluginOptions::new(ProjectIdentity::new("api", "apps/api"), "/ws")
//!     .exclude("express")
//!     .exclude_pattern("^@prisma/")?;
//! let plugin = Arc::new(PackageJsonPlugin::new(options));
//! // Hand `plugin` to rolldown's `BundlerBuilder::with_plugins`.
//! # Ok(()) }
//! ```

use std::borrow::Cow;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use depsift::{
    BuildObserver, DependencyObserver, ExternalMatcher, ExternalTest, ManifestSource,
    ProjectIdentity, WorkspaceManifestSource, synthesize_manifest,
};
use parking_lot::Mutex;
use rolldown_common::{LogWithoutPlugin, Output, OutputAsset};
use rolldown_plugin::{
    HookBuildStartArgs, HookGenerateBundleArgs, HookNoopReturn, HookResolveIdArgs,
    HookResolveIdReturn, HookUsage, Plugin, PluginContext,
};
use tracing::debug;

/// Configuration for [`PackageJsonPlugin`].
pub struct PackageJsonPluginOptions {
    /// Matchers deciding which resolved modules are external packages.
    pub exclude: Vec<ExternalMatcher>,
    /// Project whose manifest is narrowed.
    pub project: ProjectIdentity,
    /// Directory resolved module paths are relativized against.
    pub root: PathBuf,
    /// Where candidate manifests come from. Defaults to the workspace at `root`.
    pub source: Option<Arc<dyn ManifestSource>>,
}

impl PackageJsonPluginOptions {
    pub fn new(project: ProjectIdentity, root: impl Into<PathBuf>) -> Self {
        Self {
            exclude: Vec::new(),
            project,
            root: root.into(),
            source: None,
        }
    }

    /// Treat modules matching `matcher` as external.
    pub fn exclude(mut self, matcher: impl Into<ExternalMatcher>) -> Self {
        self.exclude.push(matcher.into());
        self
    }

    /// Treat modules matching the regular expression as external.
    pub fn exclude_pattern(self, pattern: &str) -> depsift::Result<Self> {
        Ok(self.exclude(ExternalMatcher::pattern(pattern)?))
    }

    /// Treat modules accepted by `predicate` as external.
    pub fn exclude_with<F>(self, predicate: F) -> Self
    where
        F: Fn(&str, Option<&str>) -> anyhow::Result<bool> + Send + Sync + 'static,
    {
        self.exclude(ExternalMatcher::predicate(predicate))
    }

    pub fn source(mut self, source: Arc<dyn ManifestSource>) -> Self {
        self.source = Some(source);
        self
    }
}

impl fmt::Debug for PackageJsonPluginOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PackageJsonPluginOptions")
            .field("exclude", &self.exclude)
            .field("project", &self.project)
            .field("root", &self.root)
            .field("source", &self.source.as_ref().map(|_| ".."))
            .finish()
    }
}

/// Emits `package.json` for the external packages a bundle resolved.
pub struct PackageJsonPlugin {
    observer: Arc<Mutex<DependencyObserver>>,
    source: Arc<dyn ManifestSource>,
}

impl PackageJsonPlugin {
    pub fn new(options: PackageJsonPluginOptions) -> Self {
        let PackageJsonPluginOptions {
            exclude,
            project,
            root,
            source,
        } = options;

        let source = source.unwrap_or_else(|| Arc::new(WorkspaceManifestSource::new(&root)));
        let mut observer = DependencyObserver::new(ExternalTest::new(exclude), project, root);
        observer.on_configured();

        Self {
            observer: Arc::new(Mutex::new(observer)),
            source,
        }
    }

    /// Package names observed so far in the current build, sorted.
    pub fn observed(&self) -> Vec<String> {
        self.observer
            .lock()
            .observed()
            .sorted()
            .into_iter()
            .map(str::to_string)
            .collect()
    }
}

impl fmt::Debug for PackageJsonPlugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PackageJsonPlugin")
            .field("observer", &*self.observer.lock())
            .finish_non_exhaustive()
    }
}

impl Plugin for PackageJsonPlugin {
    fn name(&self) -> Cow<'static, str> {
        "depsift:package-json".into()
    }

    fn register_hook_usage(&self) -> HookUsage {
        HookUsage::BuildStart | HookUsage::ResolveId | HookUsage::GenerateBundle
    }

    fn build_start(
        &self,
        _ctx: &PluginContext,
        _args: &HookBuildStartArgs<'_>,
    ) -> impl std::future::Future<Output = HookNoopReturn> + Send {
        // A failed build never reaches generate_bundle, so reset here too.
        self.observer.lock().on_configured();
        async { Ok(()) }
    }

    fn resolve_id(
        &self,
        _ctx: &PluginContext,
        args: &HookResolveIdArgs,
    ) -> impl std::future::Future<Output = HookResolveIdReturn> + Send {
        let specifier = args.specifier.to_string();
        let importer = args.importer.as_deref().map(str::to_string);

        // Entry requests have no importer and are never packages.
        let outcome = match importer {
            Some(importer) => self
                .observer
                .lock()
                .on_module_resolved(&specifier, Some(&importer)),
            None => Ok(()),
        };

        async move {
            outcome?;
            // Let rolldown handle the actual resolution
            Ok(None)
        }
    }

    fn generate_bundle(
        &self,
        ctx: &PluginContext,
        args: &mut HookGenerateBundleArgs<'_>,
    ) -> impl std::future::Future<Output = HookNoopReturn> + Send {
        let observer = Arc::clone(&self.observer);
        let source = Arc::clone(&self.source);

        async move {
            // Take the set and reset before awaiting; the lock is not held
            // across the manifest lookup.
            let (project, observed) = {
                let mut observer = observer.lock();
                let observed = observer.finish();
                observer.on_configured();
                (observer.project().clone(), observed)
            };

            let synthesized = synthesize_manifest(&project, &observed, source.as_ref()).await?;
            if let Some(warning) = &synthesized.warning {
                ctx.warn(LogWithoutPlugin {
                    message: warning.to_string(),
                    ..Default::default()
                });
            }

            debug!(
                project = %project.name,
                dependencies = synthesized.manifest.dependencies.len(),
                "emitting package.json"
            );

            let asset = OutputAsset {
                names: vec![],
                original_file_names: vec![],
                filename: synthesized.file_name().into(),
                source: synthesized.to_json()?.into(),
            };
            args.bundle.push(Output::Asset(Arc::new(asset)));

            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use depsift::{PackageManifest, StaticManifestSource};

    fn options() -> PackageJsonPluginOptions {
        PackageJsonPluginOptions::new(ProjectIdentity::new("api", "apps/api"), "/ws")
    }

    #[test]
    fn test_plugin_name() {
        let plugin = PackageJsonPlugin::new(options());
        assert_eq!(plugin.name(), "depsift:package-json");
    }

    #[test]
    fn test_hook_usage() {
        let plugin = PackageJsonPlugin::new(options());
        let usage = plugin.register_hook_usage();
        assert!(usage.contains(HookUsage::BuildStart));
        assert!(usage.contains(HookUsage::ResolveId));
        assert!(usage.contains(HookUsage::GenerateBundle));
        assert!(!usage.contains(HookUsage::Transform));
    }

    #[test]
    fn test_options_builder() {
        let options = options()
            .exclude("express")
            .exclude_pattern("^@prisma/")
            .unwrap()
            .exclude_with(|path, _| Ok(path == "pg"))
            .source(Arc::new(StaticManifestSource::new(PackageManifest::new("api", "1.0.0"))));

        assert_eq!(options.exclude.len(), 3);
        assert!(options.source.is_some());
        assert_eq!(options.root, PathBuf::from("/ws"));
    }

    #[test]
    fn test_invalid_pattern() {
        let err = options().exclude_pattern("(unclosed").unwrap_err();
        assert!(matches!(err, depsift::Error::InvalidPattern { .. }));
    }

    #[test]
    fn test_starts_empty() {
        let plugin = PackageJsonPlugin::new(options().exclude("express"));
        assert!(plugin.observed().is_empty());
        assert!(format!("{plugin:?}").contains("PackageJsonPlugin"));
    }
}
