#![cfg_attr(docsrs, feature(doc_cfg))]

//! # depsift
//!
//! Record which external packages a bundle actually touches, and turn that
//! into a `package.json` that declares exactly those packages.
//!
//! The bundler does the real work; depsift watches its module resolution
//! events through a small host-agnostic interface ([`BuildObserver`]) and
//! narrows a full candidate manifest down to the observed names once the
//! build completes.
//!
//! ## Observe a build
//!
//! ```no_run
//! use depsift::{
//!     BuildObserver, DependencyObserver, ExternalMatcher, ExternalTest, ProjectIdentity,
//!     WorkspaceManifestSource,
//! };
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let test = ExternalTest::new([ExternalMatcher::pattern("^react")?]);
//! let mut observer = DependencyObserver::new(test, ProjectIdentity::new("web", "apps/web"), "/ws");
//!
//! observer.on_configured();
//! observer.on_module_resolved("react/jsx-runtime", Some("src/main.tsx"))?;
//! observer.on_module_resolved("react-dom/client", Some("src/main.tsx"))?;
//!
//! let source = WorkspaceManifestSource::new("/ws");
//! let synthesized = observer.on_complete(&source).await?;
//! std::fs::write("dist/package.json", synthesized.to_json()?)?;
//! # Ok(()) }
//! ```
//!
//! ## Assemble deployable output
//!
//! [`deploy::run`] wraps a framework's production build: it runs the build
//! command, writes a production `package.json`, optionally carries the
//! lockfile over, and copies the framework config and `public/` directory.

pub mod deploy;
pub mod error;
pub mod manifest;
pub mod matcher;
pub mod observer;
pub mod package_name;
pub mod source;

pub use error::{Error, Result};
pub use manifest::{DependencyMap, MANIFEST_FILE_NAME, PackageManifest};
pub use matcher::{ExternalMatcher, ExternalTest, PredicateFn};
pub use observer::{
    BuildObserver, DependencyObserver, DependencyWarning, ObservedDependencySet,
    SynthesizedManifest, narrow_manifest, synthesize_manifest,
};
pub use package_name::{extract_package_name, is_plausible_package_name, relative_module_path};
pub use source::{
    ManifestRequest, ManifestSource, ProjectIdentity, StaticManifestSource,
    WorkspaceManifestSource, compose_candidate,
};
