//! Integration tests for the dependency observer.
//!
//! These drive `BuildObserver` with synthetic event sequences, the same way a
//! bundler integration would.

use std::fs;
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use depsift::{
    BuildObserver, DependencyObserver, ExternalMatcher, ExternalTest, ManifestRequest,
    ManifestSource, PackageManifest, ProjectIdentity, StaticManifestSource,
    WorkspaceManifestSource,
};
use tempfile::TempDir;

fn project() -> ProjectIdentity {
    ProjectIdentity::new("web", "apps/web")
}

fn candidate(deps: &[(&str, &str)]) -> PackageManifest {
    let mut manifest = PackageManifest::new("web", "1.0.0");
    for (name, version) in deps {
        manifest
            .dependencies
            .insert(name.to_string(), version.to_string());
    }
    manifest
}

/// Records the request it was given so tests can inspect it.
struct RecordingSource {
    manifest: PackageManifest,
    last_request: Mutex<Option<ManifestRequest>>,
    calls: AtomicUsize,
}

#[async_trait]
impl ManifestSource for RecordingSource {
    async fn candidate_manifest(
        &self,
        _project: &ProjectIdentity,
        request: &ManifestRequest,
    ) -> depsift::Result<PackageManifest> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request.clone());
        Ok(self.manifest.clone())
    }
}

#[tokio::test]
async fn test_regex_matcher_scenario() {
    let test = ExternalTest::new([ExternalMatcher::pattern("^react").unwrap()]);
    let mut observer = DependencyObserver::new(test, project(), "/ws");

    observer.on_configured();
    observer
        .on_module_resolved("react/jsx-runtime", Some("/ws/apps/web/src/main.tsx"))
        .unwrap();
    observer
        .on_module_resolved("react-dom/client", Some("/ws/apps/web/src/main.tsx"))
        .unwrap();
    observer
        .on_module_resolved("./local/util", Some("/ws/apps/web/src/main.tsx"))
        .unwrap();

    assert_eq!(observer.observed().sorted(), vec!["react", "react-dom"]);

    let source = StaticManifestSource::new(candidate(&[
        ("react", "18.2.0"),
        ("react-dom", "18.2.0"),
        ("next", "14.1.0"),
    ]));
    let synthesized = observer.on_complete(&source).await.unwrap();

    let names: Vec<&str> = synthesized
        .manifest
        .dependencies
        .keys()
        .map(String::as_str)
        .collect();
    assert_eq!(names, vec!["react", "react-dom"]);
    assert!(synthesized.warning.is_none());
}

#[tokio::test]
async fn test_no_matcher_yields_empty_manifest() {
    let mut observer = DependencyObserver::new(ExternalTest::default(), project(), "/ws");

    observer.on_configured();
    for path in ["react", "lodash/debounce", "@scope/pkg/sub"] {
        observer.on_module_resolved(path, Some("src/index.ts")).unwrap();
    }
    assert!(observer.observed().is_empty());

    let source = StaticManifestSource::new(candidate(&[("react", "18.2.0")]));
    let synthesized = observer.on_complete(&source).await.unwrap();
    assert!(synthesized.manifest.dependencies.is_empty());
    assert!(synthesized.warning.is_none());
}

#[tokio::test]
async fn test_single_aggregated_warning_for_omitted() {
    let test = ExternalTest::new([
        ExternalMatcher::prefix("a"),
        ExternalMatcher::prefix("b"),
    ]);
    let mut observer = DependencyObserver::new(test, project(), "/ws");
    observer.on_configured();
    observer.on_module_resolved("a", Some("src/x.ts")).unwrap();
    observer.on_module_resolved("b/deep/file.js", Some("src/x.ts")).unwrap();

    let source = StaticManifestSource::new(candidate(&[("a", "1.0.0"), ("c", "2.0.0")]));
    let synthesized = observer.on_complete(&source).await.unwrap();

    assert_eq!(synthesized.manifest.dependencies.len(), 1);
    assert_eq!(synthesized.manifest.dependencies["a"], "1.0.0");
    let warning = synthesized.warning.expect("omission warning");
    assert_eq!(warning.omitted, vec!["b".to_string()]);
}

#[tokio::test]
async fn test_candidate_requested_once_as_production_with_helpers() {
    let test = ExternalTest::new([ExternalMatcher::predicate(|path, _| {
        Ok(!path.starts_with('.'))
    })]);
    let mut observer = DependencyObserver::new(test, project(), "/ws");
    observer.on_configured();
    observer.on_module_resolved("@scope/pkg/sub", Some("src/a.ts")).unwrap();
    observer.on_module_resolved("lodash/debounce", Some("src/a.ts")).unwrap();
    observer.on_module_resolved("./sibling", Some("src/a.ts")).unwrap();

    let source = RecordingSource {
        manifest: candidate(&[("lodash", "^4.17.21"), ("@scope/pkg", "1.0.0")]),
        last_request: Default::default(),
        calls: AtomicUsize::new(0),
    };
    let synthesized = observer.on_complete(&source).await.unwrap();

    assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    let request = source.last_request.lock().unwrap().clone().unwrap();
    assert!(request.production_only);
    let helpers: Vec<&str> = request.force_include.iter().map(String::as_str).collect();
    assert_eq!(helpers, vec!["@scope/pkg", "lodash"]);

    assert_eq!(synthesized.manifest.dependencies["lodash"], "^4.17.21");
    assert_eq!(synthesized.manifest.dependencies["@scope/pkg"], "1.0.0");
}

#[tokio::test]
async fn test_versions_copied_verbatim() {
    let test = ExternalTest::new([ExternalMatcher::pattern(".*").unwrap()]);
    let mut observer = DependencyObserver::new(test, project(), "/ws");
    observer.on_configured();
    observer.on_module_resolved("weird", None).unwrap();

    let version = "git+https://example.com/weird.git#v1.0.0 ";
    let source = StaticManifestSource::new(candidate(&[("weird", version)]));
    let synthesized = observer.on_complete(&source).await.unwrap();
    assert_eq!(synthesized.manifest.dependencies["weird"], version);
}

#[tokio::test]
async fn test_predicate_error_aborts_before_synthesis() {
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&calls);
    let test = ExternalTest::new([ExternalMatcher::predicate(move |path, _| {
        seen.fetch_add(1, Ordering::SeqCst);
        if path == "broken" {
            anyhow::bail!("cannot classify {path}");
        }
        Ok(true)
    })]);
    let mut observer = DependencyObserver::new(test, project(), "/ws");
    observer.on_configured();

    observer.on_module_resolved("fine", None).unwrap();
    let err = observer.on_module_resolved("broken", None).unwrap_err();
    assert!(err.to_string().contains("cannot classify broken"));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_fresh_set_per_build() {
    let test = ExternalTest::new([ExternalMatcher::prefix("react")]);
    let mut observer = DependencyObserver::new(test, project(), "/ws");
    let source = StaticManifestSource::new(candidate(&[("react", "18.2.0")]));

    observer.on_configured();
    observer.on_module_resolved("react", None).unwrap();
    let first = observer.on_complete(&source).await.unwrap();
    assert_eq!(first.manifest.dependencies.len(), 1);

    observer.on_configured();
    let second = observer.on_complete(&source).await.unwrap();
    assert!(second.manifest.dependencies.is_empty());
}

#[tokio::test]
async fn test_workspace_source_end_to_end() {
    let temp = TempDir::new().unwrap();
    let ws = temp.path();
    fs::write(
        ws.join("package.json"),
        r#"{
            "name": "monorepo",
            "dependencies": { "react": "18.2.0", "zod": "3.22.4" },
            "devDependencies": { "vitest": "1.2.0" }
        }"#,
    )
    .unwrap();

    let test = ExternalTest::new([ExternalMatcher::predicate(|path, _| {
        Ok(!path.starts_with('.') && !path.starts_with("src/"))
    })]);
    let mut observer = DependencyObserver::new(test, project(), ws.join("apps/web"));
    observer.on_configured();

    let node_modules = ws.join("node_modules");
    for file in ["react/index.js", "zod/lib/index.mjs", "vitest/dist/index.js"] {
        let resolved = node_modules.join(file);
        observer
            .on_module_resolved(resolved.to_str().unwrap(), Some("src/main.ts"))
            .unwrap();
    }
    observer
        .on_module_resolved(ws.join("apps/web/src/util.ts").to_str().unwrap(), None)
        .unwrap();

    let source = WorkspaceManifestSource::new(ws);
    let synthesized = observer.on_complete(&source).await.unwrap();

    assert_eq!(synthesized.manifest.name.as_deref(), Some("web"));
    assert_eq!(synthesized.manifest.dependencies["react"], "18.2.0");
    assert_eq!(synthesized.manifest.dependencies["zod"], "3.22.4");
    assert!(!synthesized.manifest.dependencies.contains_key("vitest"));
    assert_eq!(synthesized.warning.unwrap().omitted, vec!["vitest".to_string()]);

    let json = synthesized_json(&synthesized.manifest);
    assert!(json.contains("\"react\": \"18.2.0\""));
}

fn synthesized_json(manifest: &PackageManifest) -> String {
    manifest.to_json_pretty().unwrap()
}
