//! `depsift manifest`: narrow package.json from recorded module resolutions.
//!
//! The modules file holds one resolution per line, `resolved` or
//! `resolved<TAB>importer`. Blank lines and lines starting with `#` are
//! skipped.

use crate::cli::ManifestArgs;
use crate::commands::resolve_workspace_root;
use crate::config::{ConfigOverrides, DepsiftConfig, default_project_name};
use crate::error::{ConfigError, Result, ResultExt};
use crate::ui;
use depsift::{
    BuildObserver, DependencyObserver, MANIFEST_FILE_NAME, ProjectIdentity,
    WorkspaceManifestSource,
};
use std::io::Write;
use tracing::debug;

/// One recorded module resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleEvent {
    pub resolved: String,
    pub importer: Option<String>,
}

/// Parse the contents of a modules file.
pub fn parse_module_events(content: &str) -> Result<Vec<ModuleEvent>> {
    let mut events = Vec::new();

    for (index, raw) in content.lines().enumerate() {
        let line = raw.trim_end_matches('\r');
        if line.trim().is_empty() || line.trim_start().starts_with('#') {
            continue;
        }

        let invalid = || ConfigError::InvalidModuleEvent {
            line: index + 1,
            content: line.to_string(),
        };

        let mut parts = line.splitn(2, '\t');
        let resolved = parts.next().map(str::trim).unwrap_or_default();
        if resolved.is_empty() {
            return Err(invalid().into());
        }

        let importer = match parts.next().map(str::trim) {
            Some(importer) if importer.contains('\t') => return Err(invalid().into()),
            Some("") | None => None,
            Some(importer) => Some(importer.to_string()),
        };

        events.push(ModuleEvent {
            resolved: resolved.to_string(),
            importer,
        });
    }

    Ok(events)
}

/// Execute the manifest command.
pub async fn execute(args: ManifestArgs) -> Result<()> {
    let workspace_root = resolve_workspace_root(args.workspace_root.as_deref())?;
    let overrides = ConfigOverrides::from_manifest_args(&args);
    let config = DepsiftConfig::load(&workspace_root, args.config.as_deref(), &overrides)?;

    let content = tokio::fs::read_to_string(&args.modules)
        .await
        .with_path(&args.modules)?;
    let events = parse_module_events(&content)?;
    debug!(events = events.len(), modules = %args.modules.display(), "read module events");

    let project_name = args
        .project
        .clone()
        .unwrap_or_else(|| default_project_name(&workspace_root, &config.root));
    let project = ProjectIdentity::new(project_name, config.root.clone());

    let mut observer = DependencyObserver::new(config.external_test()?, project, &workspace_root);
    observer.on_configured();
    for event in &events {
        observer.on_module_resolved(&event.resolved, event.importer.as_deref())?;
    }

    let source = WorkspaceManifestSource::new(&workspace_root);
    let synthesized = observer.on_complete(&source).await?;
    if let Some(warning) = &synthesized.warning {
        ui::warning(&warning.to_string());
    }

    let json = synthesized.to_json()?;
    match &args.out {
        Some(out) => {
            let out_dir = if out.is_absolute() {
                out.clone()
            } else {
                workspace_root.join(out)
            };
            tokio::fs::create_dir_all(&out_dir).await?;
            let path = out_dir.join(MANIFEST_FILE_NAME);
            tokio::fs::write(&path, json).await?;
            ui::success(&format!(
                "Wrote {} with {}",
                path.display(),
                ui::plural(
                    synthesized.manifest.dependencies.len(),
                    "dependency",
                    "dependencies"
                )
            ));
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(json.as_bytes())?;
            stdout.flush()?;
        }
    }

    Ok(())
}
