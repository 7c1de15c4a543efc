//! `depsift build`: run the framework build and assemble deployable output.

use crate::cli::BuildArgs;
use crate::commands::resolve_workspace_root;
use crate::config::{ConfigOverrides, DepsiftConfig, default_project_name};
use crate::error::Result;
use crate::ui;
use depsift::WorkspaceManifestSource;
use depsift::deploy;
use std::time::Instant;
use tracing::debug;

/// Execute the build command.
///
/// 1. Load and validate configuration (CLI > Env > File > Defaults)
/// 2. Run the deploy steps against the workspace manifests
/// 3. Print a summary
pub async fn execute(args: BuildArgs) -> Result<()> {
    let start_time = Instant::now();

    let workspace_root = resolve_workspace_root(args.workspace_root.as_deref())?;
    let overrides = ConfigOverrides::from_build_args(&args);
    let config = DepsiftConfig::load(&workspace_root, args.config.as_deref(), &overrides)?;
    debug!(?config, "loaded configuration");

    let project_name = args
        .project
        .clone()
        .unwrap_or_else(|| default_project_name(&workspace_root, &config.root));
    let options = config.deploy_options(&workspace_root, &project_name)?;

    match &options.build_command {
        Some(command) => ui::info(&format!("Running {}", command.display())),
        None => ui::info("No build command given, assembling output only"),
    }

    let source = WorkspaceManifestSource::new(&workspace_root);
    let summary = deploy::run(&options, &source).await?;

    let dependencies = summary.manifest.dependencies.len();
    ui::success(&format!(
        "Wrote {} with {} in {:.2}s",
        summary.output_dir.display(),
        ui::plural(dependencies, "dependency", "dependencies"),
        start_time.elapsed().as_secs_f64()
    ));
    if let Some(lockfile) = &summary.lockfile {
        ui::info(&format!("Copied {}", lockfile.display()));
    }
    if summary.public_files > 0 {
        ui::info(&format!(
            "Copied {} from public/",
            ui::plural(summary.public_files, "file", "files")
        ));
    }

    Ok(())
}
