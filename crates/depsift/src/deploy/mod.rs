//! Deployable output assembly.
//!
//! Runs a framework's production build and stitches the output directory
//! together around it:
//!
//! 1. check the project's `public` directory
//! 2. run the framework build command in the project root
//! 3. write a production `package.json` derived from the workspace
//! 4. optionally carry over the workspace lockfile
//! 5. copy the framework config file and `public/`

mod assets;
mod framework;

pub use assets::{
    LOCKFILE_NAMES, check_public_directory, copy_dir_dereferenced, copy_framework_config,
    copy_lockfile, find_lockfile,
};
pub use framework::FrameworkCommand;

use std::path::{Path, PathBuf};
use tracing::info;

use crate::manifest::{MANIFEST_FILE_NAME, PackageManifest};
use crate::source::{ManifestRequest, ManifestSource, ProjectIdentity};
use crate::{Error, Result};

/// Options for one deploy build.
#[derive(Debug, Clone)]
pub struct DeployOptions {
    /// Workspace root; relative paths below are resolved against it.
    pub workspace_root: PathBuf,
    /// Project name used when the project has no package.json.
    pub project_name: String,
    /// Project root, relative to the workspace root.
    pub root: PathBuf,
    /// Output directory, relative to the workspace root.
    pub output_path: PathBuf,
    /// Framework build command. `None` skips the build step.
    pub build_command: Option<FrameworkCommand>,
    /// Keep devDependencies in the written package.json.
    pub include_dev_dependencies: bool,
    /// Copy the workspace lockfile into the output.
    pub generate_lockfile: bool,
    /// Framework config file name to carry over (e.g. `next.config.js`).
    pub framework_config: Option<String>,
    /// Value for `scripts.start` in the written package.json.
    pub start_script: Option<String>,
}

impl DeployOptions {
    pub fn new(workspace_root: impl Into<PathBuf>, project_name: impl Into<String>) -> Self {
        Self {
            workspace_root: workspace_root.into(),
            project_name: project_name.into(),
            root: PathBuf::from("."),
            output_path: PathBuf::from("dist"),
            build_command: None,
            include_dev_dependencies: false,
            generate_lockfile: false,
            framework_config: None,
            start_script: None,
        }
    }

    pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    pub fn output_path(mut self, output_path: impl Into<PathBuf>) -> Self {
        self.output_path = output_path.into();
        self
    }

    pub fn build_command(mut self, command: FrameworkCommand) -> Self {
        self.build_command = Some(command);
        self
    }

    pub fn include_dev_dependencies(mut self, include: bool) -> Self {
        self.include_dev_dependencies = include;
        self
    }

    pub fn generate_lockfile(mut self, generate: bool) -> Self {
        self.generate_lockfile = generate;
        self
    }

    pub fn framework_config(mut self, file_name: impl Into<String>) -> Self {
        self.framework_config = Some(file_name.into());
        self
    }

    pub fn start_script(mut self, command: impl Into<String>) -> Self {
        self.start_script = Some(command.into());
        self
    }

    pub fn project_root(&self) -> PathBuf {
        resolve_against(&self.workspace_root, &self.root)
    }

    pub fn output_dir(&self) -> PathBuf {
        resolve_against(&self.workspace_root, &self.output_path)
    }

    pub fn project(&self) -> ProjectIdentity {
        ProjectIdentity::new(self.project_name.clone(), self.root.clone())
    }
}

fn resolve_against(base: &Path, path: &Path) -> PathBuf {
    use path_clean::PathClean;
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path).clean()
    }
}

/// What a deploy build produced.
#[derive(Debug, Clone)]
pub struct DeploySummary {
    pub output_dir: PathBuf,
    pub manifest: PackageManifest,
    pub lockfile: Option<PathBuf>,
    pub framework_config: Option<PathBuf>,
    /// Number of files copied from `public/`.
    pub public_files: usize,
}

/// Assemble the deployable output for a project.
pub async fn run(options: &DeployOptions, source: &dyn ManifestSource) -> Result<DeploySummary> {
    let project_root = options.project_root();
    let output_dir = options.output_dir();

    check_public_directory(&project_root)?;

    match &options.build_command {
        Some(command) => command.run(&project_root).await?,
        None => info!("no build command configured, skipping framework build"),
    }

    tokio::fs::create_dir_all(&output_dir)
        .await
        .map_err(|e| Error::io(format!("Failed to create {}", output_dir.display()), e))?;

    let request = ManifestRequest {
        production_only: !options.include_dev_dependencies,
        ..Default::default()
    };
    let mut manifest = source
        .candidate_manifest(&options.project(), &request)
        .await?;
    if let Some(start) = &options.start_script {
        manifest.set_script("start", start.clone());
    }

    let manifest_path = output_dir.join(MANIFEST_FILE_NAME);
    tokio::fs::write(&manifest_path, manifest.to_json_pretty()?)
        .await
        .map_err(|e| Error::io(format!("Failed to write {}", manifest_path.display()), e))?;
    info!(
        path = %manifest_path.display(),
        dependencies = manifest.dependencies.len(),
        "wrote package.json"
    );

    let lockfile = if options.generate_lockfile {
        let path = copy_lockfile(&options.workspace_root, &output_dir).await?;
        info!(path = %path.display(), "copied lockfile");
        Some(path)
    } else {
        None
    };

    let framework_config = match &options.framework_config {
        Some(file_name) => copy_framework_config(&project_root, file_name, &output_dir).await?,
        None => None,
    };

    let public_from = project_root.join("public");
    let public_to = output_dir.join("public");
    let public_files = tokio::task::spawn_blocking(move || {
        copy_dir_dereferenced(&public_from, &public_to)
    })
    .await
    .map_err(|e| Error::io("public directory copy task failed", std::io::Error::other(e)))??;
    if public_files > 0 {
        info!(files = public_files, "copied public assets");
    }

    Ok(DeploySummary {
        output_dir,
        manifest,
        lockfile,
        framework_config,
        public_files,
    })
}
