//! Configuration loaded from depsift.config.json, the environment and CLI
//! arguments.
//!
//! Priority: CLI > Environment > File > Defaults

mod loading;

use depsift::deploy::{DeployOptions, FrameworkCommand};
use depsift::{ExternalMatcher, ExternalTest};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, Result};

pub use loading::{CONFIG_FILE_NAME, ConfigOverrides, ENV_PREFIX};

/// depsift configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DepsiftConfig {
    /// Project root, relative to the workspace root
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Output directory, relative to the workspace root
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,

    /// Framework build command: program followed by its arguments
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_command: Option<Vec<String>>,

    /// Keep devDependencies in the written package.json
    #[serde(default)]
    pub include_dev_dependencies: bool,

    /// Copy the workspace lockfile into the output
    #[serde(default)]
    pub generate_lockfile: bool,

    /// Framework config file to carry over
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub framework_config: Option<String>,

    /// Value for scripts.start
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_script: Option<String>,

    /// Package path matchers: `react` matches `react` and `react/...`
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Regular expression external matchers
    #[serde(default)]
    pub exclude_pattern: Vec<String>,
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_output_path() -> PathBuf {
    PathBuf::from("dist")
}

impl Default for DepsiftConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            output_path: default_output_path(),
            build_command: None,
            include_dev_dependencies: false,
            generate_lockfile: false,
            framework_config: None,
            start_script: None,
            exclude: Vec::new(),
            exclude_pattern: Vec::new(),
        }
    }
}

impl DepsiftConfig {
    /// Validate the configuration for logical consistency.
    pub fn validate(&self) -> Result<()> {
        if let Some(command) = &self.build_command {
            FrameworkCommand::from_parts(command).map_err(|_| ConfigError::InvalidValue {
                field: "buildCommand".to_string(),
                value: format!("{command:?}"),
                hint: "Give the program first, e.g. [\"next\", \"build\"]".to_string(),
            })?;
        }

        for pattern in &self.exclude_pattern {
            ExternalMatcher::pattern(pattern).map_err(|e| ConfigError::InvalidValue {
                field: "excludePattern".to_string(),
                value: pattern.clone(),
                hint: e.to_string(),
            })?;
        }

        if self.exclude.iter().any(String::is_empty) {
            return Err(ConfigError::InvalidValue {
                field: "exclude".to_string(),
                value: "\"\"".to_string(),
                hint: "An empty prefix would mark every module external".to_string(),
            }
            .into());
        }

        Ok(())
    }

    /// External test built from `exclude` then `excludePattern`.
    pub fn external_test(&self) -> Result<ExternalTest> {
        let mut matchers: Vec<ExternalMatcher> =
            self.exclude.iter().map(ExternalMatcher::prefix).collect();
        for pattern in &self.exclude_pattern {
            matchers.push(ExternalMatcher::pattern(pattern)?);
        }
        Ok(ExternalTest::new(matchers))
    }

    /// Deploy options for a project in `workspace_root`.
    pub fn deploy_options(&self, workspace_root: &Path, project_name: &str) -> Result<DeployOptions> {
        let mut options = DeployOptions::new(workspace_root, project_name)
            .root(&self.root)
            .output_path(&self.output_path)
            .include_dev_dependencies(self.include_dev_dependencies)
            .generate_lockfile(self.generate_lockfile);

        if let Some(command) = &self.build_command {
            options = options.build_command(FrameworkCommand::from_parts(command)?);
        }
        if let Some(file_name) = &self.framework_config {
            options = options.framework_config(file_name);
        }
        if let Some(start) = &self.start_script {
            options = options.start_script(start);
        }
        Ok(options)
    }
}

/// Name for a project without a package.json: its root directory name.
pub fn default_project_name(workspace_root: &Path, root: &Path) -> String {
    use path_clean::PathClean;
    let project_root = workspace_root.join(root).clean();
    project_root
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("app")
        .to_string()
}
