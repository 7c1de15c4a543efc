use crate::config::DepsiftConfig;
use crate::error::{ConfigError, Result};
use figment::{
    Figment,
    providers::{Env, Format as _, Json, Serialized},
};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Config file looked up in the workspace root.
pub const CONFIG_FILE_NAME: &str = "depsift.config.json";

/// Prefix for environment overrides (`DEPSIFT_OUTPUT_PATH`, ...).
pub const ENV_PREFIX: &str = "DEPSIFT_";

/// Values given on the command line. Unset fields leave lower layers alone.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build_command: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_dev_dependencies: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generate_lockfile: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub framework_config: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_script: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude_pattern: Option<Vec<String>>,
}

impl ConfigOverrides {
    pub fn from_build_args(args: &crate::cli::BuildArgs) -> Self {
        Self {
            root: args.root.clone(),
            output_path: args.output_path.clone(),
            build_command: (!args.command.is_empty()).then(|| args.command.clone()),
            include_dev_dependencies: args.include_dev_dependencies.then_some(true),
            generate_lockfile: args.generate_lockfile.then_some(true),
            framework_config: args.framework_config.clone(),
            start_script: args.start_script.clone(),
            ..Default::default()
        }
    }

    pub fn from_manifest_args(args: &crate::cli::ManifestArgs) -> Self {
        Self {
            root: args.root.clone(),
            exclude: (!args.exclude.is_empty()).then(|| args.exclude.clone()),
            exclude_pattern: (!args.exclude_pattern.is_empty())
                .then(|| args.exclude_pattern.clone()),
            ..Default::default()
        }
    }
}

impl DepsiftConfig {
    /// Load configuration from multiple sources.
    ///
    /// `config_path` must exist when given; otherwise `depsift.config.json`
    /// in `workspace_root` is used if present.
    pub fn load(
        workspace_root: &Path,
        config_path: Option<&Path>,
        overrides: &ConfigOverrides,
    ) -> Result<Self> {
        let mut figment = Figment::new().merge(Serialized::defaults(Self::default()));

        let config_file = match config_path {
            Some(path) => {
                if !path.is_file() {
                    return Err(ConfigError::NotFound(path.to_path_buf()).into());
                }
                Some(path.to_path_buf())
            }
            None => {
                let default_path = workspace_root.join(CONFIG_FILE_NAME);
                default_path.is_file().then_some(default_path)
            }
        };

        if let Some(path) = config_file {
            figment = figment.merge(Json::file(path));
        }

        // DEPSIFT_OUTPUT_PATH -> outputPath
        figment = figment.merge(
            Env::prefixed(ENV_PREFIX)
                .lowercase(false)
                .map(|key| env_key_to_field(key.as_str()).into()),
        );

        figment = figment.merge(Serialized::defaults(overrides));

        let config: Self = figment.extract().map_err(|e| ConfigError::InvalidValue {
            field: "configuration".to_string(),
            value: e.to_string(),
            hint: format!("Check {CONFIG_FILE_NAME} syntax and field types"),
        })?;
        config.validate()?;
        Ok(config)
    }
}

/// `OUTPUT_PATH` -> `outputPath`.
fn env_key_to_field(key: &str) -> String {
    let mut field = String::with_capacity(key.len());
    for (i, part) in key.split('_').filter(|p| !p.is_empty()).enumerate() {
        let lower = part.to_ascii_lowercase();
        if i == 0 {
            field.push_str(&lower);
        } else {
            let mut chars = lower.chars();
            if let Some(first) = chars.next() {
                field.push(first.to_ascii_uppercase());
                field.push_str(chars.as_str());
            }
        }
    }
    field
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_env_key_to_field() {
        assert_eq!(env_key_to_field("ROOT"), "root");
        assert_eq!(env_key_to_field("OUTPUT_PATH"), "outputPath");
        assert_eq!(env_key_to_field("INCLUDE_DEV_DEPENDENCIES"), "includeDevDependencies");
    }

    #[test]
    #[serial]
    fn test_defaults_without_file() {
        let temp = TempDir::new().unwrap();
        let config =
            DepsiftConfig::load(temp.path(), None, &ConfigOverrides::default()).unwrap();
        assert_eq!(config, DepsiftConfig::default());
    }

    #[test]
    #[serial]
    fn test_file_then_cli() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join(CONFIG_FILE_NAME),
            r#"{ "root": "apps/web", "outputPath": "file-dist", "generateLockfile": true }"#,
        )
        .unwrap();

        let overrides = ConfigOverrides {
            output_path: Some(PathBuf::from("cli-dist")),
            ..Default::default()
        };
        let config = DepsiftConfig::load(temp.path(), None, &overrides).unwrap();

        assert_eq!(config.root, PathBuf::from("apps/web"));
        assert_eq!(config.output_path, PathBuf::from("cli-dist"));
        assert!(config.generate_lockfile);
    }

    #[test]
    #[serial]
    fn test_env_between_file_and_cli() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join(CONFIG_FILE_NAME),
            r#"{ "outputPath": "file-dist", "startScript": "node server.js" }"#,
        )
        .unwrap();

        unsafe {
            std::env::set_var("DEPSIFT_OUTPUT_PATH", "env-dist");
            std::env::set_var("DEPSIFT_START_SCRIPT", "next start");
        }
        let overrides = ConfigOverrides {
            start_script: Some("cli start".to_string()),
            ..Default::default()
        };
        let result = DepsiftConfig::load(temp.path(), None, &overrides);
        unsafe {
            std::env::remove_var("DEPSIFT_OUTPUT_PATH");
            std::env::remove_var("DEPSIFT_START_SCRIPT");
        }

        let config = result.unwrap();
        assert_eq!(config.output_path, PathBuf::from("env-dist"));
        assert_eq!(config.start_script.as_deref(), Some("cli start"));
    }

    #[test]
    #[serial]
    fn test_explicit_config_must_exist() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("nope.json");
        let err = DepsiftConfig::load(temp.path(), Some(&missing), &ConfigOverrides::default())
            .unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }

    #[test]
    #[serial]
    fn test_unknown_field_in_file() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(CONFIG_FILE_NAME), r#"{ "outDir": "dist" }"#).unwrap();
        let err = DepsiftConfig::load(temp.path(), None, &ConfigOverrides::default())
            .unwrap_err();
        assert!(err.to_string().contains("configuration"));
    }

    #[test]
    #[serial]
    fn test_invalid_pattern_from_cli() {
        let temp = TempDir::new().unwrap();
        let overrides = ConfigOverrides {
            exclude_pattern: Some(vec!["[".to_string()]),
            ..Default::default()
        };
        let err = DepsiftConfig::load(temp.path(), None, &overrides).unwrap_err();
        assert!(err.to_string().contains("excludePattern"));
    }
}
