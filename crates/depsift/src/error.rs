//! Error types for depsift.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while observing a build or assembling its output.
///
/// The dependency omission case is deliberately absent: it is reported as a
/// [`DependencyWarning`](crate::DependencyWarning) and never fails a build.
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    /// A predicate matcher failed while classifying a resolved module.
    #[error("External matcher failed for '{path}': {message}")]
    #[diagnostic(
        code(depsift::matcher_failed),
        help("A failing matcher leaves the dependency set incomplete, so the build is aborted.")
    )]
    Matcher { path: String, message: String },

    /// A regular expression matcher did not compile.
    #[error("Invalid external pattern '{pattern}': {source}")]
    #[diagnostic(code(depsift::invalid_pattern))]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// The collaborator could not produce a candidate manifest.
    #[error("Failed to compute candidate manifest for '{project}': {message}")]
    #[diagnostic(code(depsift::candidate_manifest))]
    CandidateManifest { project: String, message: String },

    /// A package.json file could not be parsed.
    #[error("Invalid package.json at {}: {source}", .path.display())]
    #[diagnostic(
        code(depsift::invalid_manifest),
        help("Check the file for trailing commas or unquoted keys.")
    )]
    InvalidManifest {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A package.json file exceeds the size limit.
    #[error("package.json at {} is {size} bytes (max: {max_size} bytes)", .path.display())]
    #[diagnostic(code(depsift::manifest_too_large))]
    ManifestTooLarge {
        path: PathBuf,
        size: u64,
        max_size: u64,
    },

    /// The workspace root has no package.json.
    #[error("Workspace manifest not found: {}", .0.display())]
    #[diagnostic(
        code(depsift::workspace_manifest_not_found),
        help("Run depsift from the workspace root or pass --workspace-root.")
    )]
    WorkspaceManifestNotFound(PathBuf),

    /// `<root>/public` exists but is not a directory.
    #[error("Public path is not a directory: {}", .0.display())]
    #[diagnostic(
        code(depsift::invalid_public_directory),
        help("Static assets must live in a 'public' directory next to the framework config.")
    )]
    InvalidPublicDirectory(PathBuf),

    /// The deploy options are unusable.
    #[error("Invalid configuration: {0}")]
    #[diagnostic(code(depsift::invalid_config))]
    InvalidConfig(String),

    /// The framework build command could not be started.
    #[error("Failed to spawn framework build '{command}': {source}")]
    #[diagnostic(
        code(depsift::spawn_failed),
        help("Check that the build command is installed and on PATH.")
    )]
    SpawnFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The framework build command exited unsuccessfully.
    #[error("Framework build '{command}' exited with code {code}")]
    #[diagnostic(code(depsift::framework_build_failed))]
    FrameworkBuild { command: String, code: i32 },

    /// A lockfile was requested but the workspace has none.
    #[error("No lockfile found in {}", .0.display())]
    #[diagnostic(
        code(depsift::lockfile_not_found),
        help("Install dependencies first or disable generateLockfile.")
    )]
    LockfileNotFound(PathBuf),

    /// Serializing the final manifest failed.
    #[error("Failed to serialize package.json: {0}")]
    #[diagnostic(code(depsift::serialize))]
    Serialize(#[from] serde_json::Error),

    /// I/O error with context message.
    #[error("{message}")]
    #[diagnostic(code(depsift::io))]
    IoError {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for depsift operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Error::IoError {
            message: message.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matcher_error_message() {
        let err = Error::Matcher {
            path: "react/jsx-runtime".to_string(),
            message: "boom".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("react/jsx-runtime"));
        assert!(msg.contains("boom"));
    }

    #[test]
    fn test_diagnostic_codes() {
        let err = Error::LockfileNotFound(PathBuf::from("/ws"));
        let code = err.code().map(|c| c.to_string());
        assert_eq!(code.as_deref(), Some("depsift::lockfile_not_found"));
        assert!(err.help().is_some());
    }
}
