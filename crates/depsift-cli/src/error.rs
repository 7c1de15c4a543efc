//! Error handling for the depsift CLI.
//!
//! `CliError` is what commands return. Configuration problems get their own
//! `ConfigError` with a hint attached, and library failures are carried as
//! `depsift::Error` so their diagnostic codes survive to the report.
//!
//! # Example
//!
//! ```rust,no_run
//! use depsift_cli::error::{Result, ResultExt};
//! use std::path::Path;
//!
//! fn read_modules(path: &Path) -> Result<String> {
//!     std::fs::read_to_string(path)
//!         .with_path(path)
//!         .with_hint("Pass the file written by your bundler's resolve log")
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Top-level CLI error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Errors from the depsift library
    #[error(transparent)]
    Depsift(#[from] depsift::Error),

    /// Invalid command-line arguments or options
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// File or directory not found
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// I/O errors from file system operations
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with custom messages
    #[error("{0}")]
    Custom(String),
}

/// Configuration-specific errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file passed with --config doesn't exist
    #[error("Config file not found: {}\n\nHint: Create a depsift.config.json file or fix the --config path", .0.display())]
    NotFound(PathBuf),

    /// A field has an invalid value
    #[error("Invalid value for '{field}': {value}\n\nHint: {hint}")]
    InvalidValue {
        /// Name of the field with invalid value
        field: String,
        /// The invalid value
        value: String,
        /// Helpful hint for correct values
        hint: String,
    },

    /// A module event line could not be parsed
    #[error("Invalid module event on line {line}: {content}\n\nHint: Use one resolved path per line, optionally followed by a tab and the importer")]
    InvalidModuleEvent {
        /// 1-based line number
        line: usize,
        /// The offending line
        content: String,
    },
}

/// Result type alias using `CliError` as the default error type.
pub type Result<T, E = CliError> = std::result::Result<T, E>;

/// Extension trait for adding context to `Result` types.
pub trait ResultExt<T> {
    /// Turn a not-found I/O error into `CliError::FileNotFound` for `path`.
    fn with_path(self, path: impl AsRef<std::path::Path>) -> Result<T>;

    /// Append a hint to the error message.
    fn with_hint(self, hint: impl std::fmt::Display) -> Result<T>;

    /// Prefix the error message.
    fn context(self, msg: impl std::fmt::Display) -> Result<T>;
}

impl<T, E: Into<CliError>> ResultExt<T> for std::result::Result<T, E> {
    fn with_path(self, path: impl AsRef<std::path::Path>) -> Result<T> {
        self.map_err(|e| {
            let err: CliError = e.into();
            match err {
                CliError::Io(io_err) if io_err.kind() == std::io::ErrorKind::NotFound => {
                    CliError::FileNotFound(path.as_ref().to_path_buf())
                }
                other => other,
            }
        })
    }

    fn with_hint(self, hint: impl std::fmt::Display) -> Result<T> {
        self.map_err(|e| {
            let err: CliError = e.into();
            CliError::Custom(format!("{}\n\nHint: {}", err, hint))
        })
    }

    fn context(self, msg: impl std::fmt::Display) -> Result<T> {
        self.map_err(|e| {
            let err: CliError = e.into();
            CliError::Custom(format!("{}: {}", msg, err))
        })
    }
}

/// Convert a `CliError` into a miette report for display.
pub fn cli_error_to_miette(err: CliError) -> miette::Report {
    match err {
        // Keep the library's diagnostic code and help text
        CliError::Depsift(e) => miette::Report::new(e),
        CliError::Config(e) => miette::miette!("Configuration error: {}", e),
        other => miette::miette!("{}", other),
    }
}
