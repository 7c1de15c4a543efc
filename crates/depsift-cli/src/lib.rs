//! depsift CLI.
//!
//! Command-line front end for the `depsift` library:
//!
//! - [`cli`] - argument definitions
//! - [`commands`] - `build` and `manifest` implementations
//! - [`config`] - depsift.config.json, environment and CLI layering
//! - [`error`] - CLI error types and miette conversion
//! - [`logger`] - tracing subscriber setup
//! - [`ui`] - status messages

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logger;
pub mod ui;

pub use error::{CliError, ConfigError, Result, ResultExt};
