//! Command implementations.
//!
//! - [`build`] - framework build plus deployable output
//! - [`manifest`] - package.json from recorded module resolutions
//!
//! Each command exposes an `execute` function taking its parsed arguments.

pub mod build;
pub mod manifest;

pub use build::execute as build_execute;
pub use manifest::execute as manifest_execute;

use crate::error::Result;
use std::path::{Path, PathBuf};

/// Workspace root from `--workspace-root`, or the current directory.
pub(crate) fn resolve_workspace_root(explicit: Option<&Path>) -> Result<PathBuf> {
    let cwd = std::env::current_dir()?;
    Ok(match explicit {
        Some(path) if path.is_absolute() => path.to_path_buf(),
        Some(path) => cwd.join(path),
        None => cwd,
    })
}
