//! Static files carried into the deployable output.

use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

use crate::{Error, Result};

/// Lockfiles recognized in the workspace root, in lookup order.
pub const LOCKFILE_NAMES: &[&str] = &["package-lock.json", "yarn.lock", "pnpm-lock.yaml", "bun.lockb"];

/// Fail when `<root>/public` exists but is not a directory.
pub fn check_public_directory(project_root: &Path) -> Result<()> {
    let public = project_root.join("public");
    if public.exists() && !public.is_dir() {
        return Err(Error::InvalidPublicDirectory(public));
    }
    Ok(())
}

/// First lockfile present in `workspace_root`.
pub fn find_lockfile(workspace_root: &Path) -> Option<PathBuf> {
    LOCKFILE_NAMES
        .iter()
        .map(|name| workspace_root.join(name))
        .find(|path| path.is_file())
}

/// Copy the workspace lockfile into `output_dir` under its own name.
pub async fn copy_lockfile(workspace_root: &Path, output_dir: &Path) -> Result<PathBuf> {
    let source = find_lockfile(workspace_root)
        .ok_or_else(|| Error::LockfileNotFound(workspace_root.to_path_buf()))?;
    let file_name = source
        .file_name()
        .ok_or_else(|| Error::LockfileNotFound(workspace_root.to_path_buf()))?;
    let target = output_dir.join(file_name);

    tokio::fs::copy(&source, &target).await.map_err(|e| {
        Error::io(
            format!("Failed to copy {} to {}", source.display(), target.display()),
            e,
        )
    })?;
    Ok(target)
}

/// Copy the framework config file from the project root, if it exists.
pub async fn copy_framework_config(
    project_root: &Path,
    file_name: &str,
    output_dir: &Path,
) -> Result<Option<PathBuf>> {
    let source = project_root.join(file_name);
    if !source.is_file() {
        debug!(path = %source.display(), "no framework config to carry over");
        return Ok(None);
    }

    let target = output_dir.join(file_name);
    tokio::fs::copy(&source, &target).await.map_err(|e| {
        Error::io(
            format!("Failed to copy {} to {}", source.display(), target.display()),
            e,
        )
    })?;
    Ok(Some(target))
}

/// Recursively copy `from` into `to`, following symlinks.
///
/// Returns the number of files copied. A missing `from` copies nothing.
pub fn copy_dir_dereferenced(from: &Path, to: &Path) -> Result<usize> {
    if !from.is_dir() {
        return Ok(0);
    }

    let mut copied = 0;
    for entry in WalkDir::new(from).follow_links(true) {
        let entry = entry.map_err(|e| {
            let message = format!("Failed to walk {}", from.display());
            Error::io(message, e.into())
        })?;

        let relative = entry
            .path()
            .strip_prefix(from)
            .map_err(|_| Error::InvalidConfig(format!("{} escapes {}", entry.path().display(), from.display())))?;
        let target = to.join(relative);

        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target).map_err(|e| {
                Error::io(format!("Failed to create {}", target.display()), e)
            })?;
        } else {
            std::fs::copy(entry.path(), &target).map_err(|e| {
                Error::io(
                    format!("Failed to copy {} to {}", entry.path().display(), target.display()),
                    e,
                )
            })?;
            copied += 1;
        }
    }
    Ok(copied)
}
