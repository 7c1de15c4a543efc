//! Canonical package names and build-root relative module paths.

use std::path::{Component, Path, PathBuf};

use path_clean::PathClean;

/// Extract the canonical package name from a module path.
///
/// The first path segment is the package name, unless it starts with the
/// scope marker `@`, in which case the first two segments form the name:
///
/// ```
/// # use depsift::extract_package_name;
/// assert_eq!(extract_package_name("lodash/debounce"), "lodash");
/// assert_eq!(extract_package_name("@scope/pkg/sub"), "@scope/pkg");
/// assert_eq!(extract_package_name("react"), "react");
/// ```
pub fn extract_package_name(path: &str) -> &str {
    if path.is_empty() {
        return path;
    }

    let first_slash = match path.find('/') {
        Some(idx) => idx,
        None => return path,
    };

    if !path.starts_with('@') {
        return &path[..first_slash];
    }

    match path[first_slash + 1..].find('/') {
        Some(second_slash) => &path[..first_slash + 1 + second_slash],
        None => path,
    }
}

/// Whether an extracted name can be an installed package. Relative
/// segments such as `.` and `..` come from local files, not packages.
pub fn is_plausible_package_name(name: &str) -> bool {
    !name.is_empty() && !name.starts_with('.')
}

/// Express a resolved module path relative to the build root.
///
/// - absolute paths are made relative to `root` (with `..` segments when they
///   live outside of it)
/// - anything after the last `node_modules/` segment is kept, so a resolved
///   file inside an installed package reads like its bare specifier
/// - bare and relative specifiers are returned unchanged
///
/// Separators are normalized to `/`.
pub fn relative_module_path(resolved: &str, root: &Path) -> String {
    let path = Path::new(resolved);
    let relative = if path.is_absolute() {
        to_slash(&relative_to(&path.to_path_buf().clean(), &root.to_path_buf().clean()))
    } else {
        resolved.replace('\\', "/")
    };

    match relative.rfind("node_modules/") {
        Some(idx) => relative[idx + "node_modules/".len()..].to_string(),
        None => relative,
    }
}

fn relative_to(path: &Path, base: &Path) -> PathBuf {
    let path_components: Vec<Component<'_>> = path.components().collect();
    let base_components: Vec<Component<'_>> = base.components().collect();

    let common = path_components
        .iter()
        .zip(base_components.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut relative = PathBuf::new();
    for _ in common..base_components.len() {
        relative.push("..");
    }
    for component in &path_components[common..] {
        relative.push(component.as_os_str());
    }
    relative
}

fn to_slash(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
