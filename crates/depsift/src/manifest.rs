//! package.json manifests.
//!
//! [`PackageManifest`] models the dependency-related fields explicitly and
//! carries every other field through untouched, so a manifest read from disk
//! and written back keeps its metadata.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

use crate::{Error, Result};

/// File name of an emitted manifest.
pub const MANIFEST_FILE_NAME: &str = "package.json";

/// Maximum allowed size for package.json files (10MB)
const MAX_PACKAGE_JSON_SIZE: u64 = 10 * 1024 * 1024;

/// Dependency map: package name to version specifier, in declaration order.
pub type DependencyMap = IndexMap<String, String>;

/// A package.json document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PackageManifest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Production dependencies
    #[serde(default)]
    pub dependencies: DependencyMap,
    #[serde(
        default,
        rename = "devDependencies",
        skip_serializing_if = "IndexMap::is_empty"
    )]
    pub dev_dependencies: DependencyMap,
    #[serde(
        default,
        rename = "peerDependencies",
        skip_serializing_if = "IndexMap::is_empty"
    )]
    pub peer_dependencies: DependencyMap,
    #[serde(
        default,
        rename = "optionalDependencies",
        skip_serializing_if = "IndexMap::is_empty"
    )]
    pub optional_dependencies: DependencyMap,
    /// Every other field, preserved verbatim.
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

impl PackageManifest {
    /// Create an empty manifest with a name and version.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            version: Some(version.into()),
            ..Default::default()
        }
    }

    /// Parse a manifest from JSON text. `path` is only used for error context.
    pub fn from_json(content: &str, path: &Path) -> Result<Self> {
        serde_json::from_str(content).map_err(|source| Error::InvalidManifest {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Read a manifest from disk, rejecting files over 10MB.
    pub async fn read(path: &Path) -> Result<Self> {
        let metadata = tokio::fs::metadata(path).await.map_err(|e| {
            Error::io(format!("Cannot read metadata of {}", path.display()), e)
        })?;

        if metadata.len() > MAX_PACKAGE_JSON_SIZE {
            return Err(Error::ManifestTooLarge {
                path: path.to_path_buf(),
                size: metadata.len(),
                max_size: MAX_PACKAGE_JSON_SIZE,
            });
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| Error::io(format!("Failed to read {}", path.display()), e))?;

        Self::from_json(&content, path)
    }

    /// Read a manifest if the file exists.
    pub async fn read_optional(path: &Path) -> Result<Option<Self>> {
        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            return Ok(None);
        }
        Self::read(path).await.map(Some)
    }

    /// Serialize as pretty-printed JSON with a trailing newline.
    pub fn to_json_pretty(&self) -> Result<String> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        Ok(json)
    }

    /// Set `scripts.<name>`, creating the `scripts` object when needed.
    pub fn set_script(&mut self, name: &str, command: impl Into<String>) {
        let scripts = self
            .metadata
            .entry("scripts")
            .or_insert_with(|| Value::Object(Map::new()));

        if !scripts.is_object() {
            *scripts = Value::Object(Map::new());
        }
        if let Value::Object(scripts) = scripts {
            scripts.insert(name.to_string(), Value::String(command.into()));
        }
    }

    /// Look up a version for `name` among production-eligible maps.
    pub fn production_version(&self, name: &str) -> Option<&String> {
        self.dependencies
            .get(name)
            .or_else(|| self.optional_dependencies.get(name))
    }
}
