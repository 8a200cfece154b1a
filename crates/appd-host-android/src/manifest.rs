//! Update manifest
//!
//! A JSON document mapping package ids to the version available for
//! installation and the APK that provides it:
//!
//! ```json
//! {
//!   "apps": {
//!     "com.mixplorer": { "version": "6.58.4", "apk": "mixplorer.apk" }
//!   }
//! }
//! ```
//!
//! Relative APK paths are resolved against the manifest's directory.

use appd_host_api::{HostError, HostResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub version: String,
    pub apk: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateManifest {
    #[serde(default)]
    pub apps: HashMap<String, ManifestEntry>,
}

impl UpdateManifest {
    /// Load a manifest, resolving relative APK paths
    pub fn load(path: impl AsRef<Path>) -> HostResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let mut manifest = Self::parse(&content)?;

        if let Some(base) = path.parent() {
            for entry in manifest.apps.values_mut() {
                if entry.apk.is_relative() {
                    entry.apk = base.join(&entry.apk);
                }
            }
        }

        Ok(manifest)
    }

    pub fn parse(content: &str) -> HostResult<Self> {
        serde_json::from_str(content)
            .map_err(|e| HostError::Internal(format!("Invalid update manifest: {}", e)))
    }

    pub fn get(&self, package: &str) -> Option<&ManifestEntry> {
        self.apps.get(package)
    }
}
