//! Strongly-typed identifiers for appd

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identity of a supervised application: package id plus entry point
///
/// The entry point is the activity (or service) component started by
/// `am start`/`am startservice`. Equality and hashing cover both parts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AppId {
    package: String,
    entry_point: String,
}

impl AppId {
    pub fn new(package: impl Into<String>, entry_point: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            entry_point: entry_point.into(),
        }
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    pub fn entry_point(&self) -> &str {
        &self.entry_point
    }

    /// `<package>/<entry point>` as accepted by the activity manager
    pub fn component(&self) -> String {
        format!("{}/{}", self.package, self.entry_point)
    }
}

impl fmt::Display for AppId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.package)
    }
}

/// Unique identifier for a connected telemetry publisher
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PublisherId(Uuid);

impl PublisherId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for PublisherId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PublisherId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_id_equality() {
        let id1 = AppId::new("com.mixplorer", "com.mixplorer.activities.BrowseActivity");
        let id2 = AppId::new("com.mixplorer", "com.mixplorer.activities.BrowseActivity");
        let id3 = AppId::new("com.quickedit", "com.quickedit.activities.BrowseActivity");

        assert_eq!(id1, id2);
        assert_ne!(id1, id3);
    }

    #[test]
    fn app_id_component() {
        let id = AppId::new("com.example.nav", ".MainActivity");
        assert_eq!(id.component(), "com.example.nav/.MainActivity");
        assert_eq!(id.to_string(), "com.example.nav");
    }

    #[test]
    fn publisher_id_uniqueness() {
        assert_ne!(PublisherId::new(), PublisherId::new());
    }

    #[test]
    fn ids_serialize_deserialize() {
        let app_id = AppId::new("com.example.nav", ".MainActivity");
        let json = serde_json::to_string(&app_id).unwrap();
        let parsed: AppId = serde_json::from_str(&json).unwrap();
        assert_eq!(app_id, parsed);
    }
}
