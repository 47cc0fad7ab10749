//! Discovered resource model
//!
//! A `ResourceRef` identifies one tagged resource found by discovery. Identity
//! is the id; the tags are captured as discovered and never mutated afterwards.

use crate::tags::TAG_NAME;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single key/value tag on a resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Tag {
    pub key: String,
    pub value: String,
}

impl Tag {
    /// Create a tag from any string-ish pair
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Kind of resource a lifecycle runs against
///
/// Instance snapshots are point-in-time and complete from the caller's
/// perspective once the automation execution finishes; file-system backups
/// are created asynchronously by the store and need an in-progress gate
/// before cleanup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    /// Compute instance, backed up via an automation document
    Instance,
    /// File system, backed up via the backup store
    FileSystem,
}

impl ResourceKind {
    /// Get a display string for the kind
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Instance => "instance",
            Self::FileSystem => "file-system",
        }
    }

    /// Whether retention cleanup must wait until no backup is being created
    pub fn requires_backup_gate(self) -> bool {
        matches!(self, Self::FileSystem)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Reference to a discovered resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResourceRef {
    /// Provider resource identifier (e.g. instance id, file system id)
    #[serde(rename = "ResourceId")]
    pub id: String,
    /// Resource kind
    pub kind: ResourceKind,
    /// Tags as captured at discovery time
    pub tags: Vec<Tag>,
}

impl ResourceRef {
    /// Create a resource reference
    pub fn new(id: impl Into<String>, kind: ResourceKind, tags: Vec<Tag>) -> Self {
        Self {
            id: id.into(),
            kind,
            tags,
        }
    }

    /// Look up a tag value by key
    pub fn tag_value(&self, key: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|t| t.key == key)
            .map(|t| t.value.as_str())
    }

    /// Human-readable label: the `Name` tag value if present, else the id
    pub fn display_name(&self) -> &str {
        self.tag_value(TAG_NAME).unwrap_or(&self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tagged_resource() -> ResourceRef {
        ResourceRef::new(
            "i-0abc123",
            ResourceKind::Instance,
            vec![
                Tag::new("Name", "db-primary"),
                Tag::new("Environment", "prod"),
            ],
        )
    }

    #[test]
    fn test_display_name_prefers_name_tag() {
        let resource = tagged_resource();
        assert_eq!(resource.display_name(), "db-primary");
    }

    #[test]
    fn test_display_name_falls_back_to_id() {
        let resource = ResourceRef::new("fs-0def456", ResourceKind::FileSystem, vec![]);
        assert_eq!(resource.display_name(), "fs-0def456");
    }

    #[test]
    fn test_tag_value_lookup() {
        let resource = tagged_resource();
        assert_eq!(resource.tag_value("Environment"), Some("prod"));
        assert_eq!(resource.tag_value("Missing"), None);
    }

    #[test]
    fn test_backup_gate_by_kind() {
        assert!(!ResourceKind::Instance.requires_backup_gate());
        assert!(ResourceKind::FileSystem.requires_backup_gate());
    }

    #[test]
    fn test_serde_field_names() {
        let resource = tagged_resource();
        let json = serde_json::to_value(&resource).unwrap();
        assert_eq!(json["ResourceId"], "i-0abc123");
        assert_eq!(json["Kind"], "Instance");
        assert_eq!(json["Tags"][0]["Key"], "Name");
        assert_eq!(json["Tags"][0]["Value"], "db-primary");
    }
}
