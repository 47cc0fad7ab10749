//! Tag schema for snapkeeper-created artifacts
//!
//! Every backup this tool creates carries provenance tags so that cleanup can
//! be scoped to self-created records and never touches anything else.
//!
//! ## Tag Schema
//!
//! | Tag Key | Description |
//! |---------|-------------|
//! | `CreatedBy` | Static creator marker (`snapkeeper`) |
//! | `BackupRequestId` | Idempotency token of the creating request |
//! | `FileSystemID` | Parent file system of a backup |

use crate::resource::Tag;

/// Tag key marking who created a record
pub const TAG_CREATED_BY: &str = "CreatedBy";

/// Tag value identifying snapkeeper as the creator
pub const TAG_CREATED_BY_VALUE: &str = "snapkeeper";

/// Tag key carrying the idempotency token of the creating request
pub const TAG_BACKUP_REQUEST_ID: &str = "BackupRequestId";

/// Tag key linking a backup to its parent file system
pub const TAG_FILE_SYSTEM_ID: &str = "FileSystemID";

/// Tag key naming a resource
pub const TAG_NAME: &str = "Name";

/// Tag key instance snapshots are indexed under
pub const TAG_INSTANCE_ID: &str = "Ec2InstanceId";

/// Reserved provider namespace; the store rejects writes to these keys
pub const RESERVED_TAG_PREFIX: &str = "aws:";

/// Check whether a tag list contains an exact key/value pair
pub fn has_tag(tags: &[Tag], key: &str, value: &str) -> bool {
    tags.iter().any(|t| t.key == key && t.value == value)
}

/// Build the tag set for a new file-system backup.
///
/// Carries the resource's existing tags over, minus any keys in the reserved
/// provider namespace, and appends the provenance tags.
pub fn backup_tags(existing: &[Tag], file_system_id: &str, request_id: &str) -> Vec<Tag> {
    let mut tags: Vec<Tag> = existing
        .iter()
        .filter(|t| !t.key.starts_with(RESERVED_TAG_PREFIX))
        .cloned()
        .collect();
    tags.push(Tag::new(TAG_CREATED_BY, TAG_CREATED_BY_VALUE));
    tags.push(Tag::new(TAG_BACKUP_REQUEST_ID, request_id));
    tags.push(Tag::new(TAG_FILE_SYSTEM_ID, file_system_id));
    tags
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backup_tags_strip_reserved_namespace() {
        let existing = vec![
            Tag::new("Name", "shared-fs"),
            Tag::new("aws:cloudformation:stack-name", "infra"),
            Tag::new("aws:backup:source-resource", "x"),
        ];
        let tags = backup_tags(&existing, "fs-001", "req-1");

        assert!(tags.iter().all(|t| !t.key.starts_with("aws:")));
        assert!(has_tag(&tags, "Name", "shared-fs"));
    }

    #[test]
    fn test_backup_tags_append_provenance() {
        let tags = backup_tags(&[], "fs-001", "req-1");

        assert!(has_tag(&tags, TAG_CREATED_BY, TAG_CREATED_BY_VALUE));
        assert!(has_tag(&tags, TAG_BACKUP_REQUEST_ID, "req-1"));
        assert!(has_tag(&tags, TAG_FILE_SYSTEM_ID, "fs-001"));
    }

    #[test]
    fn test_has_tag_requires_exact_pair() {
        let tags = vec![Tag::new("CreatedBy", "someone-else")];
        assert!(!has_tag(&tags, TAG_CREATED_BY, TAG_CREATED_BY_VALUE));
        assert!(has_tag(&tags, "CreatedBy", "someone-else"));
    }
}
