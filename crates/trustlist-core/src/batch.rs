//! Batch tag generation
//!
//! A batch tag correlates every entity and audit record produced by one
//! operation instance. Tags have the shape
//! `{yyyyMMddHHmmssSSS}-{OPERATION}-{32 hex chars}`: the fixed-width UTC
//! timestamp prefix makes them sort by creation time and the random suffix
//! makes them unique.

use chrono::{DateTime, Utc};

use crate::types::OperationType;

const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S%3f";

/// Generate a new batch tag for `operation`
pub fn batch_tag(operation: OperationType) -> String {
    batch_tag_at(operation, Utc::now())
}

/// Generate a batch tag with an explicit timestamp
pub fn batch_tag_at(operation: OperationType, at: DateTime<Utc>) -> String {
    format!(
        "{}-{}-{}",
        at.format(TIMESTAMP_FORMAT),
        operation.as_str(),
        uuid::Uuid::new_v4().simple()
    )
}

/// Operation encoded in a batch tag, if the tag is well-formed
pub fn operation_of(tag: &str) -> Option<OperationType> {
    tag.split('-').nth(1)?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::collections::HashSet;

    #[test]
    fn test_tag_shape() {
        let tag = batch_tag(OperationType::Download);
        let parts: Vec<&str> = tag.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0].len(), 17);
        assert_eq!(parts[1], "DOWNLOAD");
        assert_eq!(parts[2].len(), 32);
        assert_eq!(operation_of(&tag), Some(OperationType::Download));
    }

    #[test]
    fn test_tags_are_unique() {
        let tags: HashSet<String> = (0..1000).map(|_| batch_tag(OperationType::Upload)).collect();
        assert_eq!(tags.len(), 1000);
    }

    #[test]
    fn test_tags_sort_by_creation_time() {
        let now = Utc::now();
        let earlier = batch_tag_at(OperationType::Upload, now);
        let later = batch_tag_at(OperationType::Upload, now + Duration::milliseconds(1));
        assert!(earlier < later);

        let much_later = batch_tag_at(OperationType::Upload, now + Duration::days(400));
        assert!(later < much_later);
    }

    #[test]
    fn test_operation_of_unknown() {
        assert_eq!(operation_of("garbage"), None);
        assert_eq!(operation_of("20260101000000000-NOPE-abc"), None);
    }
}
