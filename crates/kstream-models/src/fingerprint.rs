//! Content fingerprints for upload de-duplication.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Content hash plus size, used to detect duplicate uploads.
///
/// A fingerprint is only ever a lookup key. It is never the primary
/// identifier of a content record, and two files with the same fingerprint
/// are treated as identical for upload purposes (collision risk accepted).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct Fingerprint {
    /// Hex-encoded SHA-256 digest (full content for small files, sampled
    /// windows for large ones).
    pub sha256: String,
    /// File size in bytes.
    pub size: u64,
}

impl Fingerprint {
    pub fn new(sha256: impl Into<String>, size: u64) -> Self {
        Self {
            sha256: sha256.into(),
            size,
        }
    }

    /// True when both digest and size match.
    pub fn matches(&self, other: &Fingerprint) -> bool {
        self.sha256 == other.sha256 && self.size == other.size
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.sha256, self.size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_requires_both_fields() {
        let a = Fingerprint::new("abc", 10);
        assert!(a.matches(&Fingerprint::new("abc", 10)));
        assert!(!a.matches(&Fingerprint::new("abc", 11)));
        assert!(!a.matches(&Fingerprint::new("abd", 10)));
    }

    #[test]
    fn test_serde_shape() {
        let fp = Fingerprint::new("deadbeef", 10_485_760);
        let json = serde_json::to_value(&fp).unwrap();
        assert_eq!(json["sha256"], "deadbeef");
        assert_eq!(json["size"], 10_485_760);
    }
}
