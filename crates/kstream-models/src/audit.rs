//! Audit log entries recorded on every content mutation.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::content::ActorRef;

/// What happened to a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
    Login,
    Logout,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Create => "create",
            AuditAction::Update => "update",
            AuditAction::Delete => "delete",
            AuditAction::Login => "login",
            AuditAction::Logout => "logout",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One audit trail entry. Written best-effort: a failed audit write never
/// fails the mutation it describes.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AuditLogEntry {
    #[serde(default)]
    pub id: String,
    pub action: AuditAction,
    /// Collection the mutation touched, e.g. "movies" or "series".
    pub target: String,
    /// Document id of the mutated record.
    #[serde(rename = "targetId")]
    pub target_id: String,
    #[serde(default)]
    pub summary: Option<String>,
    pub actor: ActorRef,
    #[serde(rename = "createdAt", default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl AuditLogEntry {
    pub fn new(
        action: AuditAction,
        target: impl Into<String>,
        target_id: impl Into<String>,
        actor: ActorRef,
    ) -> Self {
        Self {
            id: String::new(),
            action,
            target: target.into(),
            target_id: target_id.into(),
            summary: None,
            actor,
            created_at: Utc::now(),
        }
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_serde_shape() {
        let entry = AuditLogEntry::new(
            AuditAction::Update,
            "movies",
            "m123",
            ActorRef {
                uid: "u1".into(),
                email: Some("admin@example.com".into()),
                display_name: None,
            },
        )
        .with_summary("changed title");

        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["action"], "update");
        assert_eq!(json["target"], "movies");
        assert_eq!(json["targetId"], "m123");
        assert_eq!(json["summary"], "changed title");
        assert_eq!(json["actor"]["uid"], "u1");
    }
}
