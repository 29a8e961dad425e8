//! Admin users, roles, platform users and notifications.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Role attached to an admin session.
///
/// Ordering matters: a role gate for `Editor` admits all three roles, a gate
/// for `SuperAdmin` admits only super-admins.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "kebab-case")]
pub enum AdminRole {
    Editor,
    Admin,
    SuperAdmin,
}

impl AdminRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdminRole::Editor => "editor",
            AdminRole::Admin => "admin",
            AdminRole::SuperAdmin => "super-admin",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "editor" => Some(AdminRole::Editor),
            "admin" => Some(AdminRole::Admin),
            "super-admin" => Some(AdminRole::SuperAdmin),
            _ => None,
        }
    }

    /// True when this role satisfies a route gated at `required`.
    pub fn satisfies(&self, required: AdminRole) -> bool {
        *self >= required
    }
}

impl fmt::Display for AdminRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An authenticated admin identity.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AdminUser {
    pub uid: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(rename = "displayName", default)]
    pub display_name: Option<String>,
    pub role: AdminRole,
}

/// Subscription plan of a platform (viewer) user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum UserPlan {
    Free,
    Basic,
    Premium,
}

impl UserPlan {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserPlan::Free => "free",
            UserPlan::Basic => "basic",
            UserPlan::Premium => "premium",
        }
    }
}

impl Default for UserPlan {
    fn default() -> Self {
        UserPlan::Free
    }
}

/// A platform (viewer) account as stored in the users collection.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PlatformUser {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(rename = "displayName", default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub plan: UserPlan,
    #[serde(default)]
    pub disabled: bool,
    #[serde(rename = "createdAt", default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

/// In-app notification pushed to the admin dashboard.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Notification {
    #[serde(default)]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub read: bool,
    #[serde(rename = "createdAt", default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_ordering() {
        assert!(AdminRole::SuperAdmin.satisfies(AdminRole::Editor));
        assert!(AdminRole::SuperAdmin.satisfies(AdminRole::Admin));
        assert!(AdminRole::Admin.satisfies(AdminRole::Editor));
        assert!(!AdminRole::Editor.satisfies(AdminRole::Admin));
        assert!(!AdminRole::Admin.satisfies(AdminRole::SuperAdmin));
    }

    #[test]
    fn test_role_round_trip() {
        for role in [AdminRole::Editor, AdminRole::Admin, AdminRole::SuperAdmin] {
            assert_eq!(AdminRole::parse(role.as_str()), Some(role));
        }
        assert_eq!(AdminRole::parse("viewer"), None);
    }

    #[test]
    fn test_role_serde_kebab_case() {
        let json = serde_json::to_string(&AdminRole::SuperAdmin).unwrap();
        assert_eq!(json, "\"super-admin\"");
    }
}
