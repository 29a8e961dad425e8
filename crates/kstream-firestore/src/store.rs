//! Injected storage traits for content, audit and admin data.
//!
//! Handlers and the upload workflow only ever see these traits. Production
//! wires in the Firestore-backed implementations; tests and mock mode use the
//! in-memory store from [`crate::memory`].

use async_trait::async_trait;

use kstream_models::{
    AuditLogEntry, Episode, Fingerprint, Movie, Notification, PlatformUser, Series, UserPlan,
};

use crate::error::FirestoreResult;

/// Collection names used by the dashboard.
pub mod collections {
    pub const MOVIES: &str = "movies";
    pub const SERIES: &str = "series";
    pub const USERS: &str = "users";
    pub const AUDIT_LOGS: &str = "kstream-audit-logs";
    pub const SETTINGS: &str = "kstream-settings";
    pub const NOTIFICATIONS: &str = "kstream-notifications";
}

/// Document id of the single global settings document.
pub const GLOBAL_SETTINGS_DOC: &str = "global";

/// Storage for movies and series, including fingerprint lookups.
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn list_movies(&self) -> FirestoreResult<Vec<Movie>>;
    async fn get_movie(&self, id: &str) -> FirestoreResult<Option<Movie>>;
    /// Create a movie and return its document id.
    async fn create_movie(&self, movie: &Movie) -> FirestoreResult<String>;
    async fn update_movie(&self, id: &str, movie: &Movie) -> FirestoreResult<()>;
    async fn delete_movie(&self, id: &str) -> FirestoreResult<()>;

    async fn list_series(&self) -> FirestoreResult<Vec<Series>>;
    async fn get_series(&self, id: &str) -> FirestoreResult<Option<Series>>;
    /// Create a series and return its document id.
    async fn create_series(&self, series: &Series) -> FirestoreResult<String>;
    async fn update_series(&self, id: &str, series: &Series) -> FirestoreResult<()>;
    async fn delete_series(&self, id: &str) -> FirestoreResult<()>;

    /// Find a movie whose stored fingerprint matches, via an indexed query.
    async fn find_movie_by_fingerprint(
        &self,
        fingerprint: &Fingerprint,
    ) -> FirestoreResult<Option<Movie>>;

    /// Find an episode with a matching fingerprint by scanning every series.
    /// Episode fingerprints live inside an embedded array, which the document
    /// store cannot index, so this is a full-collection scan.
    async fn find_episode_by_fingerprint(
        &self,
        fingerprint: &Fingerprint,
    ) -> FirestoreResult<Option<(Series, Episode)>>;
}

/// Append-only audit trail.
#[async_trait]
pub trait AuditLogStore: Send + Sync {
    /// Record an entry, returning its assigned id.
    async fn record(&self, entry: &AuditLogEntry) -> FirestoreResult<String>;
    /// Most recent entries, newest first.
    async fn list_recent(&self, limit: usize) -> FirestoreResult<Vec<AuditLogEntry>>;
}

/// Platform settings, notifications and user accounts.
#[async_trait]
pub trait AdminStore: Send + Sync {
    /// The global settings document, `{}` when none exists yet.
    async fn get_settings(&self) -> FirestoreResult<serde_json::Value>;
    /// Merge the given keys into the global settings document.
    async fn update_settings(&self, patch: serde_json::Value) -> FirestoreResult<serde_json::Value>;

    async fn list_notifications(&self) -> FirestoreResult<Vec<Notification>>;
    async fn push_notification(&self, notification: &Notification) -> FirestoreResult<String>;
    async fn mark_notification_read(&self, id: &str) -> FirestoreResult<()>;

    async fn list_users(&self) -> FirestoreResult<Vec<PlatformUser>>;
    async fn get_user(&self, id: &str) -> FirestoreResult<Option<PlatformUser>>;
    async fn set_user_plan(&self, id: &str, plan: UserPlan) -> FirestoreResult<()>;
    async fn set_user_disabled(&self, id: &str, disabled: bool) -> FirestoreResult<()>;
}
