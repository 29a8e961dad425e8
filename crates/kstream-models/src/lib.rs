//! Shared data models for the KStream admin backend.
//!
//! This crate provides Serde-serializable types for:
//! - Content records (movies, series, episodes) and subtitle tracks
//! - Upload fingerprints for de-duplication
//! - Admin users, roles, notifications and platform settings
//! - Audit log entries
//! - Payload validation with field-level error reporting

pub mod admin;
pub mod audit;
pub mod content;
pub mod fingerprint;
pub mod validate;

// Re-export common types
pub use admin::{AdminRole, AdminUser, Notification, PlatformUser, UserPlan};
pub use audit::{AuditAction, AuditLogEntry};
pub use content::{
    ensure_https, sanitize_tags, ActorRef, ContentKind, Episode, Movie, Series, SubtitleTrack,
    CONTENT_CATEGORIES,
};
pub use fingerprint::Fingerprint;
pub use validate::{
    validate_episode, validate_movie, validate_series, validate_subtitles, ValidationOutcome,
};
