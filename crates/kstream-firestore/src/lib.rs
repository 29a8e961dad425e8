//! Firestore REST API client and document store.
//!
//! This crate provides:
//! - A Firestore REST client with token caching, retry and metrics
//! - Storage traits for content, audit and admin data
//! - Firestore-backed and in-memory implementations of those traits

pub mod client;
pub mod error;
pub mod firestore_store;
pub mod memory;
pub mod metrics;
pub mod retry;
pub mod store;
pub mod token_cache;
pub mod types;

pub use client::{FirestoreClient, FirestoreConfig};
pub use error::{FirestoreError, FirestoreResult};
pub use firestore_store::{FirestoreAdminStore, FirestoreAuditLogStore, FirestoreContentStore};
pub use memory::MemoryStore;
pub use retry::RetryConfig;
pub use store::{collections, AdminStore, AuditLogStore, ContentStore, GLOBAL_SETTINGS_DOC};
pub use types::{Document, StructuredQuery, ToFirestoreValue, Value};
