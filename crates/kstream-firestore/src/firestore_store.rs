//! Firestore-backed implementations of the storage traits.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{info, warn};

use kstream_models::{
    AuditLogEntry, Episode, Fingerprint, Movie, Notification, PlatformUser, Series, UserPlan,
};

use crate::client::FirestoreClient;
use crate::error::{FirestoreError, FirestoreResult};
use crate::store::{collections, AdminStore, AuditLogStore, ContentStore, GLOBAL_SETTINGS_DOC};
use crate::types::{
    document_to_json, json_to_fields, Document, StructuredQuery, ToFirestoreValue, Value,
};

/// Decode a Firestore document into a typed record.
fn decode<T: DeserializeOwned>(doc: &Document) -> FirestoreResult<T> {
    serde_json::from_value(document_to_json(doc))
        .map_err(|e| FirestoreError::SerializationError(format!("decode failed: {}", e)))
}

/// Encode a typed record as Firestore fields. The `id` field is stripped,
/// the document id is carried by the resource name instead.
fn encode<T: Serialize>(record: &T) -> FirestoreResult<HashMap<String, Value>> {
    let mut json = serde_json::to_value(record)?;
    if let Some(obj) = json.as_object_mut() {
        obj.remove("id");
    }
    Ok(json_to_fields(&json))
}

/// Decode each document, skipping ones that no longer match the schema.
fn decode_all<T: DeserializeOwned>(collection: &str, docs: Vec<Document>) -> Vec<T> {
    docs.iter()
        .filter_map(|doc| match decode::<T>(doc) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(
                    collection,
                    doc_id = doc.doc_id().unwrap_or("?"),
                    "Skipping malformed document: {}",
                    e
                );
                None
            }
        })
        .collect()
}

// =============================================================================
// Content
// =============================================================================

/// Movies and series stored in Firestore.
#[derive(Clone)]
pub struct FirestoreContentStore {
    client: FirestoreClient,
}

impl FirestoreContentStore {
    pub fn new(client: FirestoreClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ContentStore for FirestoreContentStore {
    async fn list_movies(&self) -> FirestoreResult<Vec<Movie>> {
        let docs = self.client.list_all_documents(collections::MOVIES).await?;
        Ok(decode_all(collections::MOVIES, docs))
    }

    async fn get_movie(&self, id: &str) -> FirestoreResult<Option<Movie>> {
        match self.client.get_document(collections::MOVIES, id).await? {
            Some(doc) => Ok(Some(decode(&doc)?)),
            None => Ok(None),
        }
    }

    async fn create_movie(&self, movie: &Movie) -> FirestoreResult<String> {
        let fields = encode(movie)?;
        let doc = self
            .client
            .create_document(collections::MOVIES, None, fields)
            .await?;
        let id = doc
            .doc_id()
            .ok_or_else(|| FirestoreError::invalid_response("created movie has no resource name"))?
            .to_string();
        info!(movie_id = %id, title = %movie.title, "Created movie record");
        Ok(id)
    }

    async fn update_movie(&self, id: &str, movie: &Movie) -> FirestoreResult<()> {
        let fields = encode(movie)?;
        self.client
            .update_document(collections::MOVIES, id, fields, None)
            .await?;
        Ok(())
    }

    async fn delete_movie(&self, id: &str) -> FirestoreResult<()> {
        self.client.delete_document(collections::MOVIES, id).await
    }

    async fn list_series(&self) -> FirestoreResult<Vec<Series>> {
        let docs = self.client.list_all_documents(collections::SERIES).await?;
        Ok(decode_all(collections::SERIES, docs))
    }

    async fn get_series(&self, id: &str) -> FirestoreResult<Option<Series>> {
        match self.client.get_document(collections::SERIES, id).await? {
            Some(doc) => Ok(Some(decode(&doc)?)),
            None => Ok(None),
        }
    }

    async fn create_series(&self, series: &Series) -> FirestoreResult<String> {
        let fields = encode(series)?;
        let doc = self
            .client
            .create_document(collections::SERIES, None, fields)
            .await?;
        let id = doc
            .doc_id()
            .ok_or_else(|| FirestoreError::invalid_response("created series has no resource name"))?
            .to_string();
        info!(series_id = %id, title = %series.title, "Created series record");
        Ok(id)
    }

    async fn update_series(&self, id: &str, series: &Series) -> FirestoreResult<()> {
        let fields = encode(series)?;
        self.client
            .update_document(collections::SERIES, id, fields, None)
            .await?;
        Ok(())
    }

    async fn delete_series(&self, id: &str) -> FirestoreResult<()> {
        self.client.delete_document(collections::SERIES, id).await
    }

    async fn find_movie_by_fingerprint(
        &self,
        fingerprint: &Fingerprint,
    ) -> FirestoreResult<Option<Movie>> {
        let query = StructuredQuery::equals_all(
            collections::MOVIES,
            vec![
                (
                    "fileHash.sha256".to_string(),
                    fingerprint.sha256.to_firestore_value(),
                ),
                (
                    "fileHash.size".to_string(),
                    fingerprint.size.to_firestore_value(),
                ),
            ],
            1,
        );

        let docs = self.client.run_query(query).await?;
        match docs.first() {
            Some(doc) => Ok(Some(decode(doc)?)),
            None => Ok(None),
        }
    }

    async fn find_episode_by_fingerprint(
        &self,
        fingerprint: &Fingerprint,
    ) -> FirestoreResult<Option<(Series, Episode)>> {
        let all = self.list_series().await?;
        for series in all {
            let hit = series
                .episodes
                .iter()
                .find(|ep| {
                    ep.file_hash
                        .as_ref()
                        .is_some_and(|fh| fh.matches(fingerprint))
                })
                .cloned();
            if let Some(episode) = hit {
                return Ok(Some((series, episode)));
            }
        }
        Ok(None)
    }
}

// =============================================================================
// Audit log
// =============================================================================

/// Audit trail stored in Firestore.
#[derive(Clone)]
pub struct FirestoreAuditLogStore {
    client: FirestoreClient,
}

impl FirestoreAuditLogStore {
    pub fn new(client: FirestoreClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AuditLogStore for FirestoreAuditLogStore {
    async fn record(&self, entry: &AuditLogEntry) -> FirestoreResult<String> {
        let fields = encode(entry)?;
        let doc = self
            .client
            .create_document(collections::AUDIT_LOGS, None, fields)
            .await?;
        doc.doc_id()
            .map(str::to_string)
            .ok_or_else(|| FirestoreError::invalid_response("audit entry has no resource name"))
    }

    async fn list_recent(&self, limit: usize) -> FirestoreResult<Vec<AuditLogEntry>> {
        let docs = self.client.list_all_documents(collections::AUDIT_LOGS).await?;
        let mut entries: Vec<AuditLogEntry> = decode_all(collections::AUDIT_LOGS, docs);
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        entries.truncate(limit);
        Ok(entries)
    }
}

// =============================================================================
// Admin data
// =============================================================================

/// Settings, notifications and user accounts stored in Firestore.
#[derive(Clone)]
pub struct FirestoreAdminStore {
    client: FirestoreClient,
}

impl FirestoreAdminStore {
    pub fn new(client: FirestoreClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AdminStore for FirestoreAdminStore {
    async fn get_settings(&self) -> FirestoreResult<serde_json::Value> {
        match self
            .client
            .get_document(collections::SETTINGS, GLOBAL_SETTINGS_DOC)
            .await?
        {
            Some(doc) => {
                let mut json = document_to_json(&doc);
                if let Some(obj) = json.as_object_mut() {
                    obj.remove("id");
                }
                Ok(json)
            }
            None => Ok(serde_json::json!({})),
        }
    }

    async fn update_settings(&self, patch: serde_json::Value) -> FirestoreResult<serde_json::Value> {
        let mask: Vec<String> = patch
            .as_object()
            .map(|obj| obj.keys().cloned().collect())
            .unwrap_or_default();
        let fields = json_to_fields(&patch);
        self.client
            .update_document(collections::SETTINGS, GLOBAL_SETTINGS_DOC, fields, Some(mask))
            .await?;
        self.get_settings().await
    }

    async fn list_notifications(&self) -> FirestoreResult<Vec<Notification>> {
        let docs = self
            .client
            .list_all_documents(collections::NOTIFICATIONS)
            .await?;
        let mut items: Vec<Notification> = decode_all(collections::NOTIFICATIONS, docs);
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(items)
    }

    async fn push_notification(&self, notification: &Notification) -> FirestoreResult<String> {
        let fields = encode(notification)?;
        let doc = self
            .client
            .create_document(collections::NOTIFICATIONS, None, fields)
            .await?;
        doc.doc_id()
            .map(str::to_string)
            .ok_or_else(|| FirestoreError::invalid_response("notification has no resource name"))
    }

    async fn mark_notification_read(&self, id: &str) -> FirestoreResult<()> {
        let mut fields = HashMap::new();
        fields.insert("read".to_string(), true.to_firestore_value());
        self.client
            .update_document(
                collections::NOTIFICATIONS,
                id,
                fields,
                Some(vec!["read".to_string()]),
            )
            .await?;
        Ok(())
    }

    async fn list_users(&self) -> FirestoreResult<Vec<PlatformUser>> {
        let docs = self.client.list_all_documents(collections::USERS).await?;
        Ok(decode_all(collections::USERS, docs))
    }

    async fn get_user(&self, id: &str) -> FirestoreResult<Option<PlatformUser>> {
        match self.client.get_document(collections::USERS, id).await? {
            Some(doc) => Ok(Some(decode(&doc)?)),
            None => Ok(None),
        }
    }

    async fn set_user_plan(&self, id: &str, plan: UserPlan) -> FirestoreResult<()> {
        let mut fields = HashMap::new();
        fields.insert("plan".to_string(), plan.as_str().to_firestore_value());
        self.client
            .update_document(collections::USERS, id, fields, Some(vec!["plan".to_string()]))
            .await?;
        Ok(())
    }

    async fn set_user_disabled(&self, id: &str, disabled: bool) -> FirestoreResult<()> {
        let mut fields = HashMap::new();
        fields.insert("disabled".to_string(), disabled.to_firestore_value());
        self.client
            .update_document(
                collections::USERS,
                id,
                fields,
                Some(vec!["disabled".to_string()]),
            )
            .await?;
        Ok(())
    }
}
