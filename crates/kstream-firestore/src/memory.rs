//! In-memory implementations of the storage traits.
//!
//! Backs mock mode and tests. State lives behind `RwLock`s inside the store
//! instance, so two stores never share data and dropping the store drops
//! everything it held.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use kstream_models::{
    AuditLogEntry, Episode, Fingerprint, Movie, Notification, PlatformUser, Series, UserPlan,
};

use crate::error::{FirestoreError, FirestoreResult};
use crate::store::{AdminStore, AuditLogStore, ContentStore};

/// In-memory document store.
#[derive(Default)]
pub struct MemoryStore {
    movies: RwLock<HashMap<String, Movie>>,
    series: RwLock<HashMap<String, Series>>,
    users: RwLock<HashMap<String, PlatformUser>>,
    notifications: RwLock<HashMap<String, Notification>>,
    audit_log: RwLock<Vec<AuditLogEntry>>,
    settings: RwLock<serde_json::Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            settings: RwLock::new(serde_json::json!({})),
            ..Default::default()
        }
    }

    /// Seed a user, for tests and mock mode.
    pub async fn insert_user(&self, user: PlatformUser) {
        self.users.write().await.insert(user.id.clone(), user);
    }

    fn new_id() -> String {
        Uuid::new_v4().to_string()
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn list_movies(&self) -> FirestoreResult<Vec<Movie>> {
        let movies = self.movies.read().await;
        let mut all: Vec<Movie> = movies.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }

    async fn get_movie(&self, id: &str) -> FirestoreResult<Option<Movie>> {
        Ok(self.movies.read().await.get(id).cloned())
    }

    async fn create_movie(&self, movie: &Movie) -> FirestoreResult<String> {
        let id = Self::new_id();
        let mut record = movie.clone();
        record.id = id.clone();
        self.movies.write().await.insert(id.clone(), record);
        Ok(id)
    }

    async fn update_movie(&self, id: &str, movie: &Movie) -> FirestoreResult<()> {
        let mut movies = self.movies.write().await;
        if !movies.contains_key(id) {
            return Err(FirestoreError::not_found(format!("movies/{id}")));
        }
        let mut record = movie.clone();
        record.id = id.to_string();
        movies.insert(id.to_string(), record);
        Ok(())
    }

    async fn delete_movie(&self, id: &str) -> FirestoreResult<()> {
        self.movies.write().await.remove(id);
        Ok(())
    }

    async fn list_series(&self) -> FirestoreResult<Vec<Series>> {
        let series = self.series.read().await;
        let mut all: Vec<Series> = series.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }

    async fn get_series(&self, id: &str) -> FirestoreResult<Option<Series>> {
        Ok(self.series.read().await.get(id).cloned())
    }

    async fn create_series(&self, series: &Series) -> FirestoreResult<String> {
        let id = Self::new_id();
        let mut record = series.clone();
        record.id = id.clone();
        self.series.write().await.insert(id.clone(), record);
        Ok(id)
    }

    async fn update_series(&self, id: &str, series: &Series) -> FirestoreResult<()> {
        let mut all = self.series.write().await;
        if !all.contains_key(id) {
            return Err(FirestoreError::not_found(format!("series/{id}")));
        }
        let mut record = series.clone();
        record.id = id.to_string();
        all.insert(id.to_string(), record);
        Ok(())
    }

    async fn delete_series(&self, id: &str) -> FirestoreResult<()> {
        self.series.write().await.remove(id);
        Ok(())
    }

    async fn find_movie_by_fingerprint(
        &self,
        fingerprint: &Fingerprint,
    ) -> FirestoreResult<Option<Movie>> {
        let movies = self.movies.read().await;
        Ok(movies
            .values()
            .find(|m| {
                m.file_hash
                    .as_ref()
                    .is_some_and(|fh| fh.matches(fingerprint))
            })
            .cloned())
    }

    async fn find_episode_by_fingerprint(
        &self,
        fingerprint: &Fingerprint,
    ) -> FirestoreResult<Option<(Series, Episode)>> {
        let all = self.series.read().await;
        for series in all.values() {
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
                return Ok(Some((series.clone(), episode)));
            }
        }
        Ok(None)
    }
}

#[async_trait]
impl AuditLogStore for MemoryStore {
    async fn record(&self, entry: &AuditLogEntry) -> FirestoreResult<String> {
        let id = Self::new_id();
        let mut record = entry.clone();
        record.id = id.clone();
        self.audit_log.write().await.push(record);
        Ok(id)
    }

    async fn list_recent(&self, limit: usize) -> FirestoreResult<Vec<AuditLogEntry>> {
        let log = self.audit_log.read().await;
        let mut entries: Vec<AuditLogEntry> = log.clone();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        entries.truncate(limit);
        Ok(entries)
    }
}

#[async_trait]
impl AdminStore for MemoryStore {
    async fn get_settings(&self) -> FirestoreResult<serde_json::Value> {
        Ok(self.settings.read().await.clone())
    }

    async fn update_settings(&self, patch: serde_json::Value) -> FirestoreResult<serde_json::Value> {
        let mut settings = self.settings.write().await;
        if let (Some(current), Some(changes)) = (settings.as_object_mut(), patch.as_object()) {
            for (key, value) in changes {
                current.insert(key.clone(), value.clone());
            }
        }
        Ok(settings.clone())
    }

    async fn list_notifications(&self) -> FirestoreResult<Vec<Notification>> {
        let all = self.notifications.read().await;
        let mut items: Vec<Notification> = all.values().cloned().collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(items)
    }

    async fn push_notification(&self, notification: &Notification) -> FirestoreResult<String> {
        let id = Self::new_id();
        let mut record = notification.clone();
        record.id = id.clone();
        self.notifications.write().await.insert(id.clone(), record);
        Ok(id)
    }

    async fn mark_notification_read(&self, id: &str) -> FirestoreResult<()> {
        let mut all = self.notifications.write().await;
        match all.get_mut(id) {
            Some(notification) => {
                notification.read = true;
                Ok(())
            }
            None => Err(FirestoreError::not_found(format!(
                "kstream-notifications/{id}"
            ))),
        }
    }

    async fn list_users(&self) -> FirestoreResult<Vec<PlatformUser>> {
        Ok(self.users.read().await.values().cloned().collect())
    }

    async fn get_user(&self, id: &str) -> FirestoreResult<Option<PlatformUser>> {
        Ok(self.users.read().await.get(id).cloned())
    }

    async fn set_user_plan(&self, id: &str, plan: UserPlan) -> FirestoreResult<()> {
        let mut users = self.users.write().await;
        match users.get_mut(id) {
            Some(user) => {
                user.plan = plan;
                Ok(())
            }
            None => Err(FirestoreError::not_found(format!("users/{id}"))),
        }
    }

    async fn set_user_disabled(&self, id: &str, disabled: bool) -> FirestoreResult<()> {
        let mut users = self.users.write().await;
        match users.get_mut(id) {
            Some(user) => {
                user.disabled = disabled;
                Ok(())
            }
            None => Err(FirestoreError::not_found(format!("users/{id}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kstream_models::{ActorRef, AuditAction};

    fn movie(title: &str, hash: Option<Fingerprint>) -> Movie {
        let mut m: Movie = serde_json::from_value(serde_json::json!({
            "title": title,
            "description": "A perfectly serviceable description.",
            "category": "Drama",
        }))
        .unwrap();
        m.set_playback_id("pb1");
        m.file_hash = hash;
        m
    }

    #[tokio::test]
    async fn test_movie_crud_round_trip() {
        let store = MemoryStore::new();
        let id = store.create_movie(&movie("First", None)).await.unwrap();

        let fetched = store.get_movie(&id).await.unwrap().unwrap();
        assert_eq!(fetched.title, "First");
        assert_eq!(fetched.id, id);

        let mut updated = fetched.clone();
        updated.title = "Renamed".into();
        store.update_movie(&id, &updated).await.unwrap();
        assert_eq!(store.get_movie(&id).await.unwrap().unwrap().title, "Renamed");

        store.delete_movie(&id).await.unwrap();
        assert!(store.get_movie(&id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_missing_movie_is_not_found() {
        let store = MemoryStore::new();
        let err = store
            .update_movie("nope", &movie("Ghost", None))
            .await
            .unwrap_err();
        assert!(matches!(err, FirestoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_fingerprint_lookup_finds_movie() {
        let store = MemoryStore::new();
        let fp = Fingerprint::new("abc123", 2048);
        store
            .create_movie(&movie("Dup", Some(fp.clone())))
            .await
            .unwrap();

        let hit = store.find_movie_by_fingerprint(&fp).await.unwrap();
        assert_eq!(hit.unwrap().title, "Dup");

        let miss = store
            .find_movie_by_fingerprint(&Fingerprint::new("abc123", 4096))
            .await
            .unwrap();
        assert!(miss.is_none());
    }

    #[tokio::test]
    async fn test_episode_fingerprint_scan() {
        let store = MemoryStore::new();
        let fp = Fingerprint::new("ep-hash", 99);
        let mut series: Series = serde_json::from_value(serde_json::json!({
            "title": "Show",
            "description": "A show about things happening.",
            "category": "Comedy",
            "episodes": [{
                "episodeId": "e1",
                "epNumber": 1,
                "title": "Pilot",
                "description": "It begins.",
                "mux_playback_id": "pb_e1",
            }],
        }))
        .unwrap();
        series.episodes[0].file_hash = Some(fp.clone());
        store.create_series(&series).await.unwrap();

        let hit = store.find_episode_by_fingerprint(&fp).await.unwrap();
        let (found_series, found_episode) = hit.unwrap();
        assert_eq!(found_series.title, "Show");
        assert_eq!(found_episode.episode_id, "e1");
    }

    #[tokio::test]
    async fn test_settings_merge() {
        let store = MemoryStore::new();
        store
            .update_settings(serde_json::json!({"maintenance": true}))
            .await
            .unwrap();
        let merged = store
            .update_settings(serde_json::json!({"banner": "hi"}))
            .await
            .unwrap();
        assert_eq!(merged["maintenance"], true);
        assert_eq!(merged["banner"], "hi");
    }

    #[tokio::test]
    async fn test_audit_entries_newest_first() {
        let store = MemoryStore::new();
        let actor = ActorRef {
            uid: "u1".into(),
            email: None,
            display_name: None,
        };
        for i in 0..3 {
            let mut entry =
                AuditLogEntry::new(AuditAction::Create, "movies", format!("m{i}"), actor.clone());
            entry.created_at = chrono::Utc::now() + chrono::Duration::seconds(i);
            store.record(&entry).await.unwrap();
        }
        let recent = store.list_recent(2).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].target_id, "m2");
        assert_eq!(recent[1].target_id, "m1");
    }
}
