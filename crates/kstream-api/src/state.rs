//! Shared application state.

use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use kstream_firestore::{
    AdminStore, AuditLogStore, ContentStore, FirestoreAdminStore, FirestoreAuditLogStore,
    FirestoreClient, FirestoreConfig, FirestoreContentStore, MemoryStore,
};
use kstream_models::AuditLogEntry;
use kstream_mux::MuxClient;
use kstream_storage::{BlobClient, BlobConfig};

use crate::auth::SessionVerifier;
use crate::config::ApiConfig;

/// Shared application state for all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ApiConfig>,
    pub content: Arc<dyn ContentStore>,
    pub audit: Arc<dyn AuditLogStore>,
    pub admin: Arc<dyn AdminStore>,
    pub mux: MuxClient,
    /// Blob storage for subtitles and artwork; absent when unconfigured.
    pub blob: Option<Arc<BlobClient>>,
    /// Plain HTTP client used for the same-origin upload relay.
    pub http: reqwest::Client,
    pub auth: Arc<SessionVerifier>,
}

impl AppState {
    /// Wire up application state from environment configuration.
    ///
    /// A missing document-store project selects the in-memory store; missing
    /// blob-storage credentials disable the subtitle/image upload endpoints.
    /// Both are the same degraded-but-exercisable posture the video host
    /// client takes when its credentials are absent.
    pub async fn new(config: ApiConfig) -> Result<Self> {
        let (content, audit, admin): (
            Arc<dyn ContentStore>,
            Arc<dyn AuditLogStore>,
            Arc<dyn AdminStore>,
        ) = match FirestoreConfig::from_env() {
            Ok(fs_config) => {
                let client = FirestoreClient::new(fs_config).await?;
                info!("Document store: Firestore");
                (
                    Arc::new(FirestoreContentStore::new(client.clone())) as Arc<dyn ContentStore>,
                    Arc::new(FirestoreAuditLogStore::new(client.clone())) as Arc<dyn AuditLogStore>,
                    Arc::new(FirestoreAdminStore::new(client)) as Arc<dyn AdminStore>,
                )
            }
            Err(e) => {
                warn!("Document store unconfigured ({}), using in-memory store", e);
                let memory = Arc::new(MemoryStore::new());
                (
                    memory.clone() as Arc<dyn ContentStore>,
                    memory.clone() as Arc<dyn AuditLogStore>,
                    memory as Arc<dyn AdminStore>,
                )
            }
        };

        let mux = MuxClient::from_env()?;

        let blob = match BlobConfig::from_env() {
            Ok(blob_config) => Some(Arc::new(BlobClient::new(blob_config).await?)),
            Err(e) => {
                warn!("Blob storage unconfigured ({}), uploads disabled", e);
                None
            }
        };

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        let auth = Arc::new(SessionVerifier::from_env());

        Ok(Self {
            config: Arc::new(config),
            content,
            audit,
            admin,
            mux,
            blob,
            http,
            auth,
        })
    }

    /// Blob client, or a 500 when storage is unconfigured.
    pub fn blob(&self) -> crate::error::ApiResult<&BlobClient> {
        self.blob
            .as_deref()
            .ok_or_else(|| crate::error::ApiError::internal("Blob storage is not configured"))
    }

    /// Write an audit entry, logging instead of failing on error. The audit
    /// trail is best-effort; a failed write never fails the mutation.
    pub async fn record_audit(&self, entry: AuditLogEntry) {
        if let Err(e) = self.audit.record(&entry).await {
            warn!(
                action = %entry.action,
                target = %entry.target,
                target_id = %entry.target_id,
                "Audit write failed: {}", e
            );
        }
    }

    /// Best-effort deletion of the video asset behind a deleted record.
    /// Failure logs a warning and never fails the content delete.
    pub async fn cleanup_asset(
        &self,
        asset_id: Option<&str>,
        playback_id: Option<&str>,
        legacy_video_id: Option<&str>,
    ) {
        let resolved =
            match kstream_upload::resolve_asset_id(&self.mux, asset_id, playback_id, legacy_video_id)
                .await
            {
                Ok(resolved) => resolved,
                Err(e) => {
                    warn!("Asset resolution failed during cleanup: {}", e);
                    return;
                }
            };

        match resolved {
            Some(id) => {
                if let Err(e) = self.mux.delete_asset(&id).await {
                    warn!(asset_id = %id, "Asset cleanup failed: {}", e);
                }
            }
            None => {
                info!("No backing asset to clean up");
            }
        }
    }
}
