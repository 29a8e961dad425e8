//! Video host API client.
//!
//! Talks to the Mux Video v1 REST API with basic auth. When credentials are
//! absent the client runs in mock mode and returns deterministic fixtures,
//! so the dashboard upload flow can be exercised end to end without a video
//! host account.

use std::time::Duration;

use chrono::Utc;
use reqwest::{Client, Method, StatusCode};
use tracing::{debug, info, warn};

use crate::error::{MuxError, MuxResult};
use crate::types::{
    Asset, CreateDirectUploadRequest, CreateTextTrackRequest, DirectUpload, Envelope,
    NewAssetSettings, PlaybackId, PlaybackIdResolution, TextTrack,
};

/// Production API base URL.
pub const MUX_API_BASE: &str = "https://api.mux.com";

/// Fixtures returned in mock mode.
pub mod mock {
    /// URL handed out for mock direct uploads. Transfers against it are
    /// short-circuited client-side.
    pub const DIRECT_UPLOAD_URL: &str = "https://stream.mux.com/mock-direct-upload";
    /// Playback id every mock asset reports.
    pub const PLAYBACK_ID: &str = "mockplaybackid1234";
    /// Asset id every mock upload resolves to.
    pub const ASSET_ID: &str = "mock-asset";

    /// Mock upload ids embed a timestamp so parallel uploads stay distinct.
    pub fn upload_id(timestamp_ms: i64) -> String {
        format!("mock-upload-{timestamp_ms}")
    }
}

/// Live or mock operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MuxMode {
    Live,
    Mock,
}

/// Video host client configuration.
#[derive(Debug, Clone)]
pub struct MuxConfig {
    pub token_id: Option<String>,
    pub token_secret: Option<String>,
    pub base_url: String,
    /// Origin allowed to PUT to direct upload URLs.
    pub cors_origin: String,
    pub timeout: Duration,
}

impl MuxConfig {
    /// Create config from environment variables. Missing credentials select
    /// mock mode rather than failing, MUX_FORCE_MOCK=1 forces it.
    pub fn from_env() -> Self {
        Self {
            token_id: std::env::var("MUX_TOKEN_ID").ok().filter(|v| !v.is_empty()),
            token_secret: std::env::var("MUX_TOKEN_SECRET")
                .ok()
                .filter(|v| !v.is_empty()),
            base_url: std::env::var("MUX_API_BASE_URL")
                .unwrap_or_else(|_| MUX_API_BASE.to_string()),
            cors_origin: std::env::var("MUX_CORS_ORIGIN").unwrap_or_else(|_| "*".to_string()),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn mode(&self) -> MuxMode {
        let forced = std::env::var("MUX_FORCE_MOCK")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        if forced || self.token_id.is_none() || self.token_secret.is_none() {
            MuxMode::Mock
        } else {
            MuxMode::Live
        }
    }
}

/// Video host API client.
#[derive(Clone)]
pub struct MuxClient {
    http: Client,
    config: MuxConfig,
    mode: MuxMode,
}

impl MuxClient {
    pub fn new(config: MuxConfig) -> MuxResult<Self> {
        let mode = config.mode();
        if mode == MuxMode::Mock {
            info!("Video host client running in mock mode");
        }

        let http = Client::builder()
            .timeout(config.timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .user_agent(concat!("kstream-mux/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(MuxError::Network)?;

        Ok(Self { http, config, mode })
    }

    /// Create from environment variables.
    pub fn from_env() -> MuxResult<Self> {
        Self::new(MuxConfig::from_env())
    }

    /// Override the API base URL, for tests against a local server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url = base_url.into();
        self
    }

    pub fn mode(&self) -> MuxMode {
        self.mode
    }

    pub fn is_mock(&self) -> bool {
        self.mode == MuxMode::Mock
    }

    async fn send<T: serde::de::DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> MuxResult<T> {
        let url = format!("{}{}", self.config.base_url, path);
        let mut request = self.http.request(method, &url);

        if let (Some(id), Some(secret)) = (&self.config.token_id, &self.config.token_secret) {
            request = request.basic_auth(id, Some(secret));
        }
        if let Some(json) = &body {
            request = request.json(json);
        }

        let response = request.send().await?;
        let status = response.status();

        match status {
            StatusCode::OK | StatusCode::CREATED => {
                let envelope: Envelope<T> = response.json().await?;
                Ok(envelope.data)
            }
            StatusCode::NOT_FOUND => Err(MuxError::not_found(path.to_string())),
            _ => {
                let text = response.text().await.unwrap_or_default();
                warn!(status = status.as_u16(), path, "Video host request failed");
                Err(MuxError::upstream(
                    status.as_u16(),
                    format!("{} failed: {}", path, text),
                ))
            }
        }
    }

    async fn send_no_content(&self, method: Method, path: &str) -> MuxResult<()> {
        let url = format!("{}{}", self.config.base_url, path);
        let mut request = self.http.request(method, &url);
        if let (Some(id), Some(secret)) = (&self.config.token_id, &self.config.token_secret) {
            request = request.basic_auth(id, Some(secret));
        }

        let response = request.send().await?;
        let status = response.status();
        match status {
            StatusCode::OK | StatusCode::NO_CONTENT | StatusCode::ACCEPTED => Ok(()),
            StatusCode::NOT_FOUND => Err(MuxError::not_found(path.to_string())),
            _ => {
                let text = response.text().await.unwrap_or_default();
                Err(MuxError::upstream(
                    status.as_u16(),
                    format!("{} failed: {}", path, text),
                ))
            }
        }
    }

    // =========================================================================
    // Direct uploads
    // =========================================================================

    /// Create a direct upload slot.
    pub async fn create_direct_upload(&self) -> MuxResult<DirectUpload> {
        if self.is_mock() {
            let id = mock::upload_id(Utc::now().timestamp_millis());
            debug!(upload_id = %id, "Issuing mock direct upload");
            return Ok(DirectUpload {
                id,
                url: Some(mock::DIRECT_UPLOAD_URL.to_string()),
                status: "waiting".to_string(),
                asset_id: None,
                error: None,
            });
        }

        let request = CreateDirectUploadRequest {
            cors_origin: self.config.cors_origin.clone(),
            new_asset_settings: NewAssetSettings {
                playback_policy: vec!["public".to_string()],
            },
        };

        self.send(
            Method::POST,
            "/video/v1/uploads",
            Some(serde_json::to_value(request)?),
        )
        .await
    }

    /// Fetch the current status of a direct upload.
    pub async fn upload_status(&self, upload_id: &str) -> MuxResult<DirectUpload> {
        if self.is_mock() {
            return Ok(DirectUpload {
                id: upload_id.to_string(),
                url: Some(mock::DIRECT_UPLOAD_URL.to_string()),
                status: "asset_created".to_string(),
                asset_id: Some(mock::ASSET_ID.to_string()),
                error: None,
            });
        }

        let path = format!("/video/v1/uploads/{}", upload_id);
        self.send(Method::GET, &path, None).await
    }

    // =========================================================================
    // Assets
    // =========================================================================

    /// Fetch an asset.
    pub async fn get_asset(&self, asset_id: &str) -> MuxResult<Asset> {
        if self.is_mock() {
            return Ok(Asset {
                id: asset_id.to_string(),
                status: "ready".to_string(),
                playback_ids: vec![PlaybackId {
                    id: mock::PLAYBACK_ID.to_string(),
                    policy: Some("public".to_string()),
                }],
                duration: None,
            });
        }

        let path = format!("/video/v1/assets/{}", asset_id);
        self.send(Method::GET, &path, None).await
    }

    /// Delete an asset. Missing assets are treated as already deleted.
    pub async fn delete_asset(&self, asset_id: &str) -> MuxResult<()> {
        if self.is_mock() {
            return Ok(());
        }

        let path = format!("/video/v1/assets/{}", asset_id);
        match self.send_no_content(Method::DELETE, &path).await {
            Ok(()) => Ok(()),
            Err(MuxError::NotFound(_)) => {
                debug!(asset_id, "Asset already deleted");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Resolve a playback id to the asset that owns it. Returns `None` when
    /// the host does not know the playback id.
    pub async fn resolve_playback_id(&self, playback_id: &str) -> MuxResult<Option<String>> {
        if self.is_mock() {
            return Ok(Some(mock::ASSET_ID.to_string()));
        }

        let path = format!("/video/v1/playback-ids/{}", playback_id);
        match self.send::<PlaybackIdResolution>(Method::GET, &path, None).await {
            Ok(resolution) if resolution.object.kind == "asset" => Ok(Some(resolution.object.id)),
            Ok(_) => Ok(None),
            Err(MuxError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    // =========================================================================
    // Text tracks
    // =========================================================================

    /// Register a text track on an asset.
    pub async fn create_text_track(
        &self,
        asset_id: &str,
        track: CreateTextTrackRequest,
    ) -> MuxResult<TextTrack> {
        if self.is_mock() {
            return Ok(TextTrack {
                id: format!("mock-track-{}", track.language_code),
                status: Some("ready".to_string()),
                language_code: Some(track.language_code),
                name: Some(track.name),
            });
        }

        let path = format!("/video/v1/assets/{}/tracks", asset_id);
        self.send(Method::POST, &path, Some(serde_json::to_value(track)?))
            .await
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn live_client(base_url: &str) -> MuxClient {
        let config = MuxConfig {
            token_id: Some("tid".into()),
            token_secret: Some("tsecret".into()),
            base_url: base_url.to_string(),
            cors_origin: "https://admin.example.com".into(),
            timeout: Duration::from_secs(5),
        };
        MuxClient::new(config).unwrap()
    }

    fn mock_client() -> MuxClient {
        let config = MuxConfig {
            token_id: None,
            token_secret: None,
            base_url: MUX_API_BASE.to_string(),
            cors_origin: "*".into(),
            timeout: Duration::from_secs(5),
        };
        MuxClient::new(config).unwrap()
    }

    #[tokio::test]
    async fn test_mock_direct_upload_is_deterministic() {
        let client = mock_client();
        assert!(client.is_mock());

        let upload = client.create_direct_upload().await.unwrap();
        assert!(upload.id.starts_with("mock-upload-"));
        assert_eq!(upload.url.as_deref(), Some(mock::DIRECT_UPLOAD_URL));

        let status = client.upload_status(&upload.id).await.unwrap();
        assert!(status.is_asset_created());
        assert_eq!(status.asset_id.as_deref(), Some(mock::ASSET_ID));

        let asset = client.get_asset(mock::ASSET_ID).await.unwrap();
        assert_eq!(asset.playback_id(), Some(mock::PLAYBACK_ID));
    }

    #[tokio::test]
    async fn test_create_direct_upload_live() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/video/v1/uploads"))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "data": {
                    "id": "upload-1",
                    "url": "https://storage.example.com/put-here",
                    "status": "waiting"
                }
            })))
            .mount(&server)
            .await;

        let client = live_client(&server.uri());
        let upload = client.create_direct_upload().await.unwrap();
        assert_eq!(upload.id, "upload-1");
        assert_eq!(upload.status, "waiting");
    }

    #[tokio::test]
    async fn test_resolve_playback_id_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/video/v1/playback-ids/pb123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": {
                    "id": "pb123",
                    "object": { "id": "asset-9", "type": "asset" }
                }
            })))
            .mount(&server)
            .await;

        let client = live_client(&server.uri());
        let asset_id = client.resolve_playback_id("pb123").await.unwrap();
        assert_eq!(asset_id.as_deref(), Some("asset-9"));
    }

    #[tokio::test]
    async fn test_resolve_playback_id_unknown_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/video/v1/playback-ids/nope"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "error": { "messages": ["not found"] }
            })))
            .mount(&server)
            .await;

        let client = live_client(&server.uri());
        let asset_id = client.resolve_playback_id("nope").await.unwrap();
        assert!(asset_id.is_none());
    }

    #[tokio::test]
    async fn test_delete_asset_is_idempotent() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/video/v1/assets/gone"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = live_client(&server.uri());
        client.delete_asset("gone").await.unwrap();
    }

    #[tokio::test]
    async fn test_upstream_error_carries_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/video/v1/assets/a1"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let client = live_client(&server.uri());
        let err = client.get_asset("a1").await.unwrap_err();
        match err {
            MuxError::Upstream { status, .. } => assert_eq!(status, 500),
            other => panic!("expected upstream error, got {other:?}"),
        }
    }
}
