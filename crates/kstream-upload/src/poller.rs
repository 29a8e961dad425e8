//! Post-transfer status polling.
//!
//! After the bytes land, the video host ingests them asynchronously. The
//! poller asks for the upload status on a fixed interval until the asset is
//! created and ready with a playback id, or the ceiling is hit.

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info};

use kstream_mux::MuxClient;

use crate::error::{UploadError, UploadResult};

/// Default poll interval.
pub const POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Default polling ceiling.
pub const POLL_TIMEOUT: Duration = Duration::from_secs(120);

/// Poller settings, overridable for tests.
#[derive(Debug, Clone)]
pub struct PollConfig {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: POLL_INTERVAL,
            timeout: POLL_TIMEOUT,
        }
    }
}

/// Identifiers produced by a finished ingest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollOutcome {
    pub asset_id: String,
    pub playback_id: String,
}

/// Poll until the upload's asset is ready and exposes a playback id.
pub async fn poll_until_ready(
    mux: &MuxClient,
    config: &PollConfig,
    upload_id: &str,
) -> UploadResult<PollOutcome> {
    let deadline = Instant::now() + config.timeout;
    let mut asset_id: Option<String> = None;

    loop {
        if Instant::now() >= deadline {
            return Err(UploadError::PollTimeout(config.timeout.as_secs()));
        }

        match &asset_id {
            None => {
                let upload = mux.upload_status(upload_id).await?;
                if upload.is_errored() {
                    let message = upload
                        .error
                        .and_then(|e| e.message)
                        .unwrap_or_else(|| upload.status.clone());
                    return Err(UploadError::UploadErrored(message));
                }
                if upload.is_asset_created() {
                    debug!(upload_id, "Upload produced an asset");
                    asset_id = upload.asset_id;
                    // Check the asset immediately rather than waiting a tick.
                    continue;
                }
            }
            Some(id) => {
                let asset = mux.get_asset(id).await?;
                if asset.status == "errored" {
                    return Err(UploadError::UploadErrored(format!(
                        "asset {} errored during ingest",
                        id
                    )));
                }
                if asset.is_ready() {
                    if let Some(playback_id) = asset.playback_id() {
                        info!(upload_id, asset_id = %id, playback_id, "Ingest complete");
                        return Ok(PollOutcome {
                            asset_id: id.clone(),
                            playback_id: playback_id.to_string(),
                        });
                    }
                    // Ready but no playback id yet; keep polling until one
                    // appears or the ceiling trips.
                }
            }
        }

        tokio::time::sleep(config.interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kstream_mux::{MuxConfig, MUX_API_BASE};
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn live_client(base_url: &str) -> MuxClient {
        MuxClient::new(MuxConfig {
            token_id: Some("tid".into()),
            token_secret: Some("ts".into()),
            base_url: base_url.to_string(),
            cors_origin: "*".into(),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    fn fast_config() -> PollConfig {
        PollConfig {
            interval: Duration::from_millis(10),
            timeout: Duration::from_millis(500),
        }
    }

    #[tokio::test]
    async fn test_mock_mode_resolves_immediately() {
        let mux = MuxClient::new(MuxConfig {
            token_id: None,
            token_secret: None,
            base_url: MUX_API_BASE.to_string(),
            cors_origin: "*".into(),
            timeout: Duration::from_secs(5),
        })
        .unwrap();

        let outcome = poll_until_ready(&mux, &fast_config(), "mock-upload-1")
            .await
            .unwrap();
        assert_eq!(outcome.asset_id, kstream_mux::mock::ASSET_ID);
        assert_eq!(outcome.playback_id, kstream_mux::mock::PLAYBACK_ID);
    }

    #[tokio::test]
    async fn test_waits_through_preparing_then_succeeds() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/video/v1/uploads/up1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": { "id": "up1", "status": "asset_created", "asset_id": "a1" }
            })))
            .mount(&server)
            .await;

        // First asset read: preparing. Subsequent reads: ready.
        Mock::given(method("GET"))
            .and(path("/video/v1/assets/a1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": { "id": "a1", "status": "preparing", "playback_ids": [] }
            })))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/video/v1/assets/a1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": {
                    "id": "a1",
                    "status": "ready",
                    "playback_ids": [{ "id": "pb1", "policy": "public" }]
                }
            })))
            .mount(&server)
            .await;

        let mux = live_client(&server.uri());
        let outcome = poll_until_ready(&mux, &fast_config(), "up1").await.unwrap();
        assert_eq!(outcome.asset_id, "a1");
        assert_eq!(outcome.playback_id, "pb1");
    }

    #[tokio::test]
    async fn test_errored_upload_fails_fast() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/video/v1/uploads/bad"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": {
                    "id": "bad",
                    "status": "errored",
                    "error": { "message": "invalid input file" }
                }
            })))
            .mount(&server)
            .await;

        let mux = live_client(&server.uri());
        let err = poll_until_ready(&mux, &fast_config(), "bad").await.unwrap_err();
        match err {
            UploadError::UploadErrored(msg) => assert!(msg.contains("invalid input")),
            other => panic!("expected UploadErrored, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_ceiling_produces_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/video/v1/uploads/slow"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": { "id": "slow", "status": "waiting" }
            })))
            .mount(&server)
            .await;

        let mux = live_client(&server.uri());
        let config = PollConfig {
            interval: Duration::from_millis(10),
            timeout: Duration::from_millis(50),
        };
        let err = poll_until_ready(&mux, &config, "slow").await.unwrap_err();
        assert!(matches!(err, UploadError::PollTimeout(_)));
    }
}
