//! Video-host facing handlers: upload sessions, status polling, asset
//! resolution, text-track sync and the same-origin upload relay.

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};
use url::Url;

use kstream_models::{AdminRole, SubtitleTrack};
use kstream_upload::{resolve_asset_id, sync_tracks};

use crate::auth::SessionUser;
use crate::error::{ApiError, ApiResult};
use crate::handlers::data;
use crate::metrics;
use crate::state::AppState;

/// Hosts the upload relay is allowed to forward bytes to. The relay exists
/// to sidestep browser CORS limits on direct-upload URLs, not to be an open
/// proxy.
const RELAY_ALLOWED_SUFFIXES: &[&str] = &[
    "mux.com",
    "amazonaws.com",
    "googleapis.com",
    "cloudfront.net",
];

#[derive(Debug, Default, Deserialize)]
pub struct UploadSessionRequest {
    /// What the upload is for: "movie", "episode" or "trailer".
    #[serde(default)]
    pub purpose: Option<String>,
}

/// Create a direct upload session at the video host.
pub async fn create_upload_session(
    State(state): State<AppState>,
    user: SessionUser,
    body: Option<Json<UploadSessionRequest>>,
) -> ApiResult<Json<Value>> {
    user.require(AdminRole::Editor)?;

    let purpose = body
        .and_then(|Json(request)| request.purpose)
        .unwrap_or_else(|| "movie".to_string());

    let upload = state.mux.create_direct_upload().await?;
    info!(
        upload_id = %upload.id,
        purpose = %purpose,
        mock = state.mux.is_mock(),
        "Upload session created"
    );

    Ok(data(json!({
        "uploadId": upload.id,
        "uploadUrl": upload.url,
        "mock": state.mux.is_mock(),
    })))
}

#[derive(Debug, Deserialize)]
pub struct UploadStatusQuery {
    pub id: String,
}

/// Poll the status of a direct upload.
pub async fn upload_status(
    State(state): State<AppState>,
    user: SessionUser,
    Query(query): Query<UploadStatusQuery>,
) -> ApiResult<Json<Value>> {
    user.require(AdminRole::Editor)?;

    let upload = state.mux.upload_status(&query.id).await?;

    // Resolve the playback id alongside the asset id once one exists, so the
    // dashboard's 2-second poll loop needs a single endpoint.
    let playback_id = match &upload.asset_id {
        Some(asset_id) => state
            .mux
            .get_asset(asset_id)
            .await
            .ok()
            .and_then(|asset| asset.playback_id().map(str::to_string)),
        None => None,
    };

    Ok(data(json!({
        "uploadId": upload.id,
        "status": upload.status,
        "assetId": upload.asset_id,
        "playbackId": playback_id,
        "errored": upload.is_errored(),
    })))
}

#[derive(Debug, Deserialize)]
pub struct ResolveAssetQuery {
    #[serde(default, rename = "assetId")]
    pub asset_id: Option<String>,
    #[serde(default, rename = "playbackId")]
    pub playback_id: Option<String>,
    #[serde(default, rename = "videoId")]
    pub video_id: Option<String>,
}

/// Resolve a playback id, legacy video id or host URL to a canonical asset
/// id. A miss is `data: { assetId: null }`, not an error.
pub async fn resolve_asset(
    State(state): State<AppState>,
    user: SessionUser,
    Query(query): Query<ResolveAssetQuery>,
) -> ApiResult<Json<Value>> {
    user.require(AdminRole::Editor)?;

    if query.asset_id.is_none() && query.playback_id.is_none() && query.video_id.is_none() {
        return Err(ApiError::bad_request(
            "Provide assetId, playbackId or videoId",
        ));
    }

    let resolved = resolve_asset_id(
        &state.mux,
        query.asset_id.as_deref(),
        query.playback_id.as_deref(),
        query.video_id.as_deref(),
    )
    .await?;

    Ok(data(json!({ "assetId": resolved })))
}

#[derive(Debug, Deserialize)]
pub struct TextTracksRequest {
    #[serde(rename = "assetId")]
    pub asset_id: String,
    pub tracks: Vec<SubtitleTrack>,
}

/// Register subtitle tracks on an asset. Per-track failures come back in the
/// report rather than failing the request.
pub async fn sync_text_tracks(
    State(state): State<AppState>,
    user: SessionUser,
    Json(request): Json<TextTracksRequest>,
) -> ApiResult<Json<Value>> {
    user.require(AdminRole::Editor)?;

    if request.asset_id.trim().is_empty() {
        return Err(ApiError::bad_request("assetId is required"));
    }

    let report = sync_tracks(&state.mux, &request.asset_id, &request.tracks).await;
    Ok(data(report))
}

#[derive(Debug, Deserialize)]
pub struct ProxyUploadQuery {
    pub url: String,
}

/// Same-origin upload relay: forward the raw body to the direct-upload URL.
/// Last rung of the transfer fallback chain, used when the browser cannot
/// PUT cross-origin.
pub async fn proxy_upload(
    State(state): State<AppState>,
    user: SessionUser,
    Query(query): Query<ProxyUploadQuery>,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    user.require(AdminRole::Editor)?;

    let target = Url::parse(&query.url)
        .map_err(|e| ApiError::bad_request(format!("Invalid relay URL: {e}")))?;

    if target.scheme() != "https" {
        return Err(ApiError::bad_request("Relay target must be https"));
    }
    let host = target
        .host_str()
        .ok_or_else(|| ApiError::bad_request("Relay target has no host"))?;
    if !relay_host_allowed(host) {
        warn!(host, "Relay target rejected");
        return Err(ApiError::forbidden("Relay target host is not allowed"));
    }
    if body.is_empty() {
        return Err(ApiError::bad_request("Relay body is empty"));
    }

    let size = body.len() as u64;
    let response = state
        .http
        .put(target)
        .header("Content-Type", "application/octet-stream")
        .body(body)
        .send()
        .await
        .map_err(|e| ApiError::Upstream(format!("Relay failed: {e}")))?;

    if !response.status().is_success() {
        return Err(ApiError::Upstream(format!(
            "Relay target responded {}",
            response.status()
        )));
    }

    metrics::record_relay_bytes(size);
    info!(bytes = size, "Upload relayed");
    Ok(data(json!({ "relayed": size })))
}

fn relay_host_allowed(host: &str) -> bool {
    let host = host.to_ascii_lowercase();
    RELAY_ALLOWED_SUFFIXES
        .iter()
        .any(|suffix| host == *suffix || host.ends_with(&format!(".{suffix}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relay_allows_host_subdomains() {
        assert!(relay_host_allowed("storage.googleapis.com"));
        assert!(relay_host_allowed("stream.mux.com"));
        assert!(relay_host_allowed("mux.com"));
    }

    #[test]
    fn test_relay_rejects_other_hosts() {
        assert!(!relay_host_allowed("evil.example.com"));
        // Suffix must match on a label boundary.
        assert!(!relay_host_allowed("notmux.com"));
        assert!(!relay_host_allowed("mux.com.attacker.io"));
    }
}
