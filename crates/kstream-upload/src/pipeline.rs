//! Subtitle pipeline: blob upload, then registration with the video host.
//!
//! Uploading the files and syncing them to the host are independent steps
//! with independent status tracking: a track can be uploaded but not yet
//! synced, and a sync can partially fail without invalidating the uploads.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use kstream_models::SubtitleTrack;
use kstream_mux::{CreateTextTrackRequest, MuxClient};
use kstream_storage::BlobClient;

use crate::subtitles::convert_srt_to_vtt;

/// Status of the blob upload step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubtitleUploadStatus {
    Idle,
    Uploading,
    Done,
    Error,
}

/// Status of the host sync step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubtitleSyncStatus {
    Idle,
    Syncing,
    Done,
    /// Some tracks registered, some failed.
    Partial,
    Error,
}

/// Result of registering one track with the host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackSyncResult {
    pub lang: String,
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Tracks without a public URL are skipped, not failed.
    #[serde(default)]
    pub skipped: bool,
}

/// Outcome of a full sync pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncReport {
    pub status: SubtitleSyncStatus,
    pub results: Vec<TrackSyncResult>,
}

/// Outcome of storing one subtitle file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubtitleUploadReport {
    pub lang: String,
    pub status: SubtitleUploadStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Upload a subtitle file (SRT or VTT). The file is normalized to VTT and
/// stored; the report carries the public URL on success and the failure
/// message otherwise, mirroring how [`sync_tracks`] reports the sync side.
pub async fn upload_subtitle_file(
    blob: &BlobClient,
    content_id: &str,
    lang: &str,
    content: &str,
) -> SubtitleUploadReport {
    let vtt = convert_srt_to_vtt(content);
    match blob.upload_subtitle(content_id, lang, &vtt).await {
        Ok(url) => {
            info!(content_id, lang, "Subtitle uploaded");
            SubtitleUploadReport {
                lang: lang.to_string(),
                status: SubtitleUploadStatus::Done,
                url: Some(url),
                error: None,
            }
        }
        Err(e) => {
            warn!(content_id, lang, "Subtitle upload failed: {}", e);
            SubtitleUploadReport {
                lang: lang.to_string(),
                status: SubtitleUploadStatus::Error,
                url: None,
                error: Some(e.to_string()),
            }
        }
    }
}

/// Register the given tracks on an asset.
///
/// Tracks without an absolute http(s) URL are skipped: the host fetches the
/// file by URL and cannot reach anything else. Individual registration
/// failures are captured per track so one bad track does not abort the rest.
pub async fn sync_tracks(
    mux: &MuxClient,
    asset_id: &str,
    tracks: &[SubtitleTrack],
) -> SyncReport {
    let mut results = Vec::with_capacity(tracks.len());

    for track in tracks {
        if !track.has_public_url() {
            warn!(lang = %track.lang, url = %track.url, "Skipping track without public URL");
            results.push(TrackSyncResult {
                lang: track.lang.clone(),
                ok: false,
                track_id: None,
                error: None,
                skipped: true,
            });
            continue;
        }

        let request =
            CreateTextTrackRequest::subtitles(&track.url, &track.lang, &track.label);
        match mux.create_text_track(asset_id, request).await {
            Ok(registered) => results.push(TrackSyncResult {
                lang: track.lang.clone(),
                ok: true,
                track_id: Some(registered.id),
                error: None,
                skipped: false,
            }),
            Err(e) => {
                warn!(lang = %track.lang, "Track registration failed: {}", e);
                results.push(TrackSyncResult {
                    lang: track.lang.clone(),
                    ok: false,
                    track_id: None,
                    error: Some(e.to_string()),
                    skipped: false,
                });
            }
        }
    }

    let attempted: Vec<&TrackSyncResult> = results.iter().filter(|r| !r.skipped).collect();
    let succeeded = attempted.iter().filter(|r| r.ok).count();
    let status = if attempted.is_empty() {
        SubtitleSyncStatus::Done
    } else if succeeded == attempted.len() {
        SubtitleSyncStatus::Done
    } else if succeeded > 0 {
        SubtitleSyncStatus::Partial
    } else {
        SubtitleSyncStatus::Error
    };

    SyncReport { status, results }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kstream_mux::MuxConfig;
    use kstream_storage::BlobConfig;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn track(lang: &str, url: &str) -> SubtitleTrack {
        SubtitleTrack {
            lang: lang.into(),
            label: lang.to_uppercase(),
            url: url.into(),
        }
    }

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

    #[tokio::test]
    async fn test_local_urls_are_skipped_not_failed() {
        let server = MockServer::start().await;
        let mux = live_client(&server.uri());

        let report = sync_tracks(&mux, "a1", &[track("en", "blob:local-ref")]).await;
        assert_eq!(report.status, SubtitleSyncStatus::Done);
        assert!(report.results[0].skipped);
        assert!(!report.results[0].ok);
    }

    #[tokio::test]
    async fn test_partial_failure_reported_per_track() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/video/v1/assets/a1/tracks"))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "data": { "id": "t-en", "status": "ready" }
            })))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/video/v1/assets/a1/tracks"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let mux = live_client(&server.uri());
        let tracks = vec![
            track("en", "https://cdn.example.com/en.vtt"),
            track("fr", "https://cdn.example.com/fr.vtt"),
        ];
        let report = sync_tracks(&mux, "a1", &tracks).await;

        assert_eq!(report.status, SubtitleSyncStatus::Partial);
        assert!(report.results[0].ok);
        assert_eq!(report.results[0].track_id.as_deref(), Some("t-en"));
        assert!(!report.results[1].ok);
        assert!(report.results[1].error.is_some());
    }

    async fn blob_client(endpoint: &str) -> BlobClient {
        BlobClient::new(BlobConfig {
            endpoint_url: endpoint.to_string(),
            access_key_id: "key".into(),
            secret_access_key: "secret".into(),
            bucket_name: "media".into(),
            region: "auto".into(),
            public_base_url: Some("https://cdn.example.com".into()),
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_subtitle_upload_reports_done_with_url() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/media/subtitles/m1/en.vtt"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let blob = blob_client(&server.uri()).await;
        let report =
            upload_subtitle_file(&blob, "m1", "en", "WEBVTT\n\n00:00.000 --> 00:01.000\nHi\n")
                .await;

        assert_eq!(report.status, SubtitleUploadStatus::Done);
        assert_eq!(
            report.url.as_deref(),
            Some("https://cdn.example.com/subtitles/m1/en.vtt")
        );
        assert!(report.error.is_none());
    }

    #[tokio::test]
    async fn test_subtitle_upload_failure_captured_in_report() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(403).set_body_string("denied"))
            .mount(&server)
            .await;

        let blob = blob_client(&server.uri()).await;
        let report = upload_subtitle_file(&blob, "m1", "en", "WEBVTT\n").await;

        assert_eq!(report.status, SubtitleUploadStatus::Error);
        assert!(report.url.is_none());
        assert!(report.error.is_some());
    }

    #[tokio::test]
    async fn test_all_failures_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let mux = live_client(&server.uri());
        let report = sync_tracks(&mux, "a1", &[track("en", "https://cdn.example.com/en.vtt")]).await;
        assert_eq!(report.status, SubtitleSyncStatus::Error);
    }
}
