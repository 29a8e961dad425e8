//! The end-to-end upload workflow and its phase state machine.

use std::sync::Arc;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use kstream_firestore::ContentStore;
use kstream_models::{Fingerprint, SubtitleTrack};
use kstream_mux::MuxClient;

use crate::dedup::{find_duplicate, DuplicateMatch};
use crate::error::{UploadError, UploadResult};
use crate::fingerprint::fingerprint_bytes;
use crate::pipeline::{sync_tracks, SyncReport};
use crate::poller::{poll_until_ready, PollConfig};
use crate::transfer::{transfer, ProgressFn, TransferConfig, TransferMethod};

/// Phase of an upload, in the order a successful run passes through them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UploadPhase {
    Idle,
    Hashing,
    CheckingDedup,
    Uploading,
    Polling,
    Resolving,
    SyncingSubtitles,
    Ready,
    Error,
}

impl UploadPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadPhase::Idle => "idle",
            UploadPhase::Hashing => "hashing",
            UploadPhase::CheckingDedup => "checking-dedup",
            UploadPhase::Uploading => "uploading",
            UploadPhase::Polling => "polling",
            UploadPhase::Resolving => "resolving",
            UploadPhase::SyncingSubtitles => "syncing-subtitles",
            UploadPhase::Ready => "ready",
            UploadPhase::Error => "error",
        }
    }

    /// Whether moving to `next` is a legal transition.
    ///
    /// Forward progress only, with two extras: any active phase may fail to
    /// `Error`, and `CheckingDedup` may jump straight to `Ready` when a
    /// duplicate short-circuits the upload.
    pub fn can_transition(&self, next: UploadPhase) -> bool {
        use UploadPhase::*;
        match (self, next) {
            (_, Error) => !matches!(self, Ready | Error),
            (Idle, Hashing) => true,
            (Hashing, CheckingDedup) => true,
            (CheckingDedup, Uploading) => true,
            (CheckingDedup, Ready) => true,
            (Uploading, Polling) => true,
            (Polling, Resolving) => true,
            (Resolving, SyncingSubtitles) => true,
            (Resolving, Ready) => true,
            (SyncingSubtitles, Ready) => true,
            _ => false,
        }
    }

    /// The playback URL can be previewed from this phase on.
    pub fn video_ready(&self) -> bool {
        matches!(self, UploadPhase::SyncingSubtitles | UploadPhase::Ready)
    }

    /// Subtitle uploads may start once the asset exists.
    pub fn subtitles_ready(&self) -> bool {
        matches!(
            self,
            UploadPhase::Resolving | UploadPhase::SyncingSubtitles | UploadPhase::Ready
        )
    }

    /// The record may be saved once the upload reached a terminal success.
    pub fn can_save(&self) -> bool {
        matches!(self, UploadPhase::Ready)
    }
}

/// Tracks the current phase and enforces legal transitions.
#[derive(Debug, Clone)]
pub struct PhaseTracker {
    phase: UploadPhase,
}

impl PhaseTracker {
    pub fn new() -> Self {
        Self {
            phase: UploadPhase::Idle,
        }
    }

    pub fn phase(&self) -> UploadPhase {
        self.phase
    }

    pub fn advance(&mut self, next: UploadPhase) -> UploadResult<()> {
        if !self.phase.can_transition(next) {
            return Err(UploadError::InvalidTransition {
                from: self.phase.as_str().to_string(),
                to: next.as_str().to_string(),
            });
        }
        self.phase = next;
        Ok(())
    }
}

impl Default for PhaseTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// What an upload run produced.
#[derive(Debug, Clone)]
pub struct WorkflowOutcome {
    pub phase: UploadPhase,
    pub fingerprint: Fingerprint,
    /// Set when the fingerprint matched an existing record and the upload
    /// was skipped.
    pub duplicate: Option<DuplicateMatch>,
    pub upload_id: Option<String>,
    pub asset_id: Option<String>,
    pub playback_id: Option<String>,
    pub transfer_method: Option<TransferMethod>,
    pub subtitle_sync: Option<SyncReport>,
}

/// Orchestrates one file through hash, dedup, transfer, poll and subtitle
/// sync.
pub struct UploadWorkflow {
    mux: MuxClient,
    http: Client,
    transfer_config: TransferConfig,
    poll_config: PollConfig,
}

impl UploadWorkflow {
    pub fn new(mux: MuxClient, transfer_config: TransferConfig, poll_config: PollConfig) -> Self {
        Self {
            mux,
            http: Client::new(),
            transfer_config,
            poll_config,
        }
    }

    /// Run the full workflow for an in-memory payload.
    #[instrument(skip_all, fields(bytes = payload.len(), tracks = subtitle_tracks.len()))]
    pub async fn run(
        &self,
        store: &dyn ContentStore,
        payload: Vec<u8>,
        subtitle_tracks: &[SubtitleTrack],
        progress: ProgressFn,
    ) -> UploadResult<WorkflowOutcome> {
        let mut tracker = PhaseTracker::new();

        tracker.advance(UploadPhase::Hashing)?;
        let fingerprint = fingerprint_bytes(&payload);

        tracker.advance(UploadPhase::CheckingDedup)?;
        if let Some(duplicate) = find_duplicate(store, &fingerprint).await {
            info!("Duplicate upload detected: {}", duplicate.describe());
            tracker.advance(UploadPhase::Ready)?;
            let playback_id = duplicate.playback_id().map(str::to_string);
            return Ok(WorkflowOutcome {
                phase: tracker.phase(),
                fingerprint,
                duplicate: Some(duplicate),
                upload_id: None,
                asset_id: None,
                playback_id,
                transfer_method: None,
                subtitle_sync: None,
            });
        }

        tracker.advance(UploadPhase::Uploading)?;
        let upload = self.mux.create_direct_upload().await?;
        let upload_url = upload.url.clone().ok_or_else(|| {
            UploadError::UploadErrored("direct upload slot came back without a URL".to_string())
        })?;
        let transfer_method = transfer(
            &self.http,
            &self.transfer_config,
            &upload_url,
            payload,
            Arc::clone(&progress),
        )
        .await?;

        tracker.advance(UploadPhase::Polling)?;
        let outcome = poll_until_ready(&self.mux, &self.poll_config, &upload.id).await?;

        tracker.advance(UploadPhase::Resolving)?;

        let subtitle_sync = if subtitle_tracks.is_empty() {
            tracker.advance(UploadPhase::Ready)?;
            None
        } else {
            tracker.advance(UploadPhase::SyncingSubtitles)?;
            let report = sync_tracks(&self.mux, &outcome.asset_id, subtitle_tracks).await;
            tracker.advance(UploadPhase::Ready)?;
            Some(report)
        };

        info!(
            upload_id = %upload.id,
            asset_id = %outcome.asset_id,
            playback_id = %outcome.playback_id,
            "Upload workflow complete"
        );

        Ok(WorkflowOutcome {
            phase: tracker.phase(),
            fingerprint,
            duplicate: None,
            upload_id: Some(upload.id),
            asset_id: Some(outcome.asset_id),
            playback_id: Some(outcome.playback_id),
            transfer_method: Some(transfer_method),
            subtitle_sync,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::SubtitleSyncStatus;
    use kstream_firestore::MemoryStore;
    use kstream_mux::{mock, MuxConfig, MUX_API_BASE};
    use std::time::Duration;

    fn mock_workflow() -> UploadWorkflow {
        let mux = MuxClient::new(MuxConfig {
            token_id: None,
            token_secret: None,
            base_url: MUX_API_BASE.to_string(),
            cors_origin: "*".into(),
            timeout: Duration::from_secs(5),
        })
        .unwrap();
        UploadWorkflow::new(
            mux,
            TransferConfig::default(),
            PollConfig {
                interval: Duration::from_millis(5),
                timeout: Duration::from_millis(500),
            },
        )
    }

    fn noop_progress() -> ProgressFn {
        Arc::new(|_| {})
    }

    #[test]
    fn test_phase_transitions() {
        use UploadPhase::*;
        assert!(Idle.can_transition(Hashing));
        assert!(CheckingDedup.can_transition(Ready));
        assert!(Polling.can_transition(Error));
        assert!(!Ready.can_transition(Error));
        assert!(!Hashing.can_transition(Uploading));
        assert!(!Ready.can_transition(Idle));
    }

    #[test]
    fn test_gating_predicates() {
        assert!(!UploadPhase::Polling.video_ready());
        assert!(UploadPhase::SyncingSubtitles.video_ready());
        assert!(UploadPhase::Resolving.subtitles_ready());
        assert!(!UploadPhase::Uploading.subtitles_ready());
        assert!(UploadPhase::Ready.can_save());
        assert!(!UploadPhase::SyncingSubtitles.can_save());
    }

    #[test]
    fn test_tracker_rejects_illegal_jump() {
        let mut tracker = PhaseTracker::new();
        tracker.advance(UploadPhase::Hashing).unwrap();
        let err = tracker.advance(UploadPhase::Polling).unwrap_err();
        assert!(matches!(err, UploadError::InvalidTransition { .. }));
        // Phase is unchanged after a rejected transition.
        assert_eq!(tracker.phase(), UploadPhase::Hashing);
    }

    #[tokio::test]
    async fn test_mock_end_to_end() {
        let store = MemoryStore::new();
        let workflow = mock_workflow();
        let tracks = vec![SubtitleTrack {
            lang: "en".into(),
            label: "English".into(),
            url: "https://cdn.example.com/en.vtt".into(),
        }];

        let outcome = workflow
            .run(&store, b"video bytes".to_vec(), &tracks, noop_progress())
            .await
            .unwrap();

        assert_eq!(outcome.phase, UploadPhase::Ready);
        assert_eq!(outcome.playback_id.as_deref(), Some(mock::PLAYBACK_ID));
        assert_eq!(outcome.asset_id.as_deref(), Some(mock::ASSET_ID));
        assert_eq!(outcome.transfer_method, Some(TransferMethod::Mock));
        let sync = outcome.subtitle_sync.unwrap();
        assert_eq!(sync.status, SubtitleSyncStatus::Done);
        assert!(sync.results[0].ok);
    }

    #[tokio::test]
    async fn test_duplicate_short_circuits_upload() {
        let store = MemoryStore::new();
        let payload = b"already uploaded bytes".to_vec();
        let fp = fingerprint_bytes(&payload);

        let mut existing: kstream_models::Movie = serde_json::from_value(serde_json::json!({
            "title": "Existing",
            "description": "Uploaded some time ago.",
            "category": "Action",
        }))
        .unwrap();
        existing.set_playback_id("pb_existing");
        existing.file_hash = Some(fp.clone());
        store.create_movie(&existing).await.unwrap();

        let workflow = mock_workflow();
        let outcome = workflow
            .run(&store, payload, &[], noop_progress())
            .await
            .unwrap();

        assert_eq!(outcome.phase, UploadPhase::Ready);
        assert!(outcome.duplicate.is_some());
        assert_eq!(outcome.playback_id.as_deref(), Some("pb_existing"));
        assert!(outcome.upload_id.is_none());
    }
}
