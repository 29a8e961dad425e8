//! Upload orchestration for the KStream admin backend.
//!
//! Moves a source file through fingerprinting, duplicate detection, byte
//! transfer to the video host, ingest polling, asset resolution and subtitle
//! sync. Mock mode (no host credentials) exercises the same workflow with
//! deterministic fixtures.

pub mod dedup;
pub mod error;
pub mod fingerprint;
pub mod pipeline;
pub mod poller;
pub mod resolver;
pub mod subtitles;
pub mod transfer;
pub mod workflow;

pub use dedup::{find_duplicate, DuplicateMatch};
pub use error::{UploadError, UploadResult};
pub use fingerprint::{
    degenerate_fingerprint, fingerprint_bytes, fingerprint_file, FULL_HASH_LIMIT, SAMPLE_WINDOW,
};
pub use pipeline::{
    sync_tracks, upload_subtitle_file, SubtitleSyncStatus, SubtitleUploadReport,
    SubtitleUploadStatus, SyncReport, TrackSyncResult,
};
pub use poller::{poll_until_ready, PollConfig, PollOutcome, POLL_INTERVAL, POLL_TIMEOUT};
pub use resolver::resolve_asset_id;
pub use subtitles::{convert_srt_to_vtt, is_vtt};
pub use transfer::{transfer, ProgressFn, TransferConfig, TransferMethod};
pub use workflow::{PhaseTracker, UploadPhase, UploadWorkflow, WorkflowOutcome};
