//! Upload workflow errors.

use thiserror::Error;

/// Result type for upload operations.
pub type UploadResult<T> = Result<T, UploadError>;

/// Errors raised while moving a file through the upload workflow.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Fingerprinting failed: {0}")]
    Fingerprint(String),

    #[error("Transfer failed after all fallbacks: {0}")]
    TransferFailed(String),

    #[error("Upload slot errored at the video host: {0}")]
    UploadErrored(String),

    #[error("Timed out waiting for the video host after {0}s")]
    PollTimeout(u64),

    #[error("No playback id could be resolved")]
    Unresolvable,

    #[error("Invalid state transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Video host error: {0}")]
    Mux(#[from] kstream_mux::MuxError),

    #[error("Document store error: {0}")]
    Firestore(#[from] kstream_firestore::FirestoreError),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
