//! S3-compatible blob storage for the KStream admin backend.
//!
//! Subtitle tracks converted to VTT and dashboard-uploaded artwork are stored
//! here; everything video goes to the video host instead.

pub mod client;
pub mod error;
pub mod operations;

pub use client::{BlobClient, BlobConfig};
pub use error::{StorageError, StorageResult};
pub use operations::{image_key, subtitle_key};
