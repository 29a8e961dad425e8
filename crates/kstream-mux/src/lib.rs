//! Video host (Mux) API client.
//!
//! Direct uploads, asset lookups, playback-id resolution and text track
//! registration, with a deterministic mock mode for running without
//! credentials.

pub mod client;
pub mod error;
pub mod types;

pub use client::{mock, MuxClient, MuxConfig, MuxMode, MUX_API_BASE};
pub use error::{MuxError, MuxResult};
pub use types::{
    Asset, CreateTextTrackRequest, DirectUpload, Envelope, PlaybackId, PlaybackIdResolution,
    TextTrack,
};
