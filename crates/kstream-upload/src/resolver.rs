//! Asset id resolution from stored record fields.
//!
//! Historical records store a mix of asset ids, playback ids and full
//! streaming URLs in their video fields. The resolver walks the candidate
//! fields in priority order and turns the first usable one into an asset id,
//! spending at most one network call per candidate.

use tracing::{debug, warn};

use kstream_mux::MuxClient;

use crate::error::UploadResult;

/// Minimum length at which an alphanumeric identifier is assumed to already
/// be an asset id. Host asset ids are long opaque tokens; playback ids are
/// shorter.
const ASSET_ID_MIN_LEN: usize = 40;

/// Candidate identifiers in resolution priority order: explicit asset id
/// first, then the playback fields.
pub fn candidates<'a>(
    asset_id: Option<&'a str>,
    playback_id: Option<&'a str>,
    legacy_video_id: Option<&'a str>,
) -> Vec<&'a str> {
    let mut out = Vec::new();
    for candidate in [asset_id, playback_id, legacy_video_id].into_iter().flatten() {
        let trimmed = candidate.trim();
        if !trimmed.is_empty() && !out.contains(&trimmed) {
            out.push(trimmed);
        }
    }
    out
}

/// Normalize a stored identifier: strip streaming URL scaffolding so only
/// the bare id remains.
pub fn normalize_candidate(raw: &str) -> String {
    let mut id = raw.trim();
    for prefix in [
        "https://stream.mux.com/",
        "http://stream.mux.com/",
        "https://image.mux.com/",
    ] {
        if let Some(rest) = id.strip_prefix(prefix) {
            id = rest;
        }
    }
    // Streaming URLs carry an extension and sometimes query params.
    let id = id.split(['?', '#']).next().unwrap_or(id);
    let id = id.strip_suffix(".m3u8").unwrap_or(id);
    id.to_string()
}

/// True when the identifier is shaped like an asset id rather than a
/// playback id.
pub fn looks_like_asset_id(id: &str) -> bool {
    id.len() >= ASSET_ID_MIN_LEN && id.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Resolve an asset id from the record's stored fields.
///
/// Asset-shaped candidates are returned without a network call. Playback-
/// shaped candidates cost one lookup each. Returns `None` when no candidate
/// resolves; lookup errors fail the resolution rather than being skipped,
/// so a flaky network never deletes the wrong asset upstream.
pub async fn resolve_asset_id(
    mux: &MuxClient,
    asset_id: Option<&str>,
    playback_id: Option<&str>,
    legacy_video_id: Option<&str>,
) -> UploadResult<Option<String>> {
    for raw in candidates(asset_id, playback_id, legacy_video_id) {
        let id = normalize_candidate(raw);
        if id.is_empty() {
            continue;
        }

        if looks_like_asset_id(&id) {
            debug!(candidate = %id, "Candidate is asset-shaped, no lookup needed");
            return Ok(Some(id));
        }

        match mux.resolve_playback_id(&id).await? {
            Some(resolved) => {
                debug!(candidate = %id, asset_id = %resolved, "Resolved playback id");
                return Ok(Some(resolved));
            }
            None => {
                warn!(candidate = %id, "Playback id unknown to the video host");
            }
        }
    }

    Ok(None)
}
