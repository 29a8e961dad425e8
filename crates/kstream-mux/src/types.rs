//! Video host API wire types.
//!
//! The host wraps every response body in a `{ "data": ... }` envelope.

use serde::{Deserialize, Serialize};

/// Response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
}

/// A direct upload slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectUpload {
    pub id: String,
    /// Signed URL the browser PUTs the file to.
    #[serde(default)]
    pub url: Option<String>,
    /// "waiting", "asset_created", "errored", "cancelled", "timed_out"
    pub status: String,
    #[serde(default)]
    pub asset_id: Option<String>,
    #[serde(default)]
    pub error: Option<UploadError>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadError {
    #[serde(default)]
    pub message: Option<String>,
}

impl DirectUpload {
    pub fn is_asset_created(&self) -> bool {
        self.status == "asset_created" && self.asset_id.is_some()
    }

    pub fn is_errored(&self) -> bool {
        matches!(self.status.as_str(), "errored" | "cancelled" | "timed_out")
    }
}

/// Request body for creating a direct upload.
#[derive(Debug, Clone, Serialize)]
pub struct CreateDirectUploadRequest {
    pub cors_origin: String,
    pub new_asset_settings: NewAssetSettings,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewAssetSettings {
    pub playback_policy: Vec<String>,
}

/// A video asset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    pub id: String,
    /// "preparing", "ready", "errored"
    pub status: String,
    #[serde(default)]
    pub playback_ids: Vec<PlaybackId>,
    #[serde(default)]
    pub duration: Option<f64>,
}

impl Asset {
    pub fn is_ready(&self) -> bool {
        self.status == "ready"
    }

    /// First public playback id, if the asset has one.
    pub fn playback_id(&self) -> Option<&str> {
        self.playback_ids.first().map(|p| p.id.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackId {
    pub id: String,
    #[serde(default)]
    pub policy: Option<String>,
}

/// Resolution of a playback id back to the object that owns it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackIdResolution {
    pub id: String,
    pub object: PlaybackIdObject,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackIdObject {
    pub id: String,
    /// "asset" or "live_stream"
    #[serde(rename = "type")]
    pub kind: String,
}

/// Request body for registering a text track on an asset.
#[derive(Debug, Clone, Serialize)]
pub struct CreateTextTrackRequest {
    pub url: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub text_type: String,
    pub language_code: String,
    pub name: String,
}

impl CreateTextTrackRequest {
    /// Subtitle track pointing at a public VTT URL.
    pub fn subtitles(url: impl Into<String>, lang: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            kind: "text".to_string(),
            text_type: "subtitles".to_string(),
            language_code: lang.into(),
            name: name.into(),
        }
    }
}

/// A registered text track.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextTrack {
    pub id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub language_code: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_round_trip() {
        let json = r#"{"data":{"id":"up1","status":"waiting","url":"https://host/put"}}"#;
        let envelope: Envelope<DirectUpload> = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.data.id, "up1");
        assert!(!envelope.data.is_asset_created());
    }

    #[test]
    fn test_asset_created_requires_asset_id() {
        let upload = DirectUpload {
            id: "up1".into(),
            url: None,
            status: "asset_created".into(),
            asset_id: None,
            error: None,
        };
        assert!(!upload.is_asset_created());
    }

    #[test]
    fn test_text_track_request_shape() {
        let req = CreateTextTrackRequest::subtitles("https://cdn/en.vtt", "en", "English");
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["type"], "text");
        assert_eq!(json["text_type"], "subtitles");
        assert_eq!(json["language_code"], "en");
    }
}
