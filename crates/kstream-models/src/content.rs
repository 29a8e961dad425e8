//! Content record models: movies, series and their episodes.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::fingerprint::Fingerprint;

/// Allowed content categories.
pub const CONTENT_CATEGORIES: &[&str] = &[
    "Action",
    "Adventure",
    "Animation",
    "Comedy",
    "Documentary",
    "Drama",
    "Fantasy",
    "Horror",
    "Kids",
    "Mystery",
    "Romance",
    "Sci-Fi",
    "Thriller",
];

/// Kind of content record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Movie,
    Series,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Movie => "movie",
            ContentKind::Series => "series",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Reference to the admin who performed an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ActorRef {
    pub uid: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(rename = "displayName", default)]
    pub display_name: Option<String>,
}

/// Subtitle/caption track attached to a content record.
///
/// `url` must be an absolute http(s) URL before the track can be registered
/// with the video host; local references are filtered out at sync time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SubtitleTrack {
    pub lang: String,
    pub label: String,
    #[serde(default)]
    pub url: String,
}

impl SubtitleTrack {
    /// True when the track URL is publicly fetchable (http or https).
    pub fn has_public_url(&self) -> bool {
        is_public_url(&self.url)
    }
}

/// True for absolute http(s) URLs.
pub fn is_public_url(url: &str) -> bool {
    let lower = url.trim().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// A movie record as persisted in the document store.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Movie {
    #[serde(default)]
    pub id: String,

    #[serde(rename = "type", default = "movie_kind")]
    pub kind: ContentKind,

    pub title: String,
    pub description: String,
    pub category: String,

    /// Canonical video host asset identifier.
    #[serde(default)]
    pub mux_asset_id: Option<String>,

    /// Public playback identifier used to build streaming URLs.
    #[serde(default)]
    pub mux_playback_id: Option<String>,

    /// Deprecated alias of `mux_playback_id`, kept for older clients.
    /// Invariant: always equal to `mux_playback_id`.
    #[serde(default)]
    pub mux_video_id: Option<String>,

    /// Upload fingerprint of the source file, for de-duplication lookups.
    #[serde(rename = "fileHash", default)]
    pub file_hash: Option<Fingerprint>,

    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub trailer: Option<String>,

    #[serde(default)]
    pub subtitles: Vec<SubtitleTrack>,
    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(rename = "createdAt", default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt", default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
    #[serde(rename = "createdBy", default)]
    pub created_by: Option<ActorRef>,
}

fn movie_kind() -> ContentKind {
    ContentKind::Movie
}

fn series_kind() -> ContentKind {
    ContentKind::Series
}

impl Movie {
    /// Set the playback identifier, keeping the legacy mirror field in sync.
    pub fn set_playback_id(&mut self, playback_id: impl Into<String>) {
        let id = playback_id.into();
        self.mux_playback_id = Some(id.clone());
        self.mux_video_id = Some(id);
    }

    /// Effective playback identifier, falling back to the legacy field.
    pub fn playback_id(&self) -> Option<&str> {
        self.mux_playback_id
            .as_deref()
            .or(self.mux_video_id.as_deref())
            .filter(|s| !s.trim().is_empty())
    }

    /// Normalize derived fields before persistence: the legacy playback
    /// mirror, https thumbnails/trailers and the tag list.
    pub fn normalize(&mut self) {
        let playback = self.playback_id().map(str::to_string);
        self.mux_playback_id = playback.clone();
        self.mux_video_id = playback;
        self.thumbnail = self.thumbnail.take().map(|u| ensure_https(&u));
        self.trailer = self.trailer.take().map(|u| ensure_https(&u));
        self.tags = sanitize_tags(&self.tags);
        self.updated_at = Utc::now();
    }
}

/// One episode embedded in a series document.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Episode {
    #[serde(rename = "episodeId", default)]
    pub episode_id: String,
    #[serde(rename = "epNumber", default)]
    pub ep_number: u32,

    pub title: String,
    pub description: String,

    #[serde(default)]
    pub mux_asset_id: Option<String>,
    #[serde(default)]
    pub mux_playback_id: Option<String>,
    /// Deprecated alias of `mux_playback_id`. Always kept equal to it.
    #[serde(default)]
    pub mux_video_id: Option<String>,
    #[serde(default)]
    pub mux_upload_id: Option<String>,

    #[serde(rename = "fileHash", default)]
    pub file_hash: Option<Fingerprint>,

    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub trailer: Option<String>,
    #[serde(default)]
    pub subtitles: Vec<SubtitleTrack>,

    #[serde(rename = "createdAt", default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt", default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Episode {
    /// Set the playback identifier, keeping the legacy mirror field in sync.
    pub fn set_playback_id(&mut self, playback_id: impl Into<String>) {
        let id = playback_id.into();
        self.mux_playback_id = Some(id.clone());
        self.mux_video_id = Some(id);
    }

    /// Effective playback identifier, falling back to the legacy field.
    pub fn playback_id(&self) -> Option<&str> {
        self.mux_playback_id
            .as_deref()
            .or(self.mux_video_id.as_deref())
            .filter(|s| !s.trim().is_empty())
    }

    /// Fill in defaults for a newly attached episode.
    pub fn attach_defaults(&mut self) {
        if self.episode_id.is_empty() {
            self.episode_id = Uuid::new_v4().to_string();
        }
        let playback = self.playback_id().map(str::to_string);
        self.mux_playback_id = playback.clone();
        self.mux_video_id = playback;
        self.thumbnail = self.thumbnail.take().map(|u| ensure_https(&u));
        self.trailer = self.trailer.take().map(|u| ensure_https(&u));
        self.updated_at = Utc::now();
    }
}

/// A series record with its embedded episode array.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Series {
    #[serde(default)]
    pub id: String,

    #[serde(rename = "type", default = "series_kind")]
    pub kind: ContentKind,

    pub title: String,
    pub description: String,
    pub category: String,

    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub trailer: Option<String>,
    #[serde(default)]
    pub subtitles: Vec<SubtitleTrack>,
    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub episodes: Vec<Episode>,

    #[serde(rename = "createdAt", default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt", default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
    #[serde(rename = "createdBy", default)]
    pub created_by: Option<ActorRef>,
}

impl Series {
    /// Normalize derived fields before persistence.
    pub fn normalize(&mut self) {
        self.thumbnail = self.thumbnail.take().map(|u| ensure_https(&u));
        self.trailer = self.trailer.take().map(|u| ensure_https(&u));
        self.tags = sanitize_tags(&self.tags);
        for episode in &mut self.episodes {
            episode.attach_defaults();
        }
        self.updated_at = Utc::now();
    }

    pub fn episode(&self, episode_id: &str) -> Option<&Episode> {
        self.episodes.iter().find(|e| e.episode_id == episode_id)
    }

    pub fn episode_mut(&mut self, episode_id: &str) -> Option<&mut Episode> {
        self.episodes
            .iter_mut()
            .find(|e| e.episode_id == episode_id)
    }
}

/// Force an https scheme onto a URL, upgrading http and prefixing bare hosts.
pub fn ensure_https(url: &str) -> String {
    if url.is_empty() || url.starts_with("https://") {
        return url.to_string();
    }
    if let Some(rest) = url.strip_prefix("http://") {
        return format!("https://{rest}");
    }
    format!("https://{url}")
}

/// Trim, lowercase and de-duplicate a tag list, dropping empties.
pub fn sanitize_tags(raw: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(raw.len());
    for tag in raw {
        let cleaned = tag.trim().to_lowercase();
        if !cleaned.is_empty() && !out.contains(&cleaned) {
            out.push(cleaned);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_https() {
        assert_eq!(ensure_https("https://a.io/x"), "https://a.io/x");
        assert_eq!(ensure_https("http://a.io/x"), "https://a.io/x");
        assert_eq!(ensure_https("a.io/x"), "https://a.io/x");
        assert_eq!(ensure_https(""), "");
    }

    #[test]
    fn test_sanitize_tags_dedups_and_lowercases() {
        let tags = vec![
            " Drama ".to_string(),
            "drama".to_string(),
            "".to_string(),
            "Action".to_string(),
        ];
        assert_eq!(sanitize_tags(&tags), vec!["drama", "action"]);
    }

    #[test]
    fn test_playback_mirror_stays_in_sync() {
        let mut movie: Movie = serde_json::from_value(serde_json::json!({
            "title": "T",
            "description": "D",
            "category": "Action",
        }))
        .unwrap();

        movie.set_playback_id("pb_1");
        assert_eq!(movie.mux_playback_id.as_deref(), Some("pb_1"));
        assert_eq!(movie.mux_video_id.as_deref(), Some("pb_1"));

        // Legacy records carry only mux_video_id; normalize mirrors it back.
        movie.mux_playback_id = None;
        movie.normalize();
        assert_eq!(movie.mux_playback_id.as_deref(), Some("pb_1"));
        assert_eq!(movie.mux_video_id.as_deref(), Some("pb_1"));
    }

    #[test]
    fn test_subtitle_public_url() {
        let mut track = SubtitleTrack {
            lang: "en".into(),
            label: "English".into(),
            url: "file:///tmp/en.vtt".into(),
        };
        assert!(!track.has_public_url());
        track.url = "https://cdn.example.com/en.vtt".into();
        assert!(track.has_public_url());
    }

    #[test]
    fn test_episode_attach_defaults_generates_id() {
        let mut ep: Episode = serde_json::from_value(serde_json::json!({
            "epNumber": 1,
            "title": "Ep 1",
            "description": "First episode.",
            "mux_video_id": "legacy_pb",
        }))
        .unwrap();
        ep.attach_defaults();
        assert!(!ep.episode_id.is_empty());
        assert_eq!(ep.mux_playback_id.as_deref(), Some("legacy_pb"));
        assert_eq!(ep.mux_video_id.as_deref(), Some("legacy_pb"));
    }
}
