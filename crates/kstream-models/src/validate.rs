//! Payload validation with field-level error reporting.
//!
//! Validation failures are returned as a flat map of field name to message so
//! the dashboard can render errors inline next to each form field. Episode
//! errors are keyed as `episodes[<index>].<field>`.

use serde_json::{Map, Value};

use crate::content::{Episode, Movie, Series, SubtitleTrack, CONTENT_CATEGORIES};

const TITLE_MIN: usize = 2;
const DESCRIPTION_MIN: usize = 10;

/// Result of validating a payload.
#[derive(Debug, Clone, Default)]
pub struct ValidationOutcome {
    errors: Map<String, Value>,
}

impl ValidationOutcome {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &Map<String, Value> {
        &self.errors
    }

    pub fn into_errors(self) -> Map<String, Value> {
        self.errors
    }

    fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors
            .entry(field.into())
            .or_insert_with(|| Value::String(message.into()));
    }

    fn merge_prefixed(&mut self, prefix: &str, other: ValidationOutcome) {
        for (field, message) in other.errors {
            self.errors.insert(format!("{prefix}.{field}"), message);
        }
    }
}

fn check_common(
    out: &mut ValidationOutcome,
    title: &str,
    description: &str,
    category: &str,
) {
    if title.trim().chars().count() < TITLE_MIN {
        out.add("title", format!("Title must be at least {TITLE_MIN} characters"));
    }
    if description.trim().chars().count() < DESCRIPTION_MIN {
        out.add(
            "description",
            format!("Description must be at least {DESCRIPTION_MIN} characters"),
        );
    }
    if !CONTENT_CATEGORIES.contains(&category) {
        out.add("category", "Category is not a recognized genre");
    }
}

/// Validate a movie payload before it is written.
pub fn validate_movie(movie: &Movie) -> ValidationOutcome {
    let mut out = ValidationOutcome::default();
    check_common(&mut out, &movie.title, &movie.description, &movie.category);

    if movie.playback_id().is_none() {
        out.add("mux_playback_id", "Playback ID is required");
    }

    out.merge_subtitles(&movie.subtitles);
    out
}

/// Validate a series payload, including every embedded episode.
pub fn validate_series(series: &Series) -> ValidationOutcome {
    let mut out = ValidationOutcome::default();
    check_common(&mut out, &series.title, &series.description, &series.category);

    if series.episodes.is_empty() {
        out.add("episodes", "A series needs at least one episode");
    }
    for (idx, episode) in series.episodes.iter().enumerate() {
        out.merge_prefixed(&format!("episodes[{idx}]"), validate_episode(episode));
    }

    out.merge_subtitles(&series.subtitles);
    out
}

/// Validate a single episode.
pub fn validate_episode(episode: &Episode) -> ValidationOutcome {
    let mut out = ValidationOutcome::default();

    if episode.ep_number == 0 {
        out.add("epNumber", "Episode number must be a positive integer");
    }
    if episode.title.trim().chars().count() < TITLE_MIN {
        out.add("title", format!("Title must be at least {TITLE_MIN} characters"));
    }
    if episode.description.trim().chars().count() < DESCRIPTION_MIN {
        out.add(
            "description",
            format!("Description must be at least {DESCRIPTION_MIN} characters"),
        );
    }
    if episode.playback_id().is_none() {
        out.add("mux_playback_id", "Playback ID is required");
    }

    out.merge_subtitles(&episode.subtitles);
    out
}

/// Validate a list of subtitle tracks: language, label and url must be
/// non-empty, languages must not repeat within the list.
pub fn validate_subtitles(tracks: &[SubtitleTrack]) -> ValidationOutcome {
    let mut out = ValidationOutcome::default();
    let mut seen: Vec<String> = Vec::new();

    for (idx, track) in tracks.iter().enumerate() {
        let lang = track.lang.trim().to_lowercase();
        if lang.is_empty() {
            out.add(format!("subtitles[{idx}].lang"), "Language code is required");
        } else if seen.contains(&lang) {
            out.add(
                format!("subtitles[{idx}].lang"),
                format!("Duplicate subtitle language '{lang}'"),
            );
        } else {
            seen.push(lang);
        }
        if track.label.trim().is_empty() {
            out.add(format!("subtitles[{idx}].label"), "Label is required");
        }
        if track.url.trim().is_empty() {
            out.add(format!("subtitles[{idx}].url"), "Subtitle URL is required");
        }
    }

    out
}

impl ValidationOutcome {
    fn merge_subtitles(&mut self, tracks: &[SubtitleTrack]) {
        for (field, message) in validate_subtitles(tracks).errors {
            self.errors.insert(field, message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_movie() -> Movie {
        serde_json::from_value(serde_json::json!({
            "title": "Inception",
            "description": "A mind-bending thriller about dreams.",
            "category": "Sci-Fi",
            "mux_playback_id": "pb123",
        }))
        .unwrap()
    }

    fn base_episode(ep_number: u32) -> Episode {
        serde_json::from_value(serde_json::json!({
            "epNumber": ep_number,
            "title": "Pilot",
            "description": "The one that starts it all.",
            "mux_playback_id": "pb_ep",
        }))
        .unwrap()
    }

    #[test]
    fn test_valid_movie_passes() {
        assert!(validate_movie(&base_movie()).is_valid());
    }

    #[test]
    fn test_short_title_and_description_rejected() {
        let mut movie = base_movie();
        movie.title = "X".into();
        movie.description = "too short".into();
        let out = validate_movie(&movie);
        assert!(!out.is_valid());
        assert!(out.errors().contains_key("title"));
        assert!(out.errors().contains_key("description"));
    }

    #[test]
    fn test_unknown_category_rejected() {
        let mut movie = base_movie();
        movie.category = "Western".into();
        let out = validate_movie(&movie);
        assert!(out.errors().contains_key("category"));
    }

    #[test]
    fn test_missing_playback_id_rejected() {
        let mut movie = base_movie();
        movie.mux_playback_id = None;
        movie.mux_video_id = None;
        let out = validate_movie(&movie);
        assert!(out.errors().contains_key("mux_playback_id"));
    }

    #[test]
    fn test_blank_playback_id_rejected() {
        let mut movie = base_movie();
        movie.mux_playback_id = Some("   ".into());
        movie.mux_video_id = Some("   ".into());
        let out = validate_movie(&movie);
        assert!(out.errors().contains_key("mux_playback_id"));
    }

    #[test]
    fn test_legacy_playback_field_accepted() {
        let mut movie = base_movie();
        movie.mux_playback_id = None;
        movie.mux_video_id = Some("legacy_pb".into());
        assert!(validate_movie(&movie).is_valid());
    }

    #[test]
    fn test_series_needs_an_episode() {
        let series: Series = serde_json::from_value(serde_json::json!({
            "title": "Dark Matter",
            "description": "Parallel universes collide in this drama.",
            "category": "Drama",
            "episodes": [],
        }))
        .unwrap();
        let out = validate_series(&series);
        assert!(out.errors().contains_key("episodes"));
    }

    #[test]
    fn test_episode_errors_are_indexed() {
        let mut series: Series = serde_json::from_value(serde_json::json!({
            "title": "Dark Matter",
            "description": "Parallel universes collide in this drama.",
            "category": "Drama",
        }))
        .unwrap();
        series.episodes.push(base_episode(1));
        series.episodes.push(base_episode(0));
        let out = validate_series(&series);
        assert!(!out.is_valid());
        assert!(out.errors().contains_key("episodes[1].epNumber"));
        assert!(!out.errors().contains_key("episodes[0].epNumber"));
    }

    #[test]
    fn test_episode_short_description_rejected() {
        let mut episode = base_episode(1);
        episode.description = "short".into();
        let out = validate_episode(&episode);
        assert!(out.errors().contains_key("description"));
    }

    #[test]
    fn test_duplicate_subtitle_language_rejected() {
        let tracks = vec![
            SubtitleTrack {
                lang: "en".into(),
                label: "English".into(),
                url: "https://cdn.example.com/en.vtt".into(),
            },
            SubtitleTrack {
                lang: "EN".into(),
                label: "English (SDH)".into(),
                url: "https://cdn.example.com/en-sdh.vtt".into(),
            },
        ];
        let out = validate_subtitles(&tracks);
        assert!(out.errors().contains_key("subtitles[1].lang"));
    }

    #[test]
    fn test_subtitle_without_url_rejected() {
        let tracks = vec![SubtitleTrack {
            lang: "en".into(),
            label: "English".into(),
            url: "  ".into(),
        }];
        let out = validate_subtitles(&tracks);
        assert!(out.errors().contains_key("subtitles[0].url"));
    }
}
