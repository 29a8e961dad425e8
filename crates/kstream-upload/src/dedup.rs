//! Duplicate-upload detection.
//!
//! Lookup order: movies first (indexed query), then a full scan of series
//! episodes. Lookup failures are swallowed; a broken dedup index must never
//! block an upload, the worst case is re-uploading a file the host already
//! has.

use tracing::warn;

use kstream_firestore::ContentStore;
use kstream_models::{Episode, Fingerprint, Movie, Series};

/// An existing record that matches an upload fingerprint.
#[derive(Debug, Clone)]
pub enum DuplicateMatch {
    Movie(Movie),
    Episode { series: Series, episode: Episode },
}

impl DuplicateMatch {
    /// Playback id of the matched record, when it has one.
    pub fn playback_id(&self) -> Option<&str> {
        match self {
            DuplicateMatch::Movie(movie) => movie.playback_id(),
            DuplicateMatch::Episode { episode, .. } => episode.playback_id(),
        }
    }

    /// Human-readable label for dashboard messaging.
    pub fn describe(&self) -> String {
        match self {
            DuplicateMatch::Movie(movie) => format!("movie \"{}\"", movie.title),
            DuplicateMatch::Episode { series, episode } => format!(
                "episode {} of \"{}\"",
                episode.ep_number, series.title
            ),
        }
    }
}

/// Look up an existing record with the same fingerprint. Returns `None` on
/// miss and on lookup error.
pub async fn find_duplicate(
    store: &dyn ContentStore,
    fingerprint: &Fingerprint,
) -> Option<DuplicateMatch> {
    match store.find_movie_by_fingerprint(fingerprint).await {
        Ok(Some(movie)) => return Some(DuplicateMatch::Movie(movie)),
        Ok(None) => {}
        Err(e) => {
            warn!("Movie dedup lookup failed, continuing without: {}", e);
            return None;
        }
    }

    match store.find_episode_by_fingerprint(fingerprint).await {
        Ok(Some((series, episode))) => Some(DuplicateMatch::Episode { series, episode }),
        Ok(None) => None,
        Err(e) => {
            warn!("Episode dedup scan failed, continuing without: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kstream_firestore::MemoryStore;

    fn movie_with_hash(fp: Fingerprint) -> Movie {
        let mut m: Movie = serde_json::from_value(serde_json::json!({
            "title": "Already Here",
            "description": "This movie exists in the catalog.",
            "category": "Drama",
        }))
        .unwrap();
        m.set_playback_id("pb_existing");
        m.file_hash = Some(fp);
        m
    }

    #[tokio::test]
    async fn test_movie_match_wins_over_episode_scan() {
        let store = MemoryStore::new();
        let fp = Fingerprint::new("duphash", 100);
        store.create_movie(&movie_with_hash(fp.clone())).await.unwrap();

        let hit = find_duplicate(&store, &fp).await.unwrap();
        match hit {
            DuplicateMatch::Movie(m) => assert_eq!(m.playback_id(), Some("pb_existing")),
            other => panic!("expected movie match, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_miss_returns_none() {
        let store = MemoryStore::new();
        let hit = find_duplicate(&store, &Fingerprint::new("unknown", 1)).await;
        assert!(hit.is_none());
    }
}
