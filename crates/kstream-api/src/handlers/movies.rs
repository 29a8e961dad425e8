//! Movie CRUD handlers.

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use kstream_models::{validate_movie, AdminRole, AuditAction, AuditLogEntry, Movie};

use crate::auth::SessionUser;
use crate::error::{ApiError, ApiResult};
use crate::handlers::data;
use crate::state::AppState;

/// Search/category filter on list endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct ContentFilter {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

impl ContentFilter {
    pub fn matches(&self, title: &str, category: &str) -> bool {
        if let Some(wanted) = self.category.as_deref() {
            if !wanted.is_empty() && !category.eq_ignore_ascii_case(wanted) {
                return false;
            }
        }
        if let Some(needle) = self.search.as_deref() {
            let needle = needle.trim().to_lowercase();
            if !needle.is_empty() && !title.to_lowercase().contains(&needle) {
                return false;
            }
        }
        true
    }
}

/// List movies, newest first, optionally filtered.
pub async fn list_movies(
    State(state): State<AppState>,
    user: SessionUser,
    Query(filter): Query<ContentFilter>,
) -> ApiResult<Json<Value>> {
    user.require(AdminRole::Editor)?;

    let mut movies = state.content.list_movies().await?;
    movies.retain(|m| filter.matches(&m.title, &m.category));
    movies.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    Ok(data(movies))
}

/// Fetch one movie.
pub async fn get_movie(
    State(state): State<AppState>,
    user: SessionUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    user.require(AdminRole::Editor)?;

    let movie = state
        .content
        .get_movie(&id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Movie {id} not found")))?;
    Ok(data(movie))
}

/// Create a movie.
pub async fn create_movie(
    State(state): State<AppState>,
    user: SessionUser,
    Json(mut movie): Json<Movie>,
) -> ApiResult<Json<Value>> {
    user.require(AdminRole::Editor)?;

    movie.created_at = Utc::now();
    movie.created_by = Some(user.actor());
    movie.normalize();

    let outcome = validate_movie(&movie);
    if !outcome.is_valid() {
        return Err(ApiError::Validation(outcome.into_errors()));
    }

    let id = state.content.create_movie(&movie).await?;
    movie.id = id.clone();

    state
        .record_audit(
            AuditLogEntry::new(AuditAction::Create, "movies", &id, user.actor())
                .with_summary(format!("Created movie \"{}\"", movie.title)),
        )
        .await;

    info!(movie_id = %id, "Movie created");
    Ok(data(json!({ "id": id, "movie": movie })))
}

/// Update a movie (read-modify-write, last write wins).
pub async fn update_movie(
    State(state): State<AppState>,
    user: SessionUser,
    Path(id): Path<String>,
    Json(mut movie): Json<Movie>,
) -> ApiResult<Json<Value>> {
    user.require(AdminRole::Editor)?;

    let existing = state
        .content
        .get_movie(&id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Movie {id} not found")))?;

    movie.id = id.clone();
    movie.created_at = existing.created_at;
    if movie.created_by.is_none() {
        movie.created_by = existing.created_by;
    }
    movie.normalize();

    let outcome = validate_movie(&movie);
    if !outcome.is_valid() {
        return Err(ApiError::Validation(outcome.into_errors()));
    }

    state.content.update_movie(&id, &movie).await?;

    state
        .record_audit(
            AuditLogEntry::new(AuditAction::Update, "movies", &id, user.actor())
                .with_summary(format!("Updated movie \"{}\"", movie.title)),
        )
        .await;

    Ok(data(movie))
}

/// Delete a movie and best-effort clean up its backing video asset.
pub async fn delete_movie(
    State(state): State<AppState>,
    user: SessionUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    user.require(AdminRole::Admin)?;

    let existing = state
        .content
        .get_movie(&id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Movie {id} not found")))?;

    state.content.delete_movie(&id).await?;

    state
        .cleanup_asset(
            existing.mux_asset_id.as_deref(),
            existing.mux_playback_id.as_deref(),
            existing.mux_video_id.as_deref(),
        )
        .await;

    state
        .record_audit(
            AuditLogEntry::new(AuditAction::Delete, "movies", &id, user.actor())
                .with_summary(format!("Deleted movie \"{}\"", existing.title)),
        )
        .await;

    info!(movie_id = %id, "Movie deleted");
    Ok(data(json!({ "deleted": true })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_matches_category_case_insensitive() {
        let filter = ContentFilter {
            search: None,
            category: Some("drama".into()),
        };
        assert!(filter.matches("Anything", "Drama"));
        assert!(!filter.matches("Anything", "Action"));
    }

    #[test]
    fn test_filter_search_is_substring() {
        let filter = ContentFilter {
            search: Some("night".into()),
            category: None,
        };
        assert!(filter.matches("A Knight at Nightfall", "Drama"));
        assert!(!filter.matches("Morning Show", "Drama"));
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let filter = ContentFilter::default();
        assert!(filter.matches("Whatever", "Horror"));
    }
}
