//! Series CRUD handlers, including nested episode operations.

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use serde_json::{json, Value};
use tracing::info;

use kstream_models::{
    validate_episode, validate_series, AdminRole, AuditAction, AuditLogEntry, Episode, Series,
};

use crate::auth::SessionUser;
use crate::error::{ApiError, ApiResult};
use crate::handlers::data;
use crate::handlers::movies::ContentFilter;
use crate::state::AppState;

async fn load_series(state: &AppState, id: &str) -> ApiResult<Series> {
    state
        .content
        .get_series(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Series {id} not found")))
}

/// List series, newest first, optionally filtered.
pub async fn list_series(
    State(state): State<AppState>,
    user: SessionUser,
    Query(filter): Query<ContentFilter>,
) -> ApiResult<Json<Value>> {
    user.require(AdminRole::Editor)?;

    let mut series = state.content.list_series().await?;
    series.retain(|s| filter.matches(&s.title, &s.category));
    series.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    Ok(data(series))
}

/// Fetch one series with its episodes.
pub async fn get_series(
    State(state): State<AppState>,
    user: SessionUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    user.require(AdminRole::Editor)?;
    let series = load_series(&state, &id).await?;
    Ok(data(series))
}

/// Create a series. Requires at least one valid episode.
pub async fn create_series(
    State(state): State<AppState>,
    user: SessionUser,
    Json(mut series): Json<Series>,
) -> ApiResult<Json<Value>> {
    user.require(AdminRole::Editor)?;

    series.created_at = Utc::now();
    series.created_by = Some(user.actor());
    series.normalize();

    let outcome = validate_series(&series);
    if !outcome.is_valid() {
        return Err(ApiError::Validation(outcome.into_errors()));
    }

    let id = state.content.create_series(&series).await?;
    series.id = id.clone();

    state
        .record_audit(
            AuditLogEntry::new(AuditAction::Create, "series", &id, user.actor())
                .with_summary(format!("Created series \"{}\"", series.title)),
        )
        .await;

    info!(series_id = %id, episodes = series.episodes.len(), "Series created");
    Ok(data(json!({ "id": id, "series": series })))
}

/// Update a series (read-modify-write, last write wins).
pub async fn update_series(
    State(state): State<AppState>,
    user: SessionUser,
    Path(id): Path<String>,
    Json(mut series): Json<Series>,
) -> ApiResult<Json<Value>> {
    user.require(AdminRole::Editor)?;

    let existing = load_series(&state, &id).await?;

    series.id = id.clone();
    series.created_at = existing.created_at;
    if series.created_by.is_none() {
        series.created_by = existing.created_by;
    }
    series.normalize();

    let outcome = validate_series(&series);
    if !outcome.is_valid() {
        return Err(ApiError::Validation(outcome.into_errors()));
    }

    state.content.update_series(&id, &series).await?;

    state
        .record_audit(
            AuditLogEntry::new(AuditAction::Update, "series", &id, user.actor())
                .with_summary(format!("Updated series \"{}\"", series.title)),
        )
        .await;

    Ok(data(series))
}

/// Delete a series and best-effort clean up every episode's video asset.
pub async fn delete_series(
    State(state): State<AppState>,
    user: SessionUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    user.require(AdminRole::Admin)?;

    let existing = load_series(&state, &id).await?;

    state.content.delete_series(&id).await?;

    for episode in &existing.episodes {
        state
            .cleanup_asset(
                episode.mux_asset_id.as_deref(),
                episode.mux_playback_id.as_deref(),
                episode.mux_video_id.as_deref(),
            )
            .await;
    }

    state
        .record_audit(
            AuditLogEntry::new(AuditAction::Delete, "series", &id, user.actor())
                .with_summary(format!("Deleted series \"{}\"", existing.title)),
        )
        .await;

    info!(series_id = %id, "Series deleted");
    Ok(data(json!({ "deleted": true })))
}

/// Append an episode to a series.
pub async fn add_episode(
    State(state): State<AppState>,
    user: SessionUser,
    Path(series_id): Path<String>,
    Json(mut episode): Json<Episode>,
) -> ApiResult<Json<Value>> {
    user.require(AdminRole::Editor)?;

    let mut series = load_series(&state, &series_id).await?;

    episode.created_at = Utc::now();
    episode.attach_defaults();

    let outcome = validate_episode(&episode);
    if !outcome.is_valid() {
        return Err(ApiError::Validation(outcome.into_errors()));
    }

    let episode_id = episode.episode_id.clone();
    series.episodes.push(episode.clone());
    series.updated_at = Utc::now();
    state.content.update_series(&series_id, &series).await?;

    state
        .record_audit(
            AuditLogEntry::new(AuditAction::Update, "series", &series_id, user.actor())
                .with_summary(format!(
                    "Added episode {} \"{}\"",
                    episode.ep_number, episode.title
                )),
        )
        .await;

    Ok(data(json!({ "episodeId": episode_id, "episode": episode })))
}

/// Replace an episode's fields.
pub async fn update_episode(
    State(state): State<AppState>,
    user: SessionUser,
    Path((series_id, episode_id)): Path<(String, String)>,
    Json(mut episode): Json<Episode>,
) -> ApiResult<Json<Value>> {
    user.require(AdminRole::Editor)?;

    let mut series = load_series(&state, &series_id).await?;

    let existing = series.episode(&episode_id).cloned().ok_or_else(|| {
        ApiError::not_found(format!("Episode {episode_id} not found in series {series_id}"))
    })?;

    episode.episode_id = episode_id.clone();
    episode.created_at = existing.created_at;
    episode.attach_defaults();

    let outcome = validate_episode(&episode);
    if !outcome.is_valid() {
        return Err(ApiError::Validation(outcome.into_errors()));
    }

    if let Some(slot) = series.episode_mut(&episode_id) {
        *slot = episode.clone();
    }
    series.updated_at = Utc::now();
    state.content.update_series(&series_id, &series).await?;

    state
        .record_audit(
            AuditLogEntry::new(AuditAction::Update, "series", &series_id, user.actor())
                .with_summary(format!(
                    "Updated episode {} \"{}\"",
                    episode.ep_number, episode.title
                )),
        )
        .await;

    Ok(data(episode))
}

/// Remove an episode and best-effort clean up its video asset.
pub async fn delete_episode(
    State(state): State<AppState>,
    user: SessionUser,
    Path((series_id, episode_id)): Path<(String, String)>,
) -> ApiResult<Json<Value>> {
    user.require(AdminRole::Admin)?;

    let mut series = load_series(&state, &series_id).await?;

    let removed = series.episode(&episode_id).cloned().ok_or_else(|| {
        ApiError::not_found(format!("Episode {episode_id} not found in series {series_id}"))
    })?;

    series.episodes.retain(|e| e.episode_id != episode_id);
    series.updated_at = Utc::now();
    state.content.update_series(&series_id, &series).await?;

    state
        .cleanup_asset(
            removed.mux_asset_id.as_deref(),
            removed.mux_playback_id.as_deref(),
            removed.mux_video_id.as_deref(),
        )
        .await;

    state
        .record_audit(
            AuditLogEntry::new(AuditAction::Update, "series", &series_id, user.actor())
                .with_summary(format!(
                    "Deleted episode {} \"{}\"",
                    removed.ep_number, removed.title
                )),
        )
        .await;

    Ok(data(json!({ "deleted": true })))
}
