//! Platform settings handlers.

use axum::extract::State;
use axum::Json;
use serde_json::Value;

use kstream_models::{AdminRole, AuditAction, AuditLogEntry};

use crate::auth::SessionUser;
use crate::error::{ApiError, ApiResult};
use crate::handlers::data;
use crate::state::AppState;

/// Settings payloads are small key-value maps; anything bigger is a bug.
const MAX_SETTINGS_BYTES: usize = 10_000;

/// Fetch the global settings document.
pub async fn get_settings(
    State(state): State<AppState>,
    user: SessionUser,
) -> ApiResult<Json<Value>> {
    user.require(AdminRole::Admin)?;
    let settings = state.admin.get_settings().await?;
    Ok(data(settings))
}

/// Merge a patch into the global settings document.
pub async fn update_settings(
    State(state): State<AppState>,
    user: SessionUser,
    Json(patch): Json<Value>,
) -> ApiResult<Json<Value>> {
    user.require(AdminRole::Admin)?;

    if !patch.is_object() {
        return Err(ApiError::bad_request("Settings patch must be an object"));
    }
    let size = serde_json::to_string(&patch).map(|s| s.len()).unwrap_or(0);
    if size > MAX_SETTINGS_BYTES {
        return Err(ApiError::bad_request("Settings payload too large"));
    }

    let updated = state.admin.update_settings(patch).await?;

    state
        .record_audit(
            AuditLogEntry::new(AuditAction::Update, "kstream-settings", "global", user.actor())
                .with_summary("Updated platform settings"),
        )
        .await;

    Ok(data(updated))
}
