//! Dashboard notification handlers.

use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

use kstream_models::{AdminRole, Notification};

use crate::auth::SessionUser;
use crate::error::{ApiError, ApiResult};
use crate::handlers::data;
use crate::state::AppState;

/// List notifications, newest first.
pub async fn list_notifications(
    State(state): State<AppState>,
    user: SessionUser,
) -> ApiResult<Json<Value>> {
    user.require(AdminRole::Editor)?;
    let notifications = state.admin.list_notifications().await?;
    Ok(data(notifications))
}

#[derive(Debug, Deserialize)]
pub struct CreateNotificationRequest {
    pub title: String,
    #[serde(default)]
    pub body: String,
}

/// Push a notification to the dashboard.
pub async fn create_notification(
    State(state): State<AppState>,
    user: SessionUser,
    Json(request): Json<CreateNotificationRequest>,
) -> ApiResult<Json<Value>> {
    user.require(AdminRole::Admin)?;

    if request.title.trim().is_empty() {
        return Err(ApiError::bad_request("Notification title is required"));
    }

    let notification = Notification {
        id: String::new(),
        title: request.title,
        body: request.body,
        read: false,
        created_at: Utc::now(),
    };
    let id = state.admin.push_notification(&notification).await?;

    Ok(data(json!({ "id": id })))
}

/// Mark a notification as read.
pub async fn mark_notification_read(
    State(state): State<AppState>,
    user: SessionUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    user.require(AdminRole::Editor)?;
    state.admin.mark_notification_read(&id).await?;
    Ok(data(json!({ "read": true })))
}
