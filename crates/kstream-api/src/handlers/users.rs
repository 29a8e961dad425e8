//! Platform user administration handlers.

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use kstream_models::{AdminRole, AuditAction, AuditLogEntry, UserPlan};

use crate::auth::SessionUser;
use crate::error::{ApiError, ApiResult};
use crate::handlers::data;
use crate::state::AppState;

/// List platform user accounts.
pub async fn list_users(
    State(state): State<AppState>,
    user: SessionUser,
) -> ApiResult<Json<Value>> {
    user.require(AdminRole::Admin)?;
    let users = state.admin.list_users().await?;
    Ok(data(users))
}

/// Fetch one platform user.
pub async fn get_user(
    State(state): State<AppState>,
    user: SessionUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    user.require(AdminRole::Admin)?;

    let account = state
        .admin
        .get_user(&id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("User {id} not found")))?;
    Ok(data(account))
}

#[derive(Debug, Deserialize)]
pub struct UpdatePlanRequest {
    pub plan: UserPlan,
}

/// Change a user's subscription plan. Super-admin only.
pub async fn update_user_plan(
    State(state): State<AppState>,
    user: SessionUser,
    Path(id): Path<String>,
    Json(request): Json<UpdatePlanRequest>,
) -> ApiResult<Json<Value>> {
    user.require(AdminRole::SuperAdmin)?;

    state.admin.set_user_plan(&id, request.plan).await?;

    state
        .record_audit(
            AuditLogEntry::new(AuditAction::Update, "users", &id, user.actor())
                .with_summary(format!("Changed plan to {}", request.plan.as_str())),
        )
        .await;

    info!(user_id = %id, plan = request.plan.as_str(), "User plan updated");
    Ok(data(json!({ "plan": request.plan })))
}

#[derive(Debug, Deserialize)]
pub struct UpdateDisabledRequest {
    pub disabled: bool,
}

/// Enable or disable a user account. Super-admin only.
pub async fn update_user_disabled(
    State(state): State<AppState>,
    user: SessionUser,
    Path(id): Path<String>,
    Json(request): Json<UpdateDisabledRequest>,
) -> ApiResult<Json<Value>> {
    user.require(AdminRole::SuperAdmin)?;

    state.admin.set_user_disabled(&id, request.disabled).await?;

    let verb = if request.disabled { "Disabled" } else { "Enabled" };
    state
        .record_audit(
            AuditLogEntry::new(AuditAction::Update, "users", &id, user.actor())
                .with_summary(format!("{verb} account")),
        )
        .await;

    Ok(data(json!({ "disabled": request.disabled })))
}
