//! Audit log handlers. The trail is append-only; this surface only reads.

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::Value;

use kstream_models::AdminRole;

use crate::auth::SessionUser;
use crate::error::ApiResult;
use crate::handlers::data;
use crate::state::AppState;

const DEFAULT_LIMIT: usize = 50;
const MAX_LIMIT: usize = 200;

#[derive(Debug, Default, Deserialize)]
pub struct LogsQuery {
    #[serde(default)]
    pub limit: Option<usize>,
}

/// List the most recent audit entries, newest first.
pub async fn list_audit_logs(
    State(state): State<AppState>,
    user: SessionUser,
    Query(query): Query<LogsQuery>,
) -> ApiResult<Json<Value>> {
    user.require(AdminRole::Admin)?;

    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let entries = state.audit.list_recent(limit).await?;
    Ok(data(entries))
}
