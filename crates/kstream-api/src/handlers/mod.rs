//! Route handlers.

pub mod host;
pub mod logs;
pub mod movies;
pub mod notifications;
pub mod series;
pub mod settings;
pub mod uploads;
pub mod users;

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};

use crate::state::AppState;

/// Wrap a successful payload in the `{ "data": ... }` envelope.
pub fn data(value: impl Serialize) -> Json<Value> {
    Json(json!({ "data": value }))
}

/// Liveness probe.
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Readiness probe, reporting which backends are live vs mock.
pub async fn ready(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ready",
        "videoHost": if state.mux.is_mock() { "mock" } else { "live" },
        "blobStorage": state.blob.is_some(),
        "auth": if state.auth.is_mock() { "mock" } else { "live" },
    }))
}
