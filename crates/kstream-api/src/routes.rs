//! API routes.

use std::sync::Arc;

use axum::middleware;
use axum::routing::{delete, get, patch, post, put};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::limit::RequestBodyLimitLayer;

use crate::handlers::host::{
    create_upload_session, proxy_upload, resolve_asset, sync_text_tracks, upload_status,
};
use crate::handlers::logs::list_audit_logs;
use crate::handlers::movies::{create_movie, delete_movie, get_movie, list_movies, update_movie};
use crate::handlers::notifications::{
    create_notification, list_notifications, mark_notification_read,
};
use crate::handlers::series::{
    add_episode, create_series, delete_episode, delete_series, get_series, list_series,
    update_episode, update_series,
};
use crate::handlers::settings::{get_settings, update_settings};
use crate::handlers::uploads::{dedup_lookup, upload_image, upload_subtitle};
use crate::handlers::users::{get_user, list_users, update_user_disabled, update_user_plan};
use crate::handlers::{health, ready};
use crate::metrics::metrics_middleware;
use crate::middleware::{
    cors_layer, rate_limit_middleware, request_id, request_logging, security_headers,
    RateLimiterCache,
};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let content_routes = Router::new()
        .route("/movies", get(list_movies))
        .route("/movies", post(create_movie))
        .route("/movies/:id", get(get_movie))
        .route("/movies/:id", put(update_movie))
        .route("/movies/:id", delete(delete_movie))
        .route("/series", get(list_series))
        .route("/series", post(create_series))
        .route("/series/:id", get(get_series))
        .route("/series/:id", put(update_series))
        .route("/series/:id", delete(delete_series))
        .route("/series/:id/episodes", post(add_episode))
        .route("/series/:id/episodes/:episode_id", put(update_episode))
        .route("/series/:id/episodes/:episode_id", delete(delete_episode));

    // Video host plumbing for the dashboard upload flow.
    let host_routes = Router::new()
        .route("/upload-session", post(create_upload_session))
        .route("/upload-status", get(upload_status))
        .route("/resolve-asset", get(resolve_asset))
        .route("/text-tracks", post(sync_text_tracks))
        .route("/uploads/lookup", post(dedup_lookup))
        .route("/uploads/proxy", post(proxy_upload))
        .route("/uploads/subtitle", post(upload_subtitle))
        .route("/uploads/image", post(upload_image));

    let admin_routes = Router::new()
        .route("/settings", get(get_settings))
        .route("/settings", post(update_settings))
        .route("/notifications", get(list_notifications))
        .route("/notifications", post(create_notification))
        .route("/notifications/:id/read", post(mark_notification_read))
        .route("/users", get(list_users))
        .route("/users/:id", get(get_user))
        .route("/users/:id/plan", patch(update_user_plan))
        .route("/users/:id/disabled", patch(update_user_disabled))
        .route("/audit-logs", get(list_audit_logs));

    let rate_limiter = Arc::new(RateLimiterCache::new(state.config.rate_limit_rps));

    let api_routes = Router::new()
        .merge(content_routes)
        .merge(host_routes)
        .merge(admin_routes)
        .layer(middleware::from_fn_with_state(
            rate_limiter,
            rate_limit_middleware,
        ));

    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/ready", get(ready));

    let metrics_routes = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .merge(metrics_routes)
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(security_headers))
        .layer(middleware::from_fn(request_id))
        .layer(middleware::from_fn(request_logging))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}
