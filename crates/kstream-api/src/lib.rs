//! HTTP API server for the KStream admin dashboard.
//!
//! Exposes content CRUD, the video upload flow's server-side endpoints,
//! settings/notifications/user administration and the audit trail, all
//! behind session-cookie auth with role gating.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
