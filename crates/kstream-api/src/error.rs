//! API error types and their HTTP mapping.
//!
//! Every error response follows the `{ "error": <message>, "details"?: {...} }`
//! envelope. Validation failures carry the field-error map in `details`;
//! internal errors are collapsed to a generic message in production.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::error;

use kstream_firestore::FirestoreError;
use kstream_mux::MuxError;
use kstream_storage::StorageError;
use kstream_upload::UploadError;

/// API error type with HTTP status mapping.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Field-level validation failure; the map is keyed by form field.
    #[error("Validation failed")]
    Validation(Map<String, Value>),

    #[error("Too many requests")]
    RateLimited,

    /// A relay or video-host call failed upstream of us.
    #[error("Upstream request failed: {0}")]
    Upstream(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        ApiError::BadRequest(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        ApiError::Unauthorized(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        ApiError::Forbidden(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        ApiError::NotFound(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        ApiError::Internal(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error response envelope.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            error!("API error: {}", self);
        }

        let production = std::env::var("ENVIRONMENT")
            .map(|e| e == "production")
            .unwrap_or(false);

        let (message, details) = match self {
            ApiError::Validation(errors) => (
                "Validation failed".to_string(),
                Some(Value::Object(errors)),
            ),
            ApiError::Internal(msg) => {
                if production {
                    ("Internal server error".to_string(), None)
                } else {
                    (msg, None)
                }
            }
            ApiError::Upstream(msg) => {
                if production {
                    ("Upstream request failed".to_string(), None)
                } else {
                    (msg, None)
                }
            }
            other => (other.to_string(), None),
        };

        (
            status,
            Json(ErrorResponse {
                error: message,
                details,
            }),
        )
            .into_response()
    }
}

impl From<FirestoreError> for ApiError {
    fn from(e: FirestoreError) -> Self {
        match e {
            FirestoreError::NotFound(msg) => ApiError::NotFound(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<MuxError> for ApiError {
    fn from(e: MuxError) -> Self {
        match e {
            MuxError::NotFound(msg) => ApiError::NotFound(msg),
            other => ApiError::Upstream(other.to_string()),
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound(key) => ApiError::NotFound(key),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<UploadError> for ApiError {
    fn from(e: UploadError) -> Self {
        match e {
            UploadError::Mux(inner) => inner.into(),
            UploadError::Firestore(inner) => inner.into(),
            UploadError::TransferFailed(msg) => ApiError::Upstream(msg),
            UploadError::PollTimeout(secs) => {
                ApiError::Upstream(format!("Upload still processing after {secs}s"))
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

/// API result type.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::bad_request("x").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Validation(Map::new()).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::Upstream("relay".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ApiError::internal("boom").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_firestore_not_found_maps_to_404() {
        let err: ApiError = FirestoreError::NotFound("movies/m1".into()).into();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_mux_upstream_maps_to_502() {
        let err: ApiError = MuxError::upstream(500, "asset fetch failed").into();
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
    }
}
