//! Prometheus metrics for the API server.

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::time::Instant;

/// Install the Prometheus recorder and return its render handle.
pub fn init_metrics() -> PrometheusHandle {
    PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus recorder")
}

/// Metric names as constants for consistency.
pub mod names {
    pub const HTTP_REQUESTS_TOTAL: &str = "kstream_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "kstream_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "kstream_http_requests_in_flight";
    pub const RATE_LIMIT_HITS_TOTAL: &str = "kstream_rate_limit_hits_total";
    pub const UPLOAD_RELAY_BYTES_TOTAL: &str = "kstream_upload_relay_bytes_total";
}

/// Record one completed HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path)),
        ("status", status.to_string()),
    ];
    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record a rate-limited request.
pub fn record_rate_limit_hit(endpoint: &str) {
    let labels = [("endpoint", sanitize_path(endpoint))];
    counter!(names::RATE_LIMIT_HITS_TOTAL, &labels).increment(1);
}

/// Record bytes relayed through the same-origin upload proxy.
pub fn record_relay_bytes(bytes: u64) {
    counter!(names::UPLOAD_RELAY_BYTES_TOTAL).increment(bytes);
}

/// Collapse document ids in paths so label cardinality stays bounded.
/// Ids here are Firestore auto-ids, UUIDs and host asset ids, all of which
/// are long or digit-bearing tokens that never collide with route words.
fn sanitize_path(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    for segment in path.split('/') {
        if segment.is_empty() {
            continue;
        }
        out.push('/');
        if looks_like_id(segment) {
            out.push_str(":id");
        } else {
            out.push_str(segment);
        }
    }
    if out.is_empty() {
        out.push('/');
    }
    out
}

fn looks_like_id(segment: &str) -> bool {
    if segment.len() >= 16 {
        return true;
    }
    segment.chars().any(|c| c.is_ascii_digit())
        && segment.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);
    let response = next.run(request).await;
    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    record_http_request(
        &method,
        &path,
        response.status().as_u16(),
        start.elapsed().as_secs_f64(),
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_path_collapses_ids() {
        assert_eq!(
            sanitize_path("/api/movies/Zq3kP9xWb2Ttu81HcVd0"),
            "/api/movies/:id"
        );
        assert_eq!(
            sanitize_path("/api/series/abc123/episodes/550e8400-e29b-41d4-a716-446655440000"),
            "/api/series/:id/episodes/:id"
        );
    }

    #[test]
    fn test_sanitize_path_keeps_route_words() {
        assert_eq!(sanitize_path("/api/movies"), "/api/movies");
        assert_eq!(sanitize_path("/upload-status"), "/upload-status");
        assert_eq!(sanitize_path("/"), "/");
    }
}
