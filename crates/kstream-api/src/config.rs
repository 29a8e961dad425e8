//! API server configuration.

use std::time::Duration;

/// API server configuration, read from environment variables.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Allowed CORS origins; `*` allows any origin without credentials.
    pub cors_origins: Vec<String>,
    /// Per-IP rate limit in requests per second.
    pub rate_limit_rps: u32,
    /// Request timeout.
    pub request_timeout: Duration,
    /// Maximum request body size in bytes. Large enough for proxy-relayed
    /// video uploads.
    pub max_body_size: usize,
    /// Deployment environment name.
    pub environment: String,
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let host = std::env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = std::env::var("API_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);

        let cors_origins = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let rate_limit_rps = std::env::var("RATE_LIMIT_RPS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(20);

        let request_timeout = Duration::from_secs(
            std::env::var("REQUEST_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(60),
        );

        let max_body_size = std::env::var("MAX_BODY_SIZE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(512 * 1024 * 1024);

        let environment =
            std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        Self {
            host,
            port,
            cors_origins,
            rate_limit_rps,
            request_timeout,
            max_body_size,
            environment,
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_defaults() {
        for var in [
            "API_HOST",
            "API_PORT",
            "CORS_ORIGINS",
            "RATE_LIMIT_RPS",
            "ENVIRONMENT",
        ] {
            std::env::remove_var(var);
        }
        let config = ApiConfig::from_env();
        assert_eq!(config.bind_addr(), "0.0.0.0:8080");
        assert_eq!(config.cors_origins, vec!["*"]);
        assert!(!config.is_production());
    }

    #[test]
    #[serial]
    fn test_cors_origin_list() {
        std::env::set_var("CORS_ORIGINS", "https://a.io, https://b.io");
        let config = ApiConfig::from_env();
        assert_eq!(config.cors_origins, vec!["https://a.io", "https://b.io"]);
        std::env::remove_var("CORS_ORIGINS");
    }
}
