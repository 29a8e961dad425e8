//! Byte transfer to the direct upload URL.
//!
//! Preferred path is a streaming PUT with granular progress. Some storage
//! backends reject PUT from certain networks, so on failure the same bytes
//! are retried as a POST, and finally through a same-origin relay which can
//! only report coarse progress (90 then 100).

use std::sync::Arc;

use futures::stream;
use reqwest::{Body, Client};
use tracing::{debug, info, warn};

use kstream_mux::mock;

use crate::error::{UploadError, UploadResult};

const PROGRESS_CHUNK: usize = 256 * 1024;

/// Coarse progress reported when a fallback path starts relaying.
pub const COARSE_PROGRESS_START: u8 = 90;

/// How the bytes ultimately reached the upload URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferMethod {
    /// Mock upload URL, nothing was sent.
    Mock,
    /// Direct PUT with granular progress.
    Put,
    /// Direct POST fallback, coarse progress.
    Post,
    /// Same-origin relay fallback, coarse progress.
    Proxy,
}

/// Progress callback, called with 0-100.
pub type ProgressFn = Arc<dyn Fn(u8) + Send + Sync>;

/// Transfer settings.
#[derive(Debug, Clone, Default)]
pub struct TransferConfig {
    /// Same-origin relay endpoint used as the last fallback, e.g.
    /// "https://admin.example.com/api/mux/proxy-upload".
    pub proxy_endpoint: Option<String>,
}

/// Send the payload to the direct upload URL, walking the fallback chain.
pub async fn transfer(
    http: &Client,
    config: &TransferConfig,
    upload_url: &str,
    payload: Vec<u8>,
    progress: ProgressFn,
) -> UploadResult<TransferMethod> {
    // Mock uploads never leave the process.
    if upload_url == mock::DIRECT_UPLOAD_URL {
        debug!("Mock upload URL, skipping byte transfer");
        progress(100);
        return Ok(TransferMethod::Mock);
    }

    let total = payload.len();

    match put_with_progress(http, upload_url, payload.clone(), Arc::clone(&progress), total).await {
        Ok(()) => {
            progress(100);
            return Ok(TransferMethod::Put);
        }
        Err(e) => warn!("Direct PUT failed, falling back to POST: {}", e),
    }

    match post_bytes(http, upload_url, payload.clone(), Arc::clone(&progress)).await {
        Ok(()) => return Ok(TransferMethod::Post),
        Err(e) => warn!("Direct POST failed, falling back to relay: {}", e),
    }

    let Some(proxy) = &config.proxy_endpoint else {
        return Err(UploadError::TransferFailed(
            "direct PUT and POST failed and no relay endpoint is configured".to_string(),
        ));
    };

    proxy_bytes(http, proxy, upload_url, payload, progress).await?;
    info!("Payload relayed through {}", proxy);
    Ok(TransferMethod::Proxy)
}

/// PUT with a chunked streaming body that reports progress per chunk.
async fn put_with_progress(
    http: &Client,
    url: &str,
    payload: Vec<u8>,
    progress: ProgressFn,
    total: usize,
) -> UploadResult<()> {
    let chunks: Vec<Vec<u8>> = payload
        .chunks(PROGRESS_CHUNK)
        .map(|c| c.to_vec())
        .collect();

    let progress_stream = Arc::clone(&progress);
    let mut sent = 0usize;
    let body_stream = stream::iter(chunks.into_iter().map(move |chunk| {
        sent += chunk.len();
        if total > 0 {
            // Cap at 99 until the server acknowledges.
            let pct = ((sent as f64 / total as f64) * 100.0).min(99.0) as u8;
            progress_stream(pct);
        }
        Ok::<_, std::io::Error>(chunk)
    }));

    let response = http
        .put(url)
        .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
        .header(reqwest::header::CONTENT_LENGTH, total)
        .body(Body::wrap_stream(body_stream))
        .send()
        .await?;

    if response.status().is_success() {
        Ok(())
    } else {
        Err(UploadError::TransferFailed(format!(
            "PUT {} returned {}",
            url,
            response.status()
        )))
    }
}

async fn post_bytes(
    http: &Client,
    url: &str,
    payload: Vec<u8>,
    progress: ProgressFn,
) -> UploadResult<()> {
    progress(COARSE_PROGRESS_START);
    let response = http
        .post(url)
        .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
        .body(payload)
        .send()
        .await?;

    if response.status().is_success() {
        progress(100);
        Ok(())
    } else {
        Err(UploadError::TransferFailed(format!(
            "POST {} returned {}",
            url,
            response.status()
        )))
    }
}

async fn proxy_bytes(
    http: &Client,
    proxy_endpoint: &str,
    target_url: &str,
    payload: Vec<u8>,
    progress: ProgressFn,
) -> UploadResult<()> {
    progress(COARSE_PROGRESS_START);
    let url = format!("{}?url={}", proxy_endpoint, urlencoding::encode(target_url));
    let response = http
        .post(&url)
        .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
        .body(payload)
        .send()
        .await?;

    if response.status().is_success() {
        progress(100);
        Ok(())
    } else {
        Err(UploadError::TransferFailed(format!(
            "relay {} returned {}",
            proxy_endpoint,
            response.status()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn recorder() -> (ProgressFn, Arc<Mutex<Vec<u8>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        let progress: ProgressFn = Arc::new(move |pct| {
            seen_clone.lock().unwrap().push(pct);
        });
        (progress, seen)
    }

    #[tokio::test]
    async fn test_mock_url_short_circuits() {
        let http = Client::new();
        let (progress, seen) = recorder();
        let method = transfer(
            &http,
            &TransferConfig::default(),
            mock::DIRECT_UPLOAD_URL,
            vec![1, 2, 3],
            progress,
        )
        .await
        .unwrap();
        assert_eq!(method, TransferMethod::Mock);
        assert_eq!(*seen.lock().unwrap(), vec![100]);
    }

    #[tokio::test]
    async fn test_put_succeeds_with_granular_progress() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/upload"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let http = Client::new();
        let (progress, seen) = recorder();
        let url = format!("{}/upload", server.uri());
        let outcome = transfer(
            &http,
            &TransferConfig::default(),
            &url,
            vec![0u8; PROGRESS_CHUNK * 3],
            progress,
        )
        .await
        .unwrap();

        assert_eq!(outcome, TransferMethod::Put);
        let seen = seen.lock().unwrap();
        assert_eq!(*seen.last().unwrap(), 100);
        // More than just the terminal tick: per-chunk updates happened.
        assert!(seen.len() >= 3);
    }

    #[tokio::test]
    async fn test_put_failure_falls_back_to_post() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/upload"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/upload"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let http = Client::new();
        let (progress, seen) = recorder();
        let url = format!("{}/upload", server.uri());
        let outcome = transfer(&http, &TransferConfig::default(), &url, vec![1], progress)
            .await
            .unwrap();

        assert_eq!(outcome, TransferMethod::Post);
        let seen = seen.lock().unwrap();
        assert!(seen.contains(&COARSE_PROGRESS_START));
        assert_eq!(*seen.last().unwrap(), 100);
    }

    #[tokio::test]
    async fn test_relay_is_last_resort() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/upload"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/relay"))
            .and(query_param("url", format!("{}/upload", server.uri())))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let http = Client::new();
        let (progress, _seen) = recorder();
        let config = TransferConfig {
            proxy_endpoint: Some(format!("{}/relay", server.uri())),
        };
        let url = format!("{}/upload", server.uri());
        let outcome = transfer(&http, &config, &url, vec![1], progress).await.unwrap();
        assert_eq!(outcome, TransferMethod::Proxy);
    }

    #[tokio::test]
    async fn test_no_relay_configured_is_terminal() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let http = Client::new();
        let (progress, _seen) = recorder();
        let url = format!("{}/upload", server.uri());
        let err = transfer(&http, &TransferConfig::default(), &url, vec![1], progress)
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::TransferFailed(_)));
    }
}
