//! Stream health probing
//!
//! A probe asks the origin for headers only. `HEAD` is tried first; origins
//! that reject it (405/501) are asked again with a ranged `GET` whose body is
//! dropped as soon as the headers are in. The whole probe is bounded by
//! [`ProbeConfig::timeout`] and never fails: every outcome is folded into a
//! [`HealthCheckResult`].

use async_trait::async_trait;
use bridge_traits::http::{HttpClient, HttpRequest, RetryPolicy};
use core_runtime::logging::redact_url;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::config::ProbeConfig;
use crate::error::validate_stream_url;

/// Status reported when the probe ran out of time.
pub const PROBE_TIMEOUT_STATUS: u16 = 504;

/// Status reported when the origin could not be reached at all.
pub const PROBE_UNREACHABLE_STATUS: u16 = 502;

/// Outcome of a single probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheckResult {
    pub reachable: bool,
    pub http_status: u16,
    pub content_type: Option<String>,
    pub is_audio_like: bool,
    pub message: String,
}

impl HealthCheckResult {
    fn unreachable(http_status: u16, message: impl Into<String>) -> Self {
        Self {
            reachable: false,
            http_status,
            content_type: None,
            is_audio_like: false,
            message: message.into(),
        }
    }

    fn from_response(status: u16, reason: Option<String>, content_type: Option<String>) -> Self {
        let reachable = (200..300).contains(&status);
        let audio = content_type.as_deref().map(is_audio_like).unwrap_or(false);

        let message = if !reachable {
            match reason {
                Some(reason) => format!("Stream responded with HTTP {}: {}", status, reason),
                None => format!("Stream responded with HTTP {}", status),
            }
        } else if audio {
            "Stream is reachable".to_string()
        } else {
            format!(
                "Stream is reachable but content type '{}' does not look like audio",
                content_type.as_deref().unwrap_or("unknown")
            )
        };

        Self {
            reachable,
            http_status: status,
            content_type,
            is_audio_like: audio,
            message,
        }
    }

    /// Reachable and serving something that looks like audio.
    pub fn healthy(&self) -> bool {
        self.reachable && self.is_audio_like
    }
}

/// `audio/*`, or a generic binary type. Plenty of Icecast/SHOUTcast servers
/// answer with `application/octet-stream`.
pub fn is_audio_like(content_type: &str) -> bool {
    let lower = content_type.to_ascii_lowercase();
    lower.contains("audio") || lower.contains("octet-stream")
}

/// Seam used by the playback engine and the HTTP surface.
#[async_trait]
pub trait StreamHealthCheck: Send + Sync {
    async fn check(&self, station_id: &str, url: &str) -> HealthCheckResult;
}

/// Probes origins through the bridge HTTP client.
pub struct HealthProber {
    http_client: Arc<dyn HttpClient>,
    config: ProbeConfig,
}

impl HealthProber {
    pub fn new(http_client: Arc<dyn HttpClient>, config: ProbeConfig) -> Self {
        Self {
            http_client,
            config,
        }
    }

    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    /// Probe `url`, resolving within the configured timeout.
    pub async fn probe(&self, url: &str) -> HealthCheckResult {
        if let Err(e) = validate_stream_url(url) {
            return HealthCheckResult::unreachable(400, e.to_string());
        }

        let limit = self.config.timeout;
        match tokio::time::timeout(limit, self.probe_origin(url)).await {
            Ok(result) => result,
            Err(_) => HealthCheckResult::unreachable(
                PROBE_TIMEOUT_STATUS,
                format!("Health check timed out after {}ms", limit.as_millis()),
            ),
        }
    }

    async fn probe_origin(&self, url: &str) -> HealthCheckResult {
        let head = HttpRequest::head(url)
            .header("User-Agent", self.config.user_agent.clone())
            .timeout(self.config.timeout);

        match self
            .http_client
            .execute_with_retry(head, RetryPolicy::none())
            .await
        {
            Ok(response) if response.status == 405 || response.status == 501 => {
                debug!(status = response.status, "HEAD rejected, retrying with GET");
                self.probe_with_get(url).await
            }
            Ok(response) => HealthCheckResult::from_response(
                response.status,
                response.reason.clone(),
                response.header("content-type").map(str::to_string),
            ),
            Err(e) => HealthCheckResult::unreachable(
                PROBE_UNREACHABLE_STATUS,
                format!("Stream unreachable: {}", e),
            ),
        }
    }

    async fn probe_with_get(&self, url: &str) -> HealthCheckResult {
        let get = HttpRequest::get(url)
            .header("User-Agent", self.config.user_agent.clone())
            .header("Range", "bytes=0-")
            .header("Accept-Encoding", "identity")
            .timeout(self.config.timeout);

        match self.http_client.stream(get).await {
            Ok(response) => {
                let content_type = response.header("content-type").map(str::to_string);
                let reason = response.reason.clone();
                let status = response.status;
                // Headers are all we need; dropping the body closes the connection.
                drop(response);
                HealthCheckResult::from_response(status, reason, content_type)
            }
            Err(e) => HealthCheckResult::unreachable(
                PROBE_UNREACHABLE_STATUS,
                format!("Stream unreachable: {}", e),
            ),
        }
    }
}

#[async_trait]
impl StreamHealthCheck for HealthProber {
    #[instrument(skip(self, url), fields(url = %redact_url(url)))]
    async fn check(&self, station_id: &str, url: &str) -> HealthCheckResult {
        let result = self.probe(url).await;
        debug!(
            station_id,
            status = result.http_status,
            healthy = result.healthy(),
            "Health check finished"
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::error::{BridgeError, Result as BridgeResult};
    use bridge_traits::http::{HttpMethod, HttpResponse, StreamingResponse};
    use bytes::Bytes;
    use futures::stream::{self, StreamExt};
    use mockall::mock;
    use std::collections::HashMap;
    use std::time::Duration;

    mock! {
        pub Client {}

        #[async_trait]
        impl HttpClient for Client {
            async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse>;
            async fn execute_with_retry(
                &self,
                request: HttpRequest,
                policy: RetryPolicy,
            ) -> BridgeResult<HttpResponse>;
            async fn stream(&self, request: HttpRequest) -> BridgeResult<StreamingResponse>;
        }
    }

    fn head_response(status: u16, content_type: Option<&str>) -> HttpResponse {
        let mut response = HttpResponse::new(status, Bytes::new());
        if let Some(ct) = content_type {
            response = response.with_header("Content-Type", ct);
        }
        response
    }

    fn prober(client: MockClient) -> HealthProber {
        HealthProber::new(Arc::new(client), ProbeConfig::default())
    }

    #[test]
    fn test_audio_like_content_types() {
        assert!(is_audio_like("audio/mpeg"));
        assert!(is_audio_like("Audio/AAC"));
        assert!(is_audio_like("application/octet-stream"));
        assert!(!is_audio_like("text/html; charset=utf-8"));
        assert!(!is_audio_like("application/json"));
    }

    #[tokio::test]
    async fn test_healthy_audio_stream() {
        let mut client = MockClient::new();
        client
            .expect_execute_with_retry()
            .withf(|req, policy| req.method == HttpMethod::Head && policy.max_attempts == 1)
            .times(1)
            .returning(|_, _| Ok(head_response(200, Some("audio/mpeg"))));

        let result = prober(client).check("s1", "http://ice.example/live").await;
        assert!(result.healthy());
        assert_eq!(result.http_status, 200);
        assert_eq!(result.content_type.as_deref(), Some("audio/mpeg"));
    }

    #[tokio::test]
    async fn test_octet_stream_is_healthy() {
        let mut client = MockClient::new();
        client
            .expect_execute_with_retry()
            .returning(|_, _| Ok(head_response(200, Some("application/octet-stream"))));

        let result = prober(client).check("s1", "http://ice.example/live").await;
        assert!(result.healthy());
    }

    #[tokio::test]
    async fn test_reachable_html_is_not_healthy() {
        let mut client = MockClient::new();
        client
            .expect_execute_with_retry()
            .returning(|_, _| Ok(head_response(200, Some("text/html"))));

        let result = prober(client).check("s1", "http://ice.example/").await;
        assert!(result.reachable);
        assert!(!result.is_audio_like);
        assert!(!result.healthy());
        assert!(result.message.contains("text/html"));
    }

    #[tokio::test]
    async fn test_error_status_is_unreachable() {
        let mut client = MockClient::new();
        client.expect_execute_with_retry().returning(|_, _| {
            Ok(head_response(404, None).with_reason("Not Found"))
        });

        let result = prober(client).check("s1", "http://ice.example/gone").await;
        assert!(!result.reachable);
        assert_eq!(result.http_status, 404);
        assert_eq!(result.message, "Stream responded with HTTP 404: Not Found");
    }

    #[tokio::test]
    async fn test_head_rejected_falls_back_to_get() {
        let mut client = MockClient::new();
        client
            .expect_execute_with_retry()
            .times(1)
            .returning(|_, _| Ok(head_response(405, None)));
        client
            .expect_stream()
            .withf(|req| {
                req.method == HttpMethod::Get
                    && req.headers.get("Range").map(String::as_str) == Some("bytes=0-")
            })
            .times(1)
            .returning(|_| {
                let mut headers = HashMap::new();
                headers.insert("content-type".to_string(), "audio/aac".to_string());
                Ok(StreamingResponse {
                    status: 200,
                    reason: None,
                    headers,
                    body: stream::pending().boxed(),
                })
            });

        let result = prober(client).check("s1", "http://ice.example/live").await;
        assert!(result.healthy());
        assert_eq!(result.content_type.as_deref(), Some("audio/aac"));
    }

    #[tokio::test]
    async fn test_transport_failure_reports_bad_gateway() {
        let mut client = MockClient::new();
        client
            .expect_execute_with_retry()
            .returning(|_, _| Err(BridgeError::OperationFailed("Connection failed".into())));

        let result = prober(client).check("s1", "http://ice.example/live").await;
        assert!(!result.reachable);
        assert_eq!(result.http_status, PROBE_UNREACHABLE_STATUS);
    }

    #[tokio::test]
    async fn test_invalid_url_never_reaches_client() {
        let client = MockClient::new();
        let result = prober(client).check("s1", "not a url").await;
        assert!(!result.reachable);
        assert_eq!(result.http_status, 400);
    }

    // ========================================================================
    // Hanging origin
    // ========================================================================

    struct HangingClient;

    #[async_trait]
    impl HttpClient for HangingClient {
        async fn execute(&self, _request: HttpRequest) -> BridgeResult<HttpResponse> {
            futures::future::pending().await
        }

        async fn stream(&self, _request: HttpRequest) -> BridgeResult<StreamingResponse> {
            futures::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_resolves_at_timeout() {
        let config = ProbeConfig {
            timeout: Duration::from_millis(10_000),
            ..ProbeConfig::default()
        };
        let prober = HealthProber::new(Arc::new(HangingClient), config);

        let started = tokio::time::Instant::now();
        let result = prober.check("s1", "http://slow.example/live").await;
        let elapsed = started.elapsed();

        assert!(!result.reachable);
        assert_eq!(result.http_status, PROBE_TIMEOUT_STATUS);
        assert_eq!(result.message, "Health check timed out after 10000ms");
        assert!(elapsed >= Duration::from_millis(10_000));
        assert!(elapsed < Duration::from_millis(10_100));
    }
}
