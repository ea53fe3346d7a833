//! Client side of the relay backend.
//!
//! [`RelayEndpoint`] builds the relay URLs handed to the transport and
//! [`RelayHealthCheck`] asks the backend's check endpoint about an origin.

use async_trait::async_trait;
use bridge_traits::http::{HttpClient, HttpRequest, RetryPolicy};
use core_stream::{HealthCheckResult, StreamHealthCheck};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Relay backend location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayEndpoint {
    base: String,
}

impl RelayEndpoint {
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// `{base}/api/stream/{station_id}?url={encoded}`
    pub fn stream_url(&self, station_id: &str, origin_url: &str) -> String {
        format!(
            "{}/api/stream/{}?url={}",
            self.base,
            urlencoding::encode(station_id),
            urlencoding::encode(origin_url)
        )
    }

    /// `{base}/api/stream/check/{station_id}?url={encoded}`
    pub fn check_url(&self, station_id: &str, origin_url: &str) -> String {
        format!(
            "{}/api/stream/check/{}?url={}",
            self.base,
            urlencoding::encode(station_id),
            urlencoding::encode(origin_url)
        )
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CheckBody {
    healthy: bool,
    #[serde(default)]
    reachable: Option<bool>,
    #[serde(default)]
    status: u16,
    #[serde(default)]
    content_type: Option<String>,
    #[serde(default)]
    is_audio_like: Option<bool>,
    #[serde(default)]
    message: String,
}

impl From<CheckBody> for HealthCheckResult {
    fn from(body: CheckBody) -> Self {
        HealthCheckResult {
            reachable: body.reachable.unwrap_or(body.healthy),
            http_status: body.status,
            content_type: body.content_type,
            is_audio_like: body.is_audio_like.unwrap_or(body.healthy),
            message: body.message,
        }
    }
}

/// [`StreamHealthCheck`] served by the relay backend.
///
/// Any failure of the endpoint itself reads as unhealthy.
pub struct RelayHealthCheck {
    http_client: Arc<dyn HttpClient>,
    endpoint: RelayEndpoint,
    timeout: Duration,
}

impl RelayHealthCheck {
    pub fn new(http_client: Arc<dyn HttpClient>, endpoint: RelayEndpoint, timeout: Duration) -> Self {
        Self {
            http_client,
            endpoint,
            timeout,
        }
    }

    fn unhealthy(message: String) -> HealthCheckResult {
        HealthCheckResult {
            reachable: false,
            http_status: 502,
            content_type: None,
            is_audio_like: false,
            message,
        }
    }
}

#[async_trait]
impl StreamHealthCheck for RelayHealthCheck {
    async fn check(&self, station_id: &str, url: &str) -> HealthCheckResult {
        let request = HttpRequest::get(self.endpoint.check_url(station_id, url))
            .header("Accept", "application/json")
            .timeout(self.timeout);

        let response = match self
            .http_client
            .execute_with_retry(request, RetryPolicy::none())
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!(station_id, error = %e, "Health check endpoint unreachable");
                return Self::unhealthy(format!("Health check failed: {}", e));
            }
        };

        if !response.is_success() {
            return Self::unhealthy(format!(
                "Health check endpoint returned HTTP {}",
                response.status
            ));
        }

        match response.json::<CheckBody>() {
            Ok(body) => {
                let result = HealthCheckResult::from(body);
                debug!(station_id, healthy = result.healthy(), "Relay health check");
                result
            }
            Err(e) => Self::unhealthy(format!("Malformed health check response: {}", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::error::{BridgeError, Result as BridgeResult};
    use bridge_traits::http::{HttpResponse, StreamingResponse};
    use mockall::mock;

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

    fn checker(client: MockClient) -> RelayHealthCheck {
        RelayHealthCheck::new(
            Arc::new(client),
            RelayEndpoint::new("http://relay.local:5000/"),
            Duration::from_secs(12),
        )
    }

    #[test]
    fn test_urls_are_encoded() {
        let endpoint = RelayEndpoint::new("http://relay.local:5000/");
        assert_eq!(
            endpoint.stream_url("abc-1", "http://ice.example:8000/live?x=1&y=2"),
            "http://relay.local:5000/api/stream/abc-1?url=http%3A%2F%2Fice.example%3A8000%2Flive%3Fx%3D1%26y%3D2"
        );
        assert!(endpoint
            .check_url("abc-1", "http://a.example/")
            .starts_with("http://relay.local:5000/api/stream/check/abc-1?url="));
    }

    #[tokio::test]
    async fn test_healthy_envelope() {
        let mut client = MockClient::new();
        client
            .expect_execute_with_retry()
            .withf(|req, _| req.url.contains("/api/stream/check/s1?url="))
            .times(1)
            .returning(|_, _| {
                Ok(HttpResponse::new(
                    200,
                    r#"{"ok":true,"healthy":true,"status":200,"contentType":"audio/mpeg","message":"Stream is reachable"}"#,
                ))
            });

        let result = checker(client).check("s1", "http://ice.example/live").await;
        assert!(result.healthy());
        assert_eq!(result.http_status, 200);
        assert_eq!(result.content_type.as_deref(), Some("audio/mpeg"));
    }

    #[tokio::test]
    async fn test_unhealthy_envelope() {
        let mut client = MockClient::new();
        client.expect_execute_with_retry().returning(|_, _| {
            Ok(HttpResponse::new(
                200,
                r#"{"ok":true,"healthy":false,"status":504,"message":"Health check timed out after 10000ms"}"#,
            ))
        });

        let result = checker(client).check("s1", "http://ice.example/live").await;
        assert!(!result.healthy());
        assert_eq!(result.http_status, 504);
    }

    #[tokio::test]
    async fn test_endpoint_failure_is_unhealthy() {
        let mut client = MockClient::new();
        client
            .expect_execute_with_retry()
            .returning(|_, _| Err(BridgeError::Timeout("check".into())));
        assert!(!checker(client).check("s1", "http://x.example/").await.healthy());

        let mut client = MockClient::new();
        client
            .expect_execute_with_retry()
            .returning(|_, _| Ok(HttpResponse::new(500, "oops")));
        assert!(!checker(client).check("s1", "http://x.example/").await.healthy());

        let mut client = MockClient::new();
        client
            .expect_execute_with_retry()
            .returning(|_, _| Ok(HttpResponse::new(200, "<html>")));
        assert!(!checker(client).check("s1", "http://x.example/").await.healthy());
    }
}
