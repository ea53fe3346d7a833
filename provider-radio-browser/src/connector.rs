//! Radio Browser API connector implementation
//!
//! Implements the `StationDirectory` trait over the public Radio Browser
//! mirrors, failing over between them in order.

use async_trait::async_trait;
use bridge_traits::http::{HttpClient, HttpRequest, RetryPolicy};
use bridge_traits::Station;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::error::{DirectoryError, Result};
use crate::types::{Facet, SearchParams, StationQuery};
use crate::StationDirectory;

/// Radio Browser API connector
///
/// # Features
///
/// - Ordered mirror failover; the first mirror that answers wins
/// - One attempt per mirror, bounded by a per-request timeout
/// - Non-array JSON bodies are treated as an empty result
///
/// # Example
///
/// ```ignore
/// use provider_radio_browser::{RadioBrowserConnector, StationDirectory, StationQuery};
///
/// let connector = RadioBrowserConnector::from_config(&core_config);
/// let stations = connector.list_by_country("Bangladesh", &StationQuery::default()).await?;
/// ```
pub struct RadioBrowserConnector {
    http_client: Arc<dyn HttpClient>,
    mirrors: Vec<String>,
    user_agent: String,
    timeout: Duration,
}

impl RadioBrowserConnector {
    /// Create a connector over an explicit mirror list
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        mirrors: Vec<String>,
        user_agent: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            http_client,
            mirrors,
            user_agent: user_agent.into(),
            timeout,
        }
    }

    /// Create a connector from the runtime configuration
    pub fn from_config(config: &core_runtime::config::CoreConfig) -> Self {
        Self::new(
            Arc::clone(&config.http_client),
            config.mirrors.clone(),
            config.user_agent.clone(),
            config.directory_timeout,
        )
    }

    pub fn mirrors(&self) -> &[String] {
        &self.mirrors
    }

    fn build_url(mirror: &str, path: &str, pairs: &[(&str, String)]) -> String {
        if pairs.is_empty() {
            return format!("{}{}", mirror, path);
        }
        let query = pairs
            .iter()
            .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value)))
            .collect::<Vec<_>>()
            .join("&");
        format!("{}{}?{}", mirror, path, query)
    }

    /// Decode a directory body. Anything that is valid JSON but not an array
    /// yields an empty list.
    fn parse_list<T: DeserializeOwned>(body: &[u8]) -> std::result::Result<Vec<T>, String> {
        let value: serde_json::Value =
            serde_json::from_slice(body).map_err(|e| format!("Invalid JSON: {}", e))?;

        if !value.is_array() {
            return Ok(Vec::new());
        }

        serde_json::from_value(value).map_err(|e| format!("Unexpected response shape: {}", e))
    }

    /// Try each mirror in order and return the first successful list.
    #[instrument(skip(self, pairs), fields(path = %path))]
    async fn fetch_list<T: DeserializeOwned + Send>(
        &self,
        path: &str,
        pairs: &[(&str, String)],
    ) -> Result<Vec<T>> {
        let mut errors = Vec::with_capacity(self.mirrors.len());

        for mirror in &self.mirrors {
            let url = Self::build_url(mirror, path, pairs);
            let request = HttpRequest::get(&url)
                .header("User-Agent", self.user_agent.as_str())
                .header("Accept", "application/json")
                .timeout(self.timeout);

            let response = match self
                .http_client
                .execute_with_retry(request, RetryPolicy::none())
                .await
            {
                Ok(response) => response,
                Err(e) => {
                    warn!(mirror = %mirror, error = %e, "Directory mirror unreachable");
                    errors.push(e.to_string());
                    continue;
                }
            };

            if !response.is_success() {
                let message = match response.reason.as_deref() {
                    Some(reason) => format!("HTTP {}: {}", response.status, reason),
                    None => format!("HTTP {}", response.status),
                };
                warn!(mirror = %mirror, status = response.status, "Directory mirror rejected request");
                errors.push(message);
                continue;
            }

            match Self::parse_list::<T>(&response.body) {
                Ok(items) => {
                    debug!(mirror = %mirror, count = items.len(), "Directory request succeeded");
                    return Ok(items);
                }
                Err(message) => {
                    warn!(mirror = %mirror, error = %message, "Directory mirror returned bad body");
                    errors.push(message);
                }
            }
        }

        warn!(attempted = errors.len(), "All directory mirrors failed");
        Err(DirectoryError::Unavailable { errors })
    }
}

#[async_trait]
impl StationDirectory for RadioBrowserConnector {
    #[instrument(skip(self, query), fields(country = %country))]
    async fn list_by_country(&self, country: &str, query: &StationQuery) -> Result<Vec<Station>> {
        let path = format!(
            "/json/stations/bycountry/{}",
            urlencoding::encode(country)
        );
        let stations: Vec<Station> = self.fetch_list(&path, &query.to_pairs()).await?;
        info!("Retrieved {} stations for {}", stations.len(), country);
        Ok(stations)
    }

    #[instrument(skip(self, params))]
    async fn search(&self, params: &SearchParams) -> Result<Vec<Station>> {
        self.fetch_list("/json/stations/search", &params.to_pairs())
            .await
    }

    #[instrument(skip(self))]
    async fn top_clicked(&self, count: u32) -> Result<Vec<Station>> {
        if count == 0 {
            return Err(DirectoryError::InvalidQuery(
                "count must be greater than 0".to_string(),
            ));
        }
        self.fetch_list(&format!("/json/stations/topclick/{}", count), &[])
            .await
    }

    #[instrument(skip(self))]
    async fn languages(&self) -> Result<Vec<Facet>> {
        self.fetch_list("/json/languages", &[]).await
    }

    #[instrument(skip(self))]
    async fn tags(&self) -> Result<Vec<Facet>> {
        self.fetch_list("/json/tags", &[]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::error::{BridgeError, Result as BridgeResult};
    use bridge_traits::http::{HttpResponse, StreamingResponse};
    use mockall::mock;
    use mockall::predicate::function;

    mock! {
        HttpClient {}

        #[async_trait]
        impl HttpClient for HttpClient {
            async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse>;
            async fn execute_with_retry(&self, request: HttpRequest, policy: RetryPolicy) -> BridgeResult<HttpResponse>;
            async fn stream(&self, request: HttpRequest) -> BridgeResult<StreamingResponse>;
        }
    }

    const MIRRORS: [&str; 3] = ["https://m1.test", "https://m2.test", "https://m3.test"];

    fn connector(mock_http: MockHttpClient) -> RadioBrowserConnector {
        RadioBrowserConnector::new(
            Arc::new(mock_http),
            MIRRORS.iter().map(|m| m.to_string()).collect(),
            "RadioStreamApp/1.0",
            Duration::from_secs(15),
        )
    }

    fn station_body() -> &'static str {
        r#"[{
            "stationuuid": "s-1",
            "name": "Radio Foorti",
            "country": "Bangladesh",
            "url": "http://origin.test/live",
            "url_resolved": "https://cdn.test/live.mp3",
            "bitrate": 64
        }]"#
    }

    #[tokio::test]
    async fn test_list_by_country_builds_request() {
        let mut mock_http = MockHttpClient::new();

        mock_http
            .expect_execute_with_retry()
            .with(
                function(|req: &HttpRequest| {
                    req.url.starts_with("https://m1.test/json/stations/bycountry/United%20Kingdom?")
                        && req.url.contains("limit=50")
                        && req.url.contains("offset=0")
                        && req.url.contains("order=clickcount")
                        && req.url.contains("reverse=true")
                        && req.url.contains("hidebroken=true")
                        && req.headers.get("User-Agent").map(String::as_str)
                            == Some("RadioStreamApp/1.0")
                        && req.timeout == Some(Duration::from_secs(15))
                }),
                function(|policy: &RetryPolicy| policy.max_attempts == 1),
            )
            .times(1)
            .returning(|_, _| Ok(HttpResponse::new(200, station_body())));

        let stations = connector(mock_http)
            .list_by_country("United Kingdom", &StationQuery::default())
            .await
            .unwrap();

        assert_eq!(stations.len(), 1);
        assert_eq!(stations[0].id, "s-1");
        assert_eq!(
            stations[0].resolved_url.as_deref(),
            Some("https://cdn.test/live.mp3")
        );
    }

    #[tokio::test]
    async fn test_fails_over_to_next_mirror() {
        let mut mock_http = MockHttpClient::new();
        let mut seq = mockall::Sequence::new();

        mock_http
            .expect_execute_with_retry()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|req, _| {
                assert!(req.url.starts_with("https://m1.test"));
                Err(BridgeError::OperationFailed(
                    "Connection failed: refused".to_string(),
                ))
            });
        mock_http
            .expect_execute_with_retry()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|req, _| {
                assert!(req.url.starts_with("https://m2.test"));
                Ok(HttpResponse::new(200, station_body()))
            });

        let stations = connector(mock_http).top_clicked(10).await.unwrap();
        assert_eq!(stations.len(), 1);
    }

    #[tokio::test]
    async fn test_all_mirrors_fail() {
        let mut mock_http = MockHttpClient::new();

        mock_http
            .expect_execute_with_retry()
            .times(3)
            .returning(|req, _| {
                if req.url.starts_with("https://m1.test") {
                    Ok(HttpResponse::new(503, "").with_reason("Service Unavailable"))
                } else if req.url.starts_with("https://m2.test") {
                    Err(BridgeError::Timeout("Request timed out".to_string()))
                } else {
                    Ok(HttpResponse::new(200, "<html>maintenance</html>"))
                }
            });

        let error = connector(mock_http).tags().await.unwrap_err();

        let errors = error.mirror_errors();
        assert_eq!(errors.len(), 3);
        assert_eq!(errors[0], "HTTP 503: Service Unavailable");
        assert!(errors[1].contains("timed out"));
        assert!(errors[2].starts_with("Invalid JSON"));
        assert!(error.to_string().starts_with("All mirrors failed: HTTP 503"));
    }

    #[tokio::test]
    async fn test_non_array_body_is_empty_list() {
        let mut mock_http = MockHttpClient::new();

        mock_http
            .expect_execute_with_retry()
            .times(1)
            .returning(|_, _| Ok(HttpResponse::new(200, r#"{"error":"rate limited"}"#)));

        let stations = connector(mock_http)
            .search(&SearchParams::default())
            .await
            .unwrap();
        assert!(stations.is_empty());
    }

    #[tokio::test]
    async fn test_search_only_sends_given_filters() {
        let mut mock_http = MockHttpClient::new();

        mock_http
            .expect_execute_with_retry()
            .with(
                function(|req: &HttpRequest| {
                    req.url.starts_with("https://m1.test/json/stations/search?")
                        && req.url.contains("tag=lo-fi%20beats")
                        && req.url.contains("language=english")
                        && !req.url.contains("name=")
                        && !req.url.contains("country=")
                }),
                function(|_: &RetryPolicy| true),
            )
            .times(1)
            .returning(|_, _| Ok(HttpResponse::new(200, "[]")));

        let params = SearchParams {
            tag: Some("lo-fi beats".to_string()),
            language: Some("english".to_string()),
            name: Some(String::new()),
            ..Default::default()
        };

        let stations = connector(mock_http).search(&params).await.unwrap();
        assert!(stations.is_empty());
    }

    #[tokio::test]
    async fn test_languages_parse_facets() {
        let mut mock_http = MockHttpClient::new();

        mock_http
            .expect_execute_with_retry()
            .with(
                function(|req: &HttpRequest| req.url == "https://m1.test/json/languages"),
                function(|_: &RetryPolicy| true),
            )
            .times(1)
            .returning(|_, _| {
                Ok(HttpResponse::new(
                    200,
                    r#"[{"name":"bengali","iso_639":"bn","stationcount":312}]"#,
                ))
            });

        let languages = connector(mock_http).languages().await.unwrap();
        assert_eq!(languages[0].name, "bengali");
        assert_eq!(languages[0].iso_639.as_deref(), Some("bn"));
    }

    #[tokio::test]
    async fn test_top_clicked_rejects_zero() {
        let mock_http = MockHttpClient::new();
        let result = connector(mock_http).top_clicked(0).await;
        assert!(matches!(result, Err(DirectoryError::InvalidQuery(_))));
    }
}
