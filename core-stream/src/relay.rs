//! Backpressured stream relay
//!
//! [`StreamRelay::open`] connects to the origin, checks the response status
//! and hands back a [`RelayStream`] whose body is fed by a spawned pump task.
//! The pump and the client are joined by a bounded channel, so the origin is
//! only read as fast as the client drains it. The pump stops when:
//!
//! - the origin ends the stream
//! - the client goes away (body dropped)
//! - the origin stalls for longer than the stall timeout
//! - the relay is shut down

use bridge_traits::http::{HttpClient, HttpRequest};
use bytes::Bytes;
use core_runtime::logging::redact_url;
use futures::stream::{BoxStream, Stream, StreamExt};
use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::config::RelayConfig;
use crate::error::{validate_stream_url, Result, StreamError};

/// Client-facing relay body.
pub type RelayBody = BoxStream<'static, Result<Bytes>>;

/// An opened relay, ready to be handed to the HTTP layer.
pub struct RelayStream {
    /// Status the origin answered with (200 or 206 for a ranged request).
    pub upstream_status: u16,
    pub content_type: String,
    pub body: RelayBody,
}

impl std::fmt::Debug for RelayStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayStream")
            .field("upstream_status", &self.upstream_status)
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

/// How a pump run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PumpOutcome {
    Completed,
    ClientDisconnected,
    Interrupted(String),
}

/// Totals for one pump run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PumpSummary {
    pub bytes: u64,
    pub chunks: u64,
    pub outcome: PumpOutcome,
}

/// Relays origin audio to clients.
pub struct StreamRelay {
    http_client: Arc<dyn HttpClient>,
    config: RelayConfig,
    shutdown: CancellationToken,
}

impl StreamRelay {
    pub fn new(http_client: Arc<dyn HttpClient>, config: RelayConfig) -> Self {
        Self {
            http_client,
            config,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Stop every running pump. Open bodies end after their buffered chunks.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Connect to `origin_url` and start relaying.
    ///
    /// Fails before any byte is relayed when the URL is not http(s), the
    /// origin cannot be reached, or it answers with a non-2xx status.
    #[instrument(skip(self, origin_url), fields(url = %redact_url(origin_url)))]
    pub async fn open(&self, station_id: &str, origin_url: &str) -> Result<RelayStream> {
        validate_stream_url(origin_url)?;

        let request = HttpRequest::get(origin_url)
            .header("User-Agent", self.config.user_agent.clone())
            .header("Range", "bytes=0-")
            .header("Accept-Encoding", "identity")
            .header("Connection", "keep-alive")
            .timeout(self.config.stall_timeout);

        let response = self.http_client.stream(request).await.map_err(|e| {
            warn!(station_id, error = %e, "Origin unreachable");
            StreamError::RelayUpstreamError {
                status: 500,
                message: format!("Failed to reach stream origin: {}", e),
            }
        })?;

        if !response.is_success() {
            let message = match response.reason.as_deref() {
                Some(reason) => format!("Origin responded with HTTP {}: {}", response.status, reason),
                None => format!("Origin responded with HTTP {}", response.status),
            };
            warn!(station_id, status = response.status, "Origin refused stream");
            return Err(StreamError::RelayUpstreamError {
                status: response.status,
                message,
            });
        }

        let content_type = response
            .header("content-type")
            .map(str::to_string)
            .unwrap_or_else(|| self.config.default_content_type.clone());
        let upstream_status = response.status;

        let (tx, rx) = mpsc::channel(self.config.buffer_chunks);
        let stall_timeout = self.config.stall_timeout;
        let cancel = self.shutdown.child_token();
        let station = station_id.to_string();

        tokio::spawn(async move {
            let summary = pump(response.body, tx, stall_timeout, cancel).await;
            match &summary.outcome {
                PumpOutcome::Interrupted(reason) => warn!(
                    station_id = %station,
                    bytes = summary.bytes,
                    chunks = summary.chunks,
                    reason = %reason,
                    "Relay interrupted"
                ),
                outcome => info!(
                    station_id = %station,
                    bytes = summary.bytes,
                    chunks = summary.chunks,
                    outcome = ?outcome,
                    "Relay finished"
                ),
            }
        });

        info!(station_id, content_type = %content_type, "Relay started");

        Ok(RelayStream {
            upstream_status,
            content_type,
            body: receiver_stream(rx),
        })
    }
}

fn receiver_stream(rx: mpsc::Receiver<Result<Bytes>>) -> RelayBody {
    futures::stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|item| (item, rx))
    })
    .boxed()
}

/// Copy `source` into `tx` until one side finishes.
///
/// At most one chunk is held outside the channel, so the number of chunks
/// read from `source` never exceeds those taken by the client plus the
/// channel capacity plus one. When the origin fails or stalls, a
/// [`StreamError::RelayTransferInterrupted`] is queued for the client.
pub async fn pump<S, E>(
    mut source: S,
    tx: mpsc::Sender<Result<Bytes>>,
    stall_timeout: Duration,
    cancel: CancellationToken,
) -> PumpSummary
where
    S: Stream<Item = std::result::Result<Bytes, E>> + Unpin,
    E: Display,
{
    let mut bytes = 0u64;
    let mut chunks = 0u64;

    let outcome = loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => break PumpOutcome::ClientDisconnected,
            _ = tx.closed() => break PumpOutcome::ClientDisconnected,
            next = tokio::time::timeout(stall_timeout, source.next()) => next,
        };

        let chunk = match next {
            Ok(Some(Ok(chunk))) => chunk,
            Ok(Some(Err(e))) => break PumpOutcome::Interrupted(e.to_string()),
            Ok(None) => break PumpOutcome::Completed,
            Err(_) => {
                break PumpOutcome::Interrupted(format!(
                    "No data from origin for {}ms",
                    stall_timeout.as_millis()
                ))
            }
        };

        if chunk.is_empty() {
            continue;
        }
        let len = chunk.len() as u64;

        tokio::select! {
            biased;
            _ = cancel.cancelled() => break PumpOutcome::ClientDisconnected,
            sent = tx.send(Ok(chunk)) => {
                if sent.is_err() {
                    break PumpOutcome::ClientDisconnected;
                }
            }
        }

        bytes += len;
        chunks += 1;
    };

    if let PumpOutcome::Interrupted(reason) = &outcome {
        // Wait for room so the client sees an aborted body rather than a clean end.
        let error = StreamError::RelayTransferInterrupted(reason.clone());
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {}
            _ = tx.send(Err(error)) => {}
        }
    }

    PumpSummary {
        bytes,
        chunks,
        outcome,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::{BridgeError, Result as BridgeResult};
    use bridge_traits::http::{HttpResponse, RetryPolicy, StreamingResponse};
    use futures::stream;
    use mockall::mock;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU64, Ordering};

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

    fn chunk(data: &'static [u8]) -> std::result::Result<Bytes, BridgeError> {
        Ok(Bytes::from_static(data))
    }

    fn streaming(status: u16, content_type: Option<&str>, chunks: Vec<&'static [u8]>) -> StreamingResponse {
        let mut headers = HashMap::new();
        if let Some(ct) = content_type {
            headers.insert("Content-Type".to_string(), ct.to_string());
        }
        StreamingResponse {
            status,
            reason: None,
            headers,
            body: stream::iter(chunks.into_iter().map(chunk)).boxed(),
        }
    }

    #[tokio::test]
    async fn test_open_relays_origin_bytes() {
        let mut client = MockClient::new();
        client
            .expect_stream()
            .withf(|req| {
                req.headers.get("Range").map(String::as_str) == Some("bytes=0-")
                    && req.headers.get("Accept-Encoding").map(String::as_str) == Some("identity")
            })
            .times(1)
            .returning(|_| Ok(streaming(206, Some("audio/aac"), vec![b"ab", b"cd"])));

        let relay = StreamRelay::new(Arc::new(client), RelayConfig::default());
        let opened = relay.open("s1", "http://ice.example/live").await.unwrap();
        assert_eq!(opened.upstream_status, 206);
        assert_eq!(opened.content_type, "audio/aac");

        let collected: Vec<Bytes> = opened.body.map(|r| r.unwrap()).collect().await;
        assert_eq!(collected.concat(), b"abcd");
    }

    #[tokio::test]
    async fn test_missing_content_type_defaults_to_mpeg() {
        let mut client = MockClient::new();
        client
            .expect_stream()
            .returning(|_| Ok(streaming(200, None, vec![b"x"])));

        let relay = StreamRelay::new(Arc::new(client), RelayConfig::default());
        let opened = relay.open("s1", "http://ice.example/live").await.unwrap();
        assert_eq!(opened.content_type, "audio/mpeg");
    }

    #[tokio::test]
    async fn test_origin_status_is_forwarded() {
        let mut client = MockClient::new();
        client.expect_stream().returning(|_| {
            let mut response = streaming(404, Some("text/html"), vec![]);
            response.reason = Some("Not Found".to_string());
            Ok(response)
        });

        let relay = StreamRelay::new(Arc::new(client), RelayConfig::default());
        let err = relay.open("s1", "http://ice.example/gone").await.unwrap_err();
        assert_eq!(
            err,
            StreamError::RelayUpstreamError {
                status: 404,
                message: "Origin responded with HTTP 404: Not Found".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_transport_failure_maps_to_500() {
        let mut client = MockClient::new();
        client
            .expect_stream()
            .returning(|_| Err(BridgeError::OperationFailed("Connection failed".into())));

        let relay = StreamRelay::new(Arc::new(client), RelayConfig::default());
        let err = relay.open("s1", "http://down.example/live").await.unwrap_err();
        assert_eq!(err.status_code(), 500);
    }

    #[tokio::test]
    async fn test_invalid_url_is_rejected_before_connecting() {
        let client = MockClient::new();
        let relay = StreamRelay::new(Arc::new(client), RelayConfig::default());
        let err = relay.open("s1", "file:///etc/passwd").await.unwrap_err();
        assert!(matches!(err, StreamError::InvalidUrl(_)));
    }

    #[tokio::test]
    async fn test_pump_completes() {
        let (tx, mut rx) = mpsc::channel(4);
        let source = stream::iter(vec![chunk(b"one"), chunk(b""), chunk(b"three")]);

        let summary = pump(source, tx, Duration::from_secs(30), CancellationToken::new()).await;
        assert_eq!(summary.outcome, PumpOutcome::Completed);
        assert_eq!(summary.chunks, 2);
        assert_eq!(summary.bytes, 8);

        assert_eq!(rx.recv().await.unwrap().unwrap(), Bytes::from_static(b"one"));
        assert_eq!(rx.recv().await.unwrap().unwrap(), Bytes::from_static(b"three"));
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_pump_respects_backpressure() {
        const CAPACITY: usize = 2;
        let pulled = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&pulled);
        let source = stream::iter(0..1_000u32).map(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            chunk(b"frame")
        });

        let (tx, mut rx) = mpsc::channel(CAPACITY);
        let task = tokio::spawn(pump(
            source,
            tx,
            Duration::from_secs(30),
            CancellationToken::new(),
        ));

        let mut consumed = 0u64;
        for _ in 0..50 {
            for _ in 0..5 {
                tokio::task::yield_now().await;
            }
            assert!(pulled.load(Ordering::SeqCst) <= consumed + CAPACITY as u64 + 1);
            rx.recv().await.unwrap().unwrap();
            consumed += 1;
        }

        drop(rx);
        let summary = task.await.unwrap();
        assert_eq!(summary.outcome, PumpOutcome::ClientDisconnected);
        assert!(pulled.load(Ordering::SeqCst) <= consumed + CAPACITY as u64 + 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pump_interrupts_stalled_origin() {
        let (tx, mut rx) = mpsc::channel(4);
        let source = stream::iter(vec![chunk(b"hello")]).chain(stream::pending());

        let task = tokio::spawn(pump(
            source,
            tx,
            Duration::from_secs(30),
            CancellationToken::new(),
        ));

        assert_eq!(rx.recv().await.unwrap().unwrap(), Bytes::from_static(b"hello"));
        let err = rx.recv().await.unwrap().unwrap_err();
        assert!(matches!(err, StreamError::RelayTransferInterrupted(_)));
        assert!(rx.recv().await.is_none());

        let summary = task.await.unwrap();
        assert_eq!(
            summary.outcome,
            PumpOutcome::Interrupted("No data from origin for 30000ms".to_string())
        );
    }

    #[tokio::test]
    async fn test_pump_surfaces_origin_error() {
        let (tx, mut rx) = mpsc::channel(4);
        let source = stream::iter(vec![
            chunk(b"a"),
            Err(BridgeError::OperationFailed("connection reset".into())),
            chunk(b"never"),
        ]);

        let summary = pump(source, tx, Duration::from_secs(30), CancellationToken::new()).await;
        assert!(matches!(summary.outcome, PumpOutcome::Interrupted(_)));
        assert_eq!(summary.chunks, 1);

        rx.recv().await.unwrap().unwrap();
        assert!(rx.recv().await.unwrap().is_err());
    }

    #[tokio::test]
    async fn test_interruption_reaches_client_behind_full_buffer() {
        let (tx, mut rx) = mpsc::channel(1);
        let source = stream::iter(vec![
            chunk(b"a"),
            chunk(b"b"),
            Err(BridgeError::OperationFailed("connection reset".into())),
        ]);

        let task = tokio::spawn(pump(
            source,
            tx,
            Duration::from_secs(30),
            CancellationToken::new(),
        ));

        assert_eq!(rx.recv().await.unwrap().unwrap(), Bytes::from_static(b"a"));
        // Let the pump refill the channel and hit the origin error.
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert_eq!(rx.recv().await.unwrap().unwrap(), Bytes::from_static(b"b"));
        let err = rx.recv().await.unwrap().unwrap_err();
        assert!(matches!(err, StreamError::RelayTransferInterrupted(_)));
        assert!(rx.recv().await.is_none());

        let summary = task.await.unwrap();
        assert!(matches!(summary.outcome, PumpOutcome::Interrupted(_)));
        assert_eq!(summary.chunks, 2);
    }

    #[tokio::test]
    async fn test_client_disconnect_releases_origin() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let source = stream::pending::<std::result::Result<Bytes, BridgeError>>();

        let summary = pump(source, tx, Duration::from_secs(30), CancellationToken::new()).await;
        assert_eq!(summary.outcome, PumpOutcome::ClientDisconnected);
        assert_eq!(summary.bytes, 0);
    }

    #[tokio::test]
    async fn test_shutdown_stops_pump() {
        let (tx, _rx) = mpsc::channel(1);
        let cancel = CancellationToken::new();
        let source = stream::repeat_with(|| chunk(b"loop"));

        let task = tokio::spawn(pump(source, tx, Duration::from_secs(30), cancel.clone()));
        tokio::task::yield_now().await;
        cancel.cancel();

        let summary = task.await.unwrap();
        assert_eq!(summary.outcome, PumpOutcome::ClientDisconnected);
    }
}
