//! Core service façade and bootstrap helpers.
//!
//! This crate wires the directory client, the stream health prober and the
//! stream relay into one HTTP backend. The `radio-server` binary (behind the
//! `desktop-shims` feature, which supplies the reqwest-backed `HttpClient`)
//! is a thin wrapper over [`bootstrap`] and [`CoreService::run`].

pub mod api;
pub mod error;

pub use api::{create_router, AppState};
pub use error::{CoreError, Result};

use std::future::Future;
use std::sync::Arc;

use axum::Router;
use bridge_traits::http::HttpClient;
use core_runtime::config::CoreConfig;
use core_stream::{HealthProber, ProbeConfig, RelayConfig, StreamHealthCheck, StreamRelay};
use provider_radio_browser::{RadioBrowserConnector, StationDirectory};
use tokio::net::TcpListener;

/// Aggregated handle to the components the backend serves.
pub struct CoreDependencies {
    pub http_client: Arc<dyn HttpClient>,
    pub directory: Arc<dyn StationDirectory>,
    pub prober: Arc<dyn StreamHealthCheck>,
    pub relay: Arc<StreamRelay>,
}

impl CoreDependencies {
    /// Construct a dependency bundle from explicit handles.
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        directory: Arc<dyn StationDirectory>,
        prober: Arc<dyn StreamHealthCheck>,
        relay: Arc<StreamRelay>,
    ) -> Self {
        Self {
            http_client,
            directory,
            prober,
            relay,
        }
    }

    /// Build every component from a validated [`CoreConfig`].
    pub fn from_config(config: &CoreConfig) -> Result<Self> {
        let probe_config = ProbeConfig::from_core(config);
        probe_config
            .validate()
            .map_err(CoreError::InitializationFailed)?;
        let relay_config = RelayConfig::from_core(config);
        relay_config
            .validate()
            .map_err(CoreError::InitializationFailed)?;

        let http_client = Arc::clone(&config.http_client);
        Ok(Self {
            directory: Arc::new(RadioBrowserConnector::from_config(config)),
            prober: Arc::new(HealthProber::new(Arc::clone(&http_client), probe_config)),
            relay: Arc::new(StreamRelay::new(Arc::clone(&http_client), relay_config)),
            http_client,
        })
    }
}

/// Primary façade exposed to the binary and to embedding hosts.
#[derive(Clone)]
pub struct CoreService {
    deps: Arc<CoreDependencies>,
}

impl CoreService {
    /// Create a new service from the provided dependencies.
    pub fn new(deps: CoreDependencies) -> Self {
        Self {
            deps: Arc::new(deps),
        }
    }

    /// Access the dependencies being used by the service.
    pub fn dependencies(&self) -> Arc<CoreDependencies> {
        Arc::clone(&self.deps)
    }

    pub fn state(&self) -> AppState {
        AppState::new(
            Arc::clone(&self.deps.directory),
            Arc::clone(&self.deps.prober),
            Arc::clone(&self.deps.relay),
        )
    }

    pub fn router(&self) -> Router {
        create_router(self.state())
    }

    /// Serve until `shutdown` resolves, then stop every running relay.
    pub async fn run<F>(&self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        api::serve(listener, self.router(), Arc::clone(&self.deps.relay), shutdown).await?;
        Ok(())
    }
}

/// Build a [`CoreService`] from configuration.
///
/// ```no_run
/// # async fn example() -> core_service::Result<()> {
/// use core_runtime::config::CoreConfig;
///
/// let config = CoreConfig::builder().build()?;
/// let core = core_service::bootstrap(&config)?;
/// let router = core.router();
/// # let _ = router;
/// # Ok(())
/// # }
/// ```
pub fn bootstrap(config: &CoreConfig) -> Result<CoreService> {
    Ok(CoreService::new(CoreDependencies::from_config(config)?))
}
