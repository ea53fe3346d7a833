//! Router and listener

use std::future::Future;
use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use core_stream::{StreamHealthCheck, StreamRelay};
use provider_radio_browser::StationDirectory;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use super::handlers;

/// Shared handles for every request.
#[derive(Clone)]
pub struct AppState {
    pub directory: Arc<dyn StationDirectory>,
    pub prober: Arc<dyn StreamHealthCheck>,
    pub relay: Arc<StreamRelay>,
}

impl AppState {
    pub fn new(
        directory: Arc<dyn StationDirectory>,
        prober: Arc<dyn StreamHealthCheck>,
        relay: Arc<StreamRelay>,
    ) -> Self {
        Self {
            directory,
            prober,
            relay,
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/stations/search", get(handlers::search_stations))
        .route("/api/stations/top/:count", get(handlers::top_stations))
        .route("/api/stations/:country", get(handlers::stations_by_country))
        .route("/api/languages", get(handlers::languages))
        .route("/api/tags", get(handlers::tags))
        .route("/api/stream/check/:station_id", get(handlers::check_stream))
        .route("/api/stream/:station_id", get(handlers::relay_stream))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve `router` on `listener` until `shutdown` resolves. Running relays are
/// cancelled once the signal fires.
pub async fn serve<F>(
    listener: TcpListener,
    router: Router,
    relay: Arc<StreamRelay>,
    shutdown: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(address) = listener.local_addr() {
        info!(address = %address, "HTTP backend listening");
    }

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            shutdown.await;
            info!("Shutdown requested, stopping relays");
            relay.shutdown();
        })
        .await
}
