//! Radio relay backend - main entry point
//!
//! Serves the station directory, stream health checks and the audio relay
//! over HTTP.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use bridge_traits::log::LogLevel;
use clap::Parser;
use core_runtime::config::{CoreConfig, DEFAULT_BIND_ADDRESS, DEFAULT_USER_AGENT};
use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};

/// Command-line arguments for radio-server
#[derive(Parser, Debug)]
#[command(name = "radio-server")]
#[command(about = "Radio station directory and stream relay backend")]
#[command(version)]
struct Args {
    /// Address to listen on
    #[arg(short, long, default_value = DEFAULT_BIND_ADDRESS, env = "RADIO_BIND")]
    bind: SocketAddr,

    /// Directory mirrors in failover order (comma separated)
    #[arg(long, env = "RADIO_MIRRORS", value_delimiter = ',')]
    mirrors: Vec<String>,

    /// trace, debug, info, warn or error
    #[arg(long, default_value = "info", env = "RADIO_LOG_LEVEL")]
    log_level: LogLevel,

    /// pretty, json or compact
    #[arg(long, env = "RADIO_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    /// Full filter directive, overrides --log-level
    #[arg(long, env = "RADIO_LOG_FILTER")]
    log_filter: Option<String>,

    #[arg(long, default_value = DEFAULT_USER_AGENT, env = "RADIO_USER_AGENT")]
    user_agent: String,

    /// Per-mirror directory timeout in milliseconds
    #[arg(long, default_value = "15000", env = "RADIO_DIRECTORY_TIMEOUT_MS")]
    directory_timeout_ms: u64,

    /// Health probe timeout in milliseconds
    #[arg(long, default_value = "10000", env = "RADIO_PROBE_TIMEOUT_MS")]
    probe_timeout_ms: u64,

    /// Chunks buffered per relayed stream
    #[arg(long, default_value = "8", env = "RADIO_RELAY_BUFFER")]
    relay_buffer: usize,

    /// Abort a relay after this many seconds without origin data
    #[arg(long, default_value = "30", env = "RADIO_STALL_TIMEOUT_SECS")]
    stall_timeout_secs: u64,
}

impl Args {
    fn logging(&self) -> LoggingConfig {
        let mut config = LoggingConfig::default().with_level(self.log_level);
        if let Some(format) = self.log_format {
            config = config.with_format(format);
        }
        if let Some(filter) = &self.log_filter {
            config = config.with_filter(filter.clone());
        }
        config
    }

    fn core_config(&self) -> Result<CoreConfig> {
        let mut builder = CoreConfig::builder()
            .bind_address(self.bind)
            .user_agent(self.user_agent.clone())
            .directory_timeout(Duration::from_millis(self.directory_timeout_ms))
            .probe_timeout(Duration::from_millis(self.probe_timeout_ms))
            .relay_buffer_chunks(self.relay_buffer)
            .relay_stall_timeout(Duration::from_secs(self.stall_timeout_secs));

        if !self.mirrors.is_empty() {
            builder = builder.mirrors(self.mirrors.iter().map(String::as_str));
        }

        builder.build().context("Invalid configuration")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.logging()).context("Failed to initialize logging")?;

    let config = args.core_config()?;
    info!(
        bind = %config.bind_address,
        mirrors = ?config.mirrors,
        "Starting radio relay backend"
    );

    let core = core_service::bootstrap(&config).context("Failed to initialize backend")?;

    let listener = TcpListener::bind(config.bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_address))?;

    core.run(listener, shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Radio relay backend stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}
