use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Instant;
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info};

use atomkv_core::store::{AofLog, Store, Sweeper, SweeperConfig};

pub mod command;
pub mod net;
pub mod reply;
pub mod tracing_config;

use crate::tracing_config::TracingConfig;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 6379;
const DEFAULT_METRICS_PORT: u16 = 8080;
const DEFAULT_CAPACITY: usize = 10_000;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short = 'H', long, default_value = DEFAULT_HOST)]
    host: String,

    #[arg(short = 'P', long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Port for the HTTP metrics endpoint
    #[arg(long, default_value_t = DEFAULT_METRICS_PORT)]
    metrics_port: u16,

    /// Maximum number of live entries before LRU eviction kicks in
    #[arg(long, default_value_t = DEFAULT_CAPACITY)]
    capacity: usize,

    /// Path to the append-only log (default: ~/.atomkv/appendonly.aof)
    #[arg(long)]
    aof_path: Option<PathBuf>,

    /// Disable append-only logging
    #[arg(long, default_value_t = false)]
    no_aof: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Use JSON format for logs (recommended for production)
    #[arg(long)]
    log_json: bool,
}

fn default_aof_path() -> PathBuf {
    let home = std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    home.join(".atomkv").join("appendonly.aof")
}

pub async fn run() -> Result<()> {
    let args = Args::parse();

    let log_level = match args.log_level.to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    };

    TracingConfig {
        level: log_level,
        json_format: args.log_json,
        ..TracingConfig::default()
    }
    .init();

    // Initialize storage; failure to open the log is fatal
    let store = if args.no_aof {
        Store::new(args.capacity)
    } else {
        let aof_path = args.aof_path.clone().unwrap_or_else(default_aof_path);
        let aof = AofLog::open(&aof_path).with_context(|| {
            format!(
                "failed to open append-only log at {}",
                aof_path.display()
            )
        })?;
        let store = Store::with_aof(args.capacity, aof);

        info!(path = %aof_path.display(), "replaying append-only log");
        let start = Instant::now();
        let count = store
            .replay_log()
            .with_context(|| format!("failed to replay {}", aof_path.display()))?;
        info!(
            count,
            duration_ms = start.elapsed().as_millis() as u64,
            "append-only log replay completed"
        );
        store
    };

    let sweeper = Sweeper::spawn(store.clone(), SweeperConfig::default());

    info!(
        host = %args.host,
        port = args.port,
        metrics_port = args.metrics_port,
        capacity = args.capacity,
        aof_enabled = store.aof_enabled(),
        "starting AtomKV server"
    );

    // Channel broadcasting the shutdown signal to all components
    let (shutdown_tx, shutdown_rx) = watch::channel(());

    let metrics_addr: SocketAddr = format!("{}:{}", args.host, args.metrics_port)
        .parse()
        .context("invalid metrics address")?;
    let metrics_server = net::metrics::MetricsServer::new(store.clone(), metrics_addr);
    let metrics_shutdown_rx = shutdown_rx.clone();
    tokio::spawn(async move {
        if let Err(e) = metrics_server.run_with_shutdown(metrics_shutdown_rx).await {
            error!(error = %e, "metrics endpoint error");
        }
    });

    let shutdown_tx_for_signal = shutdown_tx.clone();
    tokio::spawn(async move {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "failed to listen for shutdown signal");
            return;
        }
        info!("received shutdown signal, initiating graceful shutdown");
        if let Err(e) = shutdown_tx_for_signal.send(()) {
            error!(error = %e, "failed to broadcast shutdown signal");
        }
    });

    // Run the TCP server; returning means the accept loop has stopped and
    // all connection tasks are joined
    let addr = format!("{}:{}", args.host, args.port);
    let server = net::Server::new(store.clone());
    server.run_with_shutdown(&addr, shutdown_rx.clone()).await?;

    // Shutdown order: sockets are closed, then the sweeper stops, then the
    // log queue drains
    sweeper.shutdown();
    sweeper.wait().await;
    store.close().await;

    info!("server shutdown complete");
    Ok(())
}
