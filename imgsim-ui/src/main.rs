//! imgsim-ui - Image similarity search client
//!
//! Serves the local HTTP surface the browser presentation layer uses to
//! search for similar images, register images into the index, and watch
//! the remote service's metrics.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use imgsim_common::events::EventBus;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter};

use imgsim_ui::client::{ApiClient, SimilarityService};
use imgsim_ui::config::{CliOverrides, Config, DEFAULT_LOG_FILTER};
use imgsim_ui::monitor::MetricsPoller;
use imgsim_ui::workflow::WorkflowController;
use imgsim_ui::AppState;

/// Command-line arguments for imgsim-ui
#[derive(Parser, Debug)]
#[command(name = "imgsim-ui")]
#[command(about = "Browser client for the image similarity-search service")]
#[command(version)]
struct Args {
    /// Port for the local HTTP surface (default 5780)
    #[arg(short, long, env = "IMGSIM_UI_PORT")]
    port: Option<u16>,

    /// Remote service base URL, e.g. http://localhost:8000/api/v1
    #[arg(long)]
    api_base_url: Option<String>,

    /// Path to the TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Metrics poll period in seconds (5-30)
    #[arg(long)]
    poll_interval_secs: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing; the filter may be replaced once config is loaded
    let rust_log_set = std::env::var_os("RUST_LOG").is_some();
    let (filter, filter_handle) = reload::Layer::new(
        EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
    );
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    info!("Starting imgsim-ui");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config = Config::load(&CliOverrides {
        config_path: args.config,
        api_base_url: args.api_base_url,
        port: args.port,
        poll_interval_secs: args.poll_interval_secs,
    })
    .context("Failed to load configuration")?;

    if !rust_log_set && config.log_level.is_some() {
        let directives = config.log_filter();
        match EnvFilter::try_new(&directives) {
            Ok(filter) => {
                if let Err(e) = filter_handle.reload(filter) {
                    warn!("Failed to apply log_level: {}", e);
                }
            }
            Err(e) => warn!("Ignoring invalid log_level '{}': {}", directives, e),
        }
    }

    let client = ApiClient::new(&config.api_base_url).context("Failed to create API client")?;
    info!("Similarity service: {}", client.base_url());
    let service: Arc<dyn SimilarityService> = Arc::new(client);

    let event_bus = EventBus::new(100);
    debug!("Event bus capacity: {}", event_bus.capacity());
    let controller = Arc::new(WorkflowController::new(
        Arc::clone(&service),
        config.search,
        event_bus.clone(),
    ));
    let poller = Arc::new(MetricsPoller::new(
        Arc::clone(&service),
        config.poll_interval,
        event_bus.clone(),
    ));

    let shutdown = CancellationToken::new();
    let poller_task = Arc::clone(&poller).spawn(shutdown.clone());
    info!("Metrics poller started (every {}s)", poller.interval().as_secs());

    let state = AppState::new(controller, poller, event_bus, config.api_base_url.clone());
    let app = imgsim_ui::build_router(state);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    shutdown.cancel();
    if let Err(e) = poller_task.await {
        warn!("Metrics poller task ended abnormally: {}", e);
    }

    info!("Shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
