use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use a11y_scan_engine::config::{Config, ScanConfig};
use a11y_scan_engine::routes::router;
use a11y_scan_engine::services::{select_fetcher, Scanner};
use a11y_scan_engine::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));
    if config.log_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer())
            .with(filter)
            .init();
    }

    info!("Starting A11y Scan Engine v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration loaded");
    info!("  Port: {}", config.api_port);
    info!("  Browser enabled: {}", config.use_browser);

    let scan_config = ScanConfig::load(config.scan_config_path.as_deref())?;
    info!("  Max concurrent scans: {}", scan_config.max_concurrent_scans);
    info!("  Timeout: {}s, retries: {}", scan_config.timeout, scan_config.max_retries);

    info!("Initializing services...");

    let fetcher = select_fetcher(&config, &scan_config).await?;
    info!("Page fetcher initialized: {}", fetcher.name());

    let scanner = Arc::new(Scanner::with_defaults(fetcher, scan_config));
    info!("Scanner initialized with {} checks", scanner.check_names().len());

    let state = AppState {
        config: config.clone(),
        scanner: Arc::clone(&scanner),
    };

    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.api_port));
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Err(e) = scanner.close().await {
        warn!("Failed to close page fetcher: {}", e);
    }

    info!("Server shutdown complete");
    Ok(())
}

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
            info!("Received Ctrl+C, initiating shutdown...");
        },
        _ = terminate => {
            info!("Received terminate signal, initiating shutdown...");
        },
    }
}
