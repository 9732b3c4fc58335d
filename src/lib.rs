pub mod api;
pub mod config;
pub mod downloader;
pub mod logging;
pub mod storage;

use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::{ConfigError, Settings};
use crate::downloader::{build_extractor, DownloadError, DownloadOrchestrator, Extractor, ToolManager};
use crate::storage::{ArtifactStore, RetentionSweeper};

/// Why the server could not start or stopped abnormally
#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("storage directory unusable: {0}")]
    Storage(#[from] DownloadError),

    #[error("could not bind {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        source: std::io::Error,
    },

    #[error("HTTP server error: {0}")]
    Serve(std::io::Error),
}

/// Load settings, start the sweeper and serve HTTP until ctrl-c.
pub async fn run() -> Result<(), ServerError> {
    let settings = Settings::load()?;
    logging::init_logging(&settings.server.log_filter);

    let store = ArtifactStore::new(&settings.storage.download_dir)?;
    info!(dir = %store.root().display(), "storage ready");

    let tools = ToolManager::new(
        settings.extractor.ytdlp_path.clone(),
        settings.extractor.python_path.clone(),
    );
    let detected = tokio::task::spawn_blocking({
        let tools = tools.clone();
        move || tools.log_status()
    })
    .await
    .unwrap_or_else(|error| {
        warn!("tool detection failed: {error}");
        Vec::new()
    });

    let chain = build_extractor(&settings.extractor, &tools);
    let backends = chain.backend_names();
    info!(mode = %settings.extractor.mode, backends = ?backends, "extractor configured");

    // Availability checks spawn processes; run them once off the async workers
    let chain = Arc::new(chain);
    let checker = chain.clone();
    match tokio::task::spawn_blocking(move || checker.is_available()).await {
        Ok(true) => {}
        Ok(false) => warn!("no extractor backend is available, downloads will fail"),
        Err(error) => warn!("extractor availability check failed: {error}"),
    }

    let orchestrator = DownloadOrchestrator::new(chain, store.clone(), settings.extractor.clone());
    let state = api::AppState::new(orchestrator)
        .with_backends(backends)
        .with_tools(detected);

    let shutdown = CancellationToken::new();
    let sweeper = RetentionSweeper::new(
        store.root(),
        settings.storage.retention(),
        settings.storage.sweep_interval(),
    )
    .spawn(shutdown.clone());

    let addr = settings.server.bind_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;
    info!("listening on http://{addr}");

    let served = axum::serve(listener, api::router(state))
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .await
        .map_err(ServerError::Serve);

    shutdown.cancel();
    if let Err(error) = sweeper.await {
        warn!("retention sweeper ended abnormally: {error}");
    }

    info!("server stopped");
    served
}

async fn shutdown_signal(token: CancellationToken) {
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(error) = result {
                warn!("could not listen for ctrl-c: {error}");
                // Keep serving until something else cancels
                token.cancelled().await;
            }
        }
        _ = token.cancelled() => {}
    }
    info!("shutting down");
}
