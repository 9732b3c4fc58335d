// HTTP API - axum router and shared handler state

pub mod error;
pub mod handlers;

use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::downloader::tools::ToolInfo;
use crate::downloader::DownloadOrchestrator;

pub use error::ApiError;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<DownloadOrchestrator>,
    /// Extractor backend names in fallback order
    pub backends: Arc<Vec<&'static str>>,
    /// Tool detection snapshot taken at startup
    pub tools: Arc<Vec<ToolInfo>>,
}

impl AppState {
    pub fn new(orchestrator: DownloadOrchestrator) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            backends: Arc::new(Vec::new()),
            tools: Arc::new(Vec::new()),
        }
    }

    pub fn with_backends(mut self, backends: Vec<&'static str>) -> Self {
        self.backends = Arc::new(backends);
        self
    }

    pub fn with_tools(mut self, tools: Vec<ToolInfo>) -> Self {
        self.tools = Arc::new(tools);
        self
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::home))
        .route("/api/download", post(handlers::download))
        .route("/api/file/:name", get(handlers::file))
        .route("/api/info", post(handlers::media_info))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
