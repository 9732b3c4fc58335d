use axum::body::Body;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::{HeaderMap, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use tokio_util::io::ReaderStream;
use tracing::info;

use super::error::ApiError;
use super::AppState;
use crate::downloader::tools::ToolInfo;
use crate::downloader::{DownloadRequest, Platform};
use crate::storage::{content_disposition, content_type_for_filename};

#[derive(Debug, Serialize)]
pub struct HomeResponse {
    pub message: &'static str,
    pub status: &'static str,
    pub platforms: Vec<&'static str>,
    pub tools: ToolsStatus,
}

#[derive(Debug, Serialize)]
pub struct ToolsStatus {
    pub extractor_available: bool,
    pub backends: Vec<&'static str>,
    pub detected: Vec<ToolInfo>,
}

#[derive(Debug, Serialize)]
pub struct DownloadResponse {
    pub success: bool,
    pub message: &'static str,
    pub filename: String,
    pub title: String,
    pub platform: Platform,
    pub download_url: String,
}

#[derive(Debug, Deserialize)]
pub struct InfoRequest {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct InfoResponse {
    pub success: bool,
    pub title: String,
    pub duration: Option<f64>,
    pub thumbnail: Option<String>,
    pub uploader: Option<String>,
    pub platform: Platform,
}

pub async fn home(State(state): State<AppState>) -> Json<HomeResponse> {
    let extractor = state.orchestrator.extractor();

    Json(HomeResponse {
        message: "Video download backend is running",
        status: "online",
        platforms: Platform::SUPPORTED.iter().map(|p| p.as_str()).collect(),
        tools: ToolsStatus {
            extractor_available: extractor.is_available(),
            backends: state.backends.as_ref().clone(),
            detected: state.tools.as_ref().clone(),
        },
    })
}

pub async fn download(
    State(state): State<AppState>,
    payload: Result<Json<DownloadRequest>, JsonRejection>,
) -> Result<Json<DownloadResponse>, ApiError> {
    let Json(request) = payload?;
    let outcome = state.orchestrator.handle(request).await?;

    let download_url = format!(
        "/api/file/{}",
        urlencoding::encode(&outcome.artifact_name)
    );

    Ok(Json(DownloadResponse {
        success: true,
        message: "Video downloaded successfully",
        filename: outcome.artifact_name,
        title: outcome.title,
        platform: outcome.platform,
        download_url,
    }))
}

pub async fn file(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Response, ApiError> {
    let path = state.orchestrator.store().resolve(&name).await?;

    // The sweeper may have removed it since resolve
    let file = match tokio::fs::File::open(&path).await {
        Ok(file) => file,
        Err(error) if error.kind() == ErrorKind::NotFound => {
            return Err(ApiError::not_found("File not found"))
        }
        Err(error) => return Err(ApiError::internal(format!("Could not open file: {error}"))),
    };
    let length = file
        .metadata()
        .await
        .map_err(|error| ApiError::internal(format!("Could not read file: {error}")))?
        .len();

    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("download.bin")
        .to_string();

    let mut headers = HeaderMap::new();
    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_static(content_type_for_filename(&filename)),
    );
    headers.insert(CONTENT_LENGTH, HeaderValue::from(length));
    headers.insert(
        CONTENT_DISPOSITION,
        HeaderValue::from_str(&content_disposition(&filename))
            .map_err(|_| ApiError::internal("Could not build the download header"))?,
    );

    info!(file = %filename, bytes = length, "serving artifact");

    let body = Body::from_stream(ReaderStream::new(file));
    Ok((headers, body).into_response())
}

pub async fn media_info(
    State(state): State<AppState>,
    payload: Result<Json<InfoRequest>, JsonRejection>,
) -> Result<Json<InfoResponse>, ApiError> {
    let Json(request) = payload?;
    let (info, platform) = state.orchestrator.info(request.url.as_deref()).await?;

    Ok(Json(InfoResponse {
        success: true,
        title: info.title,
        duration: info.duration,
        thumbnail: info.thumbnail,
        uploader: info.uploader,
        platform,
    }))
}
