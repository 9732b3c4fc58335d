use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tempfile::TempDir;
use tower::ServiceExt;

use video_fetch_lib::api::{router, AppState};
use video_fetch_lib::config::ExtractorSettings;
use video_fetch_lib::downloader::extractors::{ExtractionOutput, Extractor, ExtractorFailure, InfoOptions};
use video_fetch_lib::downloader::models::{ExtractionJobSpec, MediaInfo};
use video_fetch_lib::downloader::DownloadOrchestrator;
use video_fetch_lib::storage::{ArtifactStore, RetentionSweeper};

/// Behaves like yt-dlp with `-x --audio-format mp3`: the reported file name
/// still carries the source extension while the transcoded file sits on disk.
struct FakeYtDlp;

#[async_trait]
impl Extractor for FakeYtDlp {
    fn name(&self) -> &'static str {
        "fake-yt-dlp"
    }

    fn is_available(&self) -> bool {
        true
    }

    async fn fetch_info(&self, _url: &str, _options: &InfoOptions) -> Result<MediaInfo, ExtractorFailure> {
        Ok(MediaInfo {
            id: "dQw4w9WgXcQ".to_string(),
            title: "Test Song".to_string(),
            uploader: Some("Someone".to_string()),
            duration: Some(213.0),
            thumbnail: Some("https://i.ytimg.com/vi/dQw4w9WgXcQ/hq.jpg".to_string()),
        })
    }

    async fn download(&self, _url: &str, spec: &ExtractionJobSpec) -> Result<ExtractionOutput, ExtractorFailure> {
        let base = spec
            .output_template
            .replace("%(title).80B", "Test Song")
            .replace(".%(ext)s", "");
        let ext = spec.expected_extension().unwrap_or("webm");

        tokio::fs::write(format!("{base}.{ext}"), b"ID3 fake audio bytes")
            .await
            .map_err(|e| ExtractorFailure::Upstream(e.to_string()))?;

        Ok(ExtractionOutput {
            info: MediaInfo {
                title: "Test Song".to_string(),
                ..Default::default()
            },
            path_hint: Some(format!("{base}.webm")),
        })
    }
}

fn app() -> (TempDir, ArtifactStore, Router) {
    let dir = TempDir::new().unwrap();
    let store = ArtifactStore::new(dir.path().join("downloads")).unwrap();
    let orchestrator =
        DownloadOrchestrator::new(Arc::new(FakeYtDlp), store.clone(), ExtractorSettings::default());
    let app = router(AppState::new(orchestrator).with_backends(vec!["fake-yt-dlp"]));
    (dir, store, app)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn age_all_files(dir: &Path, age: Duration) {
    for entry in std::fs::read_dir(dir).unwrap() {
        let file = std::fs::File::options()
            .write(true)
            .open(entry.unwrap().path())
            .unwrap();
        file.set_modified(SystemTime::now() - age).unwrap();
    }
}

#[tokio::test]
async fn test_home_reports_online() {
    let (_dir, _store, app) = app();

    let response = app.oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["status"], "online");
    assert_eq!(body["platforms"].as_array().unwrap().len(), 5);
    assert_eq!(body["tools"]["extractor_available"], true);
}

#[tokio::test]
async fn test_audio_download_is_served_then_expires() {
    let (_dir, store, app) = app();

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/download",
            json!({"url": "https://www.youtube.com/watch?v=dQw4w9WgXcQ", "format": "audio"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["platform"], "youtube");
    assert_eq!(body["title"], "Test Song");
    let filename = body["filename"].as_str().unwrap();
    assert!(filename.ends_with("_Test Song.mp3"), "{filename}");
    let download_url = body["download_url"].as_str().unwrap().to_string();
    assert!(download_url.starts_with("/api/file/"));

    let response = app.clone().oneshot(get(&download_url)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "audio/mpeg");
    assert!(response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .starts_with("attachment;"));
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"ID3 fake audio bytes");

    age_all_files(store.root(), Duration::from_secs(3601));
    let report = RetentionSweeper::new(store.root(), Duration::from_secs(3600), Duration::from_secs(600))
        .sweep_once(SystemTime::now())
        .await;
    assert_eq!(report.removed, 1);

    let response = app.oneshot(get(&download_url)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = json_body(response).await;
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_unsupported_platform_is_rejected() {
    let (_dir, store, app) = app();

    let response = app
        .oneshot(post_json(
            "/api/download",
            json!({"url": "https://vimeo.com/76979871", "format": "video", "quality": "1080p"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = json_body(response).await;
    assert_eq!(body["success"], false);
    let error = body["error"].as_str().unwrap();
    for name in ["YouTube", "TikTok", "Instagram", "Twitter/X", "Facebook"] {
        assert!(error.contains(name), "{error}");
    }
    assert_eq!(std::fs::read_dir(store.root()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_missing_url_is_rejected() {
    let (_dir, _store, app) = app();

    let response = app
        .clone()
        .oneshot(post_json("/api/download", json!({"format": "video"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["success"], false);

    let response = app
        .oneshot(post_json("/api/info", json!({"url": ""})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_body_is_rejected() {
    let (_dir, _store, app) = app();

    let response = app
        .oneshot(post_json(
            "/api/download",
            json!({"url": "https://youtu.be/abc", "quality": "8k"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["success"], false);
}

#[tokio::test]
async fn test_info_returns_metadata() {
    let (_dir, _store, app) = app();

    let response = app
        .oneshot(post_json("/api/info", json!({"url": "https://youtu.be/dQw4w9WgXcQ"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["title"], "Test Song");
    assert_eq!(body["duration"], 213.0);
    assert_eq!(body["uploader"], "Someone");
    assert_eq!(body["platform"], "youtube");
}

#[tokio::test]
async fn test_traversal_names_are_not_served() {
    let (dir, _store, app) = app();
    std::fs::write(dir.path().join("secret.txt"), "secret").unwrap();

    for uri in [
        "/api/file/..%2Fsecret.txt",
        "/api/file/..%5Csecret.txt",
        "/api/file/%2E%2E",
        "/api/file/secret.txt",
    ] {
        let response = app.clone().oneshot(get(uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
    }
}
