use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::debug;

use crate::downloader::DownloadError;

#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
}

/// Error returned by every handler, rendered as `{success: false, error}`
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<DownloadError> for ApiError {
    fn from(error: DownloadError) -> Self {
        match &error {
            e if e.is_client_error() => Self::bad_request(e.to_string()),
            DownloadError::NotFound(name) => {
                debug!(file = %name, "artifact not found");
                Self::not_found("File not found")
            }
            DownloadError::ArtifactNotProduced { .. } => {
                Self::internal("Download failed: the file could not be found after downloading")
            }
            e => Self::internal(e.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(format!("Invalid request: {}", rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            success: false,
            error: self.message,
        });

        (self.status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::downloader::errors::UnavailableReason;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::from(DownloadError::MissingUrl).status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::from(DownloadError::UnsupportedPlatform).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(DownloadError::NotFound("x.mp4".into())).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(DownloadError::Blocked {
                detail: "429".into()
            })
            .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_friendly_messages_hide_raw_detail() {
        let err = ApiError::from(DownloadError::ContentUnavailable {
            reason: UnavailableReason::AgeRestricted,
            detail: "ERROR: [youtube] abc: Sign in to confirm your age".into(),
        });
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.message().contains("age-restricted"));
        assert!(!err.message().contains("[youtube]"));
    }
}
