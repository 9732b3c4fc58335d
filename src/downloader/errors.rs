// Error types for the download pipeline

use thiserror::Error;

use super::platform::Platform;

/// Why a piece of content cannot be fetched at all
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnavailableReason {
    /// Private video requiring authorization
    Private,
    /// Age-restricted content (needs login)
    AgeRestricted,
    /// Deleted, taken down or otherwise unavailable
    Removed,
}

impl UnavailableReason {
    /// Friendly message shown to API clients
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Private => "This video is private and cannot be downloaded.",
            Self::AgeRestricted => {
                "This video is age-restricted and cannot be downloaded without signing in."
            }
            Self::Removed => "This video is unavailable. It may have been removed or deleted.",
        }
    }
}

#[derive(Debug, Error)]
pub enum DownloadError {
    /// Request body carried no URL
    #[error("URL not provided")]
    MissingUrl,

    /// URL does not belong to any supported platform
    #[error("Unsupported platform. Supported platforms: {}", Platform::supported_list())]
    UnsupportedPlatform,

    /// Malformed request (bad JSON, unknown format or quality)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The platform challenged the extractor (bot check, sign-in wall, 429)
    #[error("The platform is temporarily blocking downloads. Please try again in a few minutes.")]
    Blocked { detail: String },

    /// Content exists but cannot be fetched
    #[error("{}", .reason.user_message())]
    ContentUnavailable {
        reason: UnavailableReason,
        detail: String,
    },

    /// The extractor reported success but no file could be found on disk
    #[error("The download finished but the file was not produced")]
    ArtifactNotProduced { job_id: String },

    /// Requested artifact does not exist (never created or already swept)
    #[error("File not found: {0}")]
    NotFound(String),

    /// yt-dlp or python not found in system
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// Failed to parse yt-dlp JSON output
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Any other extractor failure, message passed through as-is
    #[error("{0}")]
    Extractor(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl DownloadError {
    /// Whether the client is at fault
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::MissingUrl | Self::UnsupportedPlatform | Self::InvalidRequest(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, DownloadError>;
