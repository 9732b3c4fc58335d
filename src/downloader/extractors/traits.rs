// Extractor trait and common types

use async_trait::async_trait;
use serde::Deserialize;
use std::fmt;

use crate::downloader::errors::DownloadError;
use crate::downloader::models::{ExtractionJobSpec, MediaInfo};

/// Extraction mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractorMode {
    /// Python module yt_dlp (better for YouTube, avoids bot detection)
    Python,
    /// CLI binary yt-dlp (faster, no Python dependency)
    Cli,
    /// Auto-select: CLI → Python fallback
    #[default]
    Auto,
}

impl fmt::Display for ExtractorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Python => write!(f, "python"),
            Self::Cli => write!(f, "cli"),
            Self::Auto => write!(f, "auto"),
        }
    }
}

/// Options for metadata-only lookups
#[derive(Debug, Clone)]
pub struct InfoOptions {
    /// SOCKS5/HTTP proxy URL
    pub proxy: Option<String>,
    /// Path to cookies.txt file
    pub cookies_path: Option<String>,
    /// Passed to yt-dlp as `--socket-timeout`
    pub timeout_seconds: u32,
    pub user_agent: Option<String>,
}

impl Default for InfoOptions {
    fn default() -> Self {
        Self {
            proxy: None,
            cookies_path: None,
            timeout_seconds: 30,
            user_agent: None,
        }
    }
}

impl InfoOptions {
    pub fn with_proxy(mut self, proxy: Option<String>) -> Self {
        self.proxy = proxy;
        self
    }

    pub fn with_cookies_path(mut self, path: Option<String>) -> Self {
        self.cookies_path = path;
        self
    }

    pub fn with_timeout(mut self, seconds: u32) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    pub fn with_user_agent(mut self, user_agent: Option<String>) -> Self {
        self.user_agent = user_agent;
        self
    }
}

/// What the extractor reports after a successful download
#[derive(Debug, Clone)]
pub struct ExtractionOutput {
    pub info: MediaInfo,
    /// Path the extractor says it wrote. Post-processing may have changed the
    /// extension afterwards, so this is only a hint.
    pub path_hint: Option<String>,
}

/// Failure reported by an extractor backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractorFailure {
    /// The backend cannot run at all (binary or module missing, spawn failed)
    Unavailable(String),
    /// The backend ran and failed; raw upstream error text
    Upstream(String),
    /// The backend succeeded but its output was unreadable
    Malformed(String),
}

impl fmt::Display for ExtractorFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable(msg) => write!(f, "extractor unavailable: {}", msg),
            Self::Upstream(msg) => write!(f, "{}", msg),
            Self::Malformed(msg) => write!(f, "malformed extractor output: {}", msg),
        }
    }
}

impl From<ExtractorFailure> for DownloadError {
    fn from(failure: ExtractorFailure) -> Self {
        match failure {
            ExtractorFailure::Unavailable(msg) => DownloadError::ToolNotFound(msg),
            ExtractorFailure::Upstream(msg) => DownloadError::Extractor(msg),
            ExtractorFailure::Malformed(msg) => DownloadError::ParseError(msg),
        }
    }
}

/// Opaque media extractor: retrieval, post-processing and metadata
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Name of the extractor (for logging)
    fn name(&self) -> &'static str;

    /// Check if this extractor is available
    fn is_available(&self) -> bool;

    /// Fetch metadata without downloading
    async fn fetch_info(&self, url: &str, options: &InfoOptions)
        -> Result<MediaInfo, ExtractorFailure>;

    /// Download one artifact according to the job spec
    async fn download(
        &self,
        url: &str,
        spec: &ExtractionJobSpec,
    ) -> Result<ExtractionOutput, ExtractorFailure>;
}
