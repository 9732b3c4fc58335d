// Common data models for downloader

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::platform::Platform;

/// What the client wants out of the video
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    #[default]
    Video,
    Audio,
}

/// Resolution ceiling selected by the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum QualityTier {
    #[serde(rename = "360p")]
    P360,
    #[serde(rename = "480p")]
    P480,
    #[default]
    #[serde(rename = "720p")]
    P720,
    #[serde(rename = "1080p")]
    P1080,
    #[serde(rename = "highest", alias = "best")]
    Highest,
}

impl QualityTier {
    /// Maximum video height for this tier, `None` means unbounded
    pub fn height_bound(&self) -> Option<u32> {
        match self {
            Self::P360 => Some(360),
            Self::P480 => Some(480),
            Self::P720 => Some(720),
            Self::P1080 => Some(1080),
            Self::Highest => None,
        }
    }
}

/// Body of `POST /api/download`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DownloadRequest {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default, rename = "format")]
    pub media_kind: MediaKind,
    #[serde(default)]
    pub quality: QualityTier,
}

impl DownloadRequest {
    pub fn new(url: impl Into<String>, media_kind: MediaKind, quality: QualityTier) -> Self {
        Self {
            url: Some(url.into()),
            media_kind,
            quality,
        }
    }
}

/// Audio post-processing step run by the extractor after download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioTranscode {
    /// Target codec and file extension (e.g. "mp3")
    pub codec: String,
    /// Target bitrate in kbps
    pub bitrate_kbps: u32,
}

/// Everything the extractor needs for one download job.
///
/// Built per request and owned by that request's orchestration call.
#[derive(Debug, Clone)]
pub struct ExtractionJobSpec {
    pub job_id: String,
    pub platform: Platform,
    pub media_kind: MediaKind,
    /// Output path template, e.g. `downloads/1a2b3c4d_%(title).80B.%(ext)s`
    pub output_template: String,
    /// yt-dlp format selector
    pub format_selector: String,
    pub post_processing: Option<AudioTranscode>,
    /// Container for merged video+audio downloads
    pub merge_output_format: Option<String>,
    /// Restrict filenames to ASCII-safe characters
    pub restrict_filenames: bool,
    pub user_agent: Option<String>,
    pub referer: Option<String>,
    pub http_headers: BTreeMap<String, String>,
    /// YouTube player clients in preference order
    pub player_clients: Vec<String>,
}

impl ExtractionJobSpec {
    /// Extension the finished artifact is expected to carry, if post-processing fixes it
    pub fn expected_extension(&self) -> Option<&str> {
        match (&self.post_processing, &self.merge_output_format) {
            (Some(transcode), _) => Some(transcode.codec.as_str()),
            (None, Some(merge)) => Some(merge.as_str()),
            (None, None) => None,
        }
    }
}

/// Video information extracted by yt-dlp
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MediaInfo {
    pub id: String,
    pub title: String,
    pub uploader: Option<String>,
    /// Duration in seconds
    pub duration: Option<f64>,
    pub thumbnail: Option<String>,
}

/// Result of a finished download job
#[derive(Debug, Clone, Serialize)]
pub struct DownloadOutcome {
    pub job_id: String,
    /// File name of the artifact inside the storage directory
    pub artifact_name: String,
    pub title: String,
    pub platform: Platform,
}
