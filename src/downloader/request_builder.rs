// Builds the per-job extractor parameters

use std::collections::BTreeMap;
use std::path::Path;

use super::errors::{DownloadError, Result};
use super::format_selector::FormatSelector;
use super::models::{AudioTranscode, ExtractionJobSpec, MediaKind, QualityTier};
use super::platform::Platform;
use crate::config::ExtractorSettings;

/// Desktop Chrome user agent sent with every download
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36";

const YOUTUBE_REFERER: &str = "https://www.youtube.com/";

/// Per-request inputs
#[derive(Debug, Clone, Copy)]
pub struct JobRequest<'a> {
    pub platform: Platform,
    pub media_kind: MediaKind,
    pub quality: QualityTier,
    pub job_id: &'a str,
}

/// Extraction parameters for one job
pub fn build_job_spec(
    request: JobRequest<'_>,
    storage_dir: &Path,
    settings: &ExtractorSettings,
) -> Result<ExtractionJobSpec> {
    let JobRequest {
        platform,
        media_kind,
        quality,
        job_id,
    } = request;

    if !platform.is_supported() {
        return Err(DownloadError::UnsupportedPlatform);
    }

    let format_selector = FormatSelector::select(platform, media_kind, quality);

    let post_processing = match media_kind {
        MediaKind::Audio => Some(AudioTranscode {
            codec: settings.audio_codec.clone(),
            bitrate_kbps: settings.audio_bitrate_kbps,
        }),
        MediaKind::Video => None,
    };

    let is_youtube = platform == Platform::Youtube;

    let merge_output_format = match media_kind {
        MediaKind::Video if is_youtube => Some("mp4".to_string()),
        _ => None,
    };

    let (referer, http_headers, player_clients) = if is_youtube {
        (
            Some(YOUTUBE_REFERER.to_string()),
            browser_headers(),
            settings.player_clients.clone(),
        )
    } else {
        (None, BTreeMap::new(), Vec::new())
    };

    Ok(ExtractionJobSpec {
        job_id: job_id.to_string(),
        platform,
        media_kind,
        output_template: output_template(storage_dir, job_id, settings.title_max_len),
        format_selector,
        post_processing,
        merge_output_format,
        restrict_filenames: !is_youtube,
        user_agent: Some(BROWSER_USER_AGENT.to_string()),
        referer,
        http_headers,
        player_clients,
    })
}

/// Longest file name most filesystems accept, in bytes
const MAX_FILE_NAME_BYTES: usize = 255;

/// Room kept for what yt-dlp appends after the title: the extension plus
/// intermediate suffixes such as `.f137.webm.part` or `.temp.mp4`
const SUFFIX_RESERVE_BYTES: usize = 32;

/// `{dir}/{job_id}_%(title).{N}B.%(ext)s`
///
/// The title is cut to N bytes (yt-dlp never splits a character), with N
/// clamped so the whole file name stays under the filesystem limit.
pub fn output_template(storage_dir: &Path, job_id: &str, title_max_len: usize) -> String {
    let file_template = format!(
        "{}_%(title).{}B.%(ext)s",
        job_id,
        title_byte_budget(job_id, title_max_len)
    );
    storage_dir.join(file_template).to_string_lossy().to_string()
}

fn title_byte_budget(job_id: &str, title_max_len: usize) -> usize {
    let ceiling = MAX_FILE_NAME_BYTES
        .saturating_sub(job_id.len() + 1 + SUFFIX_RESERVE_BYTES)
        .max(1);
    title_max_len.clamp(1, ceiling)
}

fn browser_headers() -> BTreeMap<String, String> {
    [
        (
            "Accept",
            "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
        ),
        ("Accept-Language", "en-us,en;q=0.5"),
        ("Sec-Fetch-Mode", "navigate"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}
