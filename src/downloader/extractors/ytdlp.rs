// yt-dlp extractor - drives the `yt-dlp` binary or `python3 -m yt_dlp`
//
// Both modes accept the same command line, only the program and its leading
// arguments differ:
// - CLI mode: native binary, no Python dependency
// - Python mode: module invocation, handy when only pip is available

use async_trait::async_trait;
use serde::Deserialize;
use std::process::Command as StdCommand;
use std::sync::OnceLock;
use tracing::{debug, info, warn};

use super::traits::{ExtractionOutput, Extractor, ExtractorFailure, ExtractorMode, InfoOptions};
use crate::downloader::models::{ExtractionJobSpec, MediaInfo};
use crate::downloader::platform::Platform;
use crate::downloader::utils::{get_cookie_args, get_proxy_args, get_timeout_args, run_output};

/// Network settings shared by every invocation
#[derive(Debug, Clone, Default)]
pub struct NetworkConfig {
    /// SOCKS5/HTTP proxy URL (e.g., "socks5://127.0.0.1:1080")
    pub proxy: Option<String>,
    /// Path to cookies.txt file
    pub cookies_path: Option<String>,
    /// Socket timeout in seconds
    pub timeout_seconds: u32,
}

/// yt-dlp based extractor
pub struct YtDlpExtractor {
    mode: ExtractorMode,
    program: String,
    /// Arguments placed before the yt-dlp options (`-m yt_dlp` in Python mode)
    prefix_args: Vec<String>,
    network: NetworkConfig,
    available: OnceLock<bool>,
}

/// Subset of the yt-dlp info JSON this service reads
#[derive(Debug, Deserialize)]
struct YtDlpInfo {
    id: Option<String>,
    title: Option<String>,
    uploader: Option<String>,
    duration: Option<f64>,
    thumbnail: Option<String>,
    filename: Option<String>,
    #[serde(rename = "_filename")]
    legacy_filename: Option<String>,
}

impl YtDlpExtractor {
    /// Native binary mode
    pub fn cli(ytdlp_path: impl Into<String>, network: NetworkConfig) -> Self {
        Self {
            mode: ExtractorMode::Cli,
            program: ytdlp_path.into(),
            prefix_args: Vec::new(),
            network,
            available: OnceLock::new(),
        }
    }

    /// Python module mode
    pub fn python(python_cmd: impl Into<String>, network: NetworkConfig) -> Self {
        Self {
            mode: ExtractorMode::Python,
            program: python_cmd.into(),
            prefix_args: vec!["-m".to_string(), "yt_dlp".to_string()],
            network,
            available: OnceLock::new(),
        }
    }

    fn check_installed(&self) -> bool {
        let mut cmd = StdCommand::new(&self.program);
        match self.mode {
            ExtractorMode::Python => cmd.args(["-c", "import yt_dlp"]),
            _ => cmd.arg("--version"),
        };

        match cmd.output() {
            Ok(out) => out.status.success(),
            Err(_) => false,
        }
    }

    /// Arguments for a metadata-only lookup
    fn build_info_args(&self, url: &str, options: &InfoOptions) -> Vec<String> {
        let mut args = self.prefix_args.clone();
        args.extend(
            [
                "--dump-json",
                "--skip-download",
                "--no-playlist",
                "--no-warnings",
                "--retries",
                "2",
            ]
            .map(String::from),
        );
        args.extend(get_timeout_args(options.timeout_seconds));

        if let Some(ua) = &options.user_agent {
            args.push("--user-agent".to_string());
            args.push(ua.clone());
        }

        args.extend(get_cookie_args(options.cookies_path.as_deref()));
        args.extend(get_proxy_args(options.proxy.as_deref()));

        args.push("--".to_string());
        args.push(url.to_string());
        args
    }

    /// Arguments for a full download job
    fn build_download_args(&self, url: &str, spec: &ExtractionJobSpec) -> Vec<String> {
        let mut args = self.prefix_args.clone();
        args.extend(
            [
                // Print the info JSON and still download
                "-j",
                "--no-simulate",
                "--no-playlist",
                "--no-warnings",
                "--no-check-certificates",
                // Keep the download time as mtime so retention counts from now
                "--no-mtime",
                "--retries",
                "2",
            ]
            .map(String::from),
        );
        args.extend(get_timeout_args(self.network.timeout_seconds));

        args.push("-f".to_string());
        args.push(spec.format_selector.clone());
        args.push("-o".to_string());
        args.push(spec.output_template.clone());

        if let Some(merge) = &spec.merge_output_format {
            args.push("--merge-output-format".to_string());
            args.push(merge.clone());
        }

        if let Some(transcode) = &spec.post_processing {
            args.push("-x".to_string());
            args.push("--audio-format".to_string());
            args.push(transcode.codec.clone());
            args.push("--audio-quality".to_string());
            args.push(format!("{}K", transcode.bitrate_kbps));
        }

        if spec.restrict_filenames {
            args.push("--restrict-filenames".to_string());
        }

        if let Some(ua) = &spec.user_agent {
            args.push("--user-agent".to_string());
            args.push(ua.clone());
        }

        if let Some(referer) = &spec.referer {
            args.push("--referer".to_string());
            args.push(referer.clone());
        }

        for (name, value) in &spec.http_headers {
            args.push("--add-header".to_string());
            args.push(format!("{}:{}", name, value));
        }

        // Player client for YouTube
        if spec.platform == Platform::Youtube && !spec.player_clients.is_empty() {
            args.push("--extractor-args".to_string());
            args.push(format!(
                "youtube:player_client={}",
                spec.player_clients.join(",")
            ));
        }

        args.extend(get_cookie_args(self.network.cookies_path.as_deref()));
        args.extend(get_proxy_args(self.network.proxy.as_deref()));

        args.push("--".to_string());
        args.push(url.to_string());
        args
    }

    /// Parse the last JSON object printed on stdout
    fn parse_json(stdout: &[u8]) -> Result<(MediaInfo, Option<String>), ExtractorFailure> {
        let text = String::from_utf8_lossy(stdout);

        let parsed = text
            .lines()
            .rev()
            .map(str::trim)
            .filter(|line| line.starts_with('{'))
            .find_map(|line| serde_json::from_str::<YtDlpInfo>(line).ok())
            .ok_or_else(|| ExtractorFailure::Malformed("No info JSON in yt-dlp output".to_string()))?;

        let info = MediaInfo {
            id: parsed.id.unwrap_or_else(|| "unknown".to_string()),
            title: parsed.title.unwrap_or_else(|| "video".to_string()),
            uploader: parsed.uploader,
            duration: parsed.duration,
            thumbnail: parsed.thumbnail,
        };

        Ok((info, parsed.filename.or(parsed.legacy_filename)))
    }

    /// Report of a successful download. yt-dlp already exited 0, so a missing
    /// info line only loses the title and path hint; the caller finds the
    /// artifact by its job id instead.
    fn download_output(stdout: &[u8]) -> ExtractionOutput {
        match Self::parse_json(stdout) {
            Ok((info, path_hint)) => ExtractionOutput { info, path_hint },
            Err(failure) => {
                warn!("yt-dlp succeeded without an info line: {}", failure);
                ExtractionOutput {
                    info: MediaInfo::default(),
                    path_hint: None,
                }
            }
        }
    }

    async fn run(&self, args: Vec<String>) -> Result<std::process::Output, ExtractorFailure> {
        debug!(extractor = self.name(), program = %self.program, args = %args.join(" "), "running yt-dlp");

        let output = run_output(&self.program, &args).await?;

        if output.status.success() {
            Ok(output)
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            warn!(extractor = self.name(), status = %output.status, "yt-dlp failed: {}", stderr.trim());
            Err(ExtractorFailure::Upstream(stderr))
        }
    }
}

#[async_trait]
impl Extractor for YtDlpExtractor {
    fn name(&self) -> &'static str {
        match self.mode {
            ExtractorMode::Python => "python-yt-dlp",
            _ => "cli-yt-dlp",
        }
    }

    fn is_available(&self) -> bool {
        *self.available.get_or_init(|| self.check_installed())
    }

    async fn fetch_info(
        &self,
        url: &str,
        options: &InfoOptions,
    ) -> Result<MediaInfo, ExtractorFailure> {
        let output = self.run(self.build_info_args(url, options)).await?;
        let (info, _) = Self::parse_json(&output.stdout)?;
        Ok(info)
    }

    async fn download(
        &self,
        url: &str,
        spec: &ExtractionJobSpec,
    ) -> Result<ExtractionOutput, ExtractorFailure> {
        let output = self.run(self.build_download_args(url, spec)).await?;
        let ExtractionOutput { info, path_hint } = Self::download_output(&output.stdout);

        info!(
            extractor = self.name(),
            job_id = %spec.job_id,
            title = %info.title,
            "yt-dlp finished"
        );

        Ok(ExtractionOutput { info, path_hint })
    }
}
