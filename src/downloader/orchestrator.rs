// Download orchestrator - one request, one extraction job
//
// Flow:
// 1. Validate the URL and classify its platform
// 2. Mint a job id and build the extraction spec
// 3. Run the extractor to completion
// 4. Find the file it actually produced (post-processing renames it)

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::errors::{DownloadError, Result};
use super::extractors::{ErrorClassifier, ExtractionOutput, Extractor, ExtractorFailure, InfoOptions};
use super::models::{DownloadOutcome, DownloadRequest, ExtractionJobSpec, MediaInfo};
use super::platform::Platform;
use super::request_builder::{build_job_spec, JobRequest, BROWSER_USER_AGENT};
use crate::config::ExtractorSettings;
use crate::storage::ArtifactStore;

/// Length of the job id prefix on artifact names
const JOB_ID_LEN: usize = 8;

pub struct DownloadOrchestrator {
    extractor: Arc<dyn Extractor>,
    store: ArtifactStore,
    settings: ExtractorSettings,
    classifier: ErrorClassifier,
}

impl DownloadOrchestrator {
    pub fn new(extractor: Arc<dyn Extractor>, store: ArtifactStore, settings: ExtractorSettings) -> Self {
        Self {
            extractor,
            store,
            settings,
            classifier: ErrorClassifier::default(),
        }
    }

    /// Replace the failure classifier
    pub fn with_classifier(mut self, classifier: ErrorClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    pub fn extractor(&self) -> &dyn Extractor {
        self.extractor.as_ref()
    }

    /// Download one artifact into the storage directory.
    pub async fn handle(&self, request: DownloadRequest) -> Result<DownloadOutcome> {
        let url = validate_url(request.url.as_deref())?;
        let platform = supported_platform(url)?;
        let job_id = new_job_id();

        let spec = build_job_spec(
            JobRequest {
                platform,
                media_kind: request.media_kind,
                quality: request.quality,
                job_id: &job_id,
            },
            self.store.root(),
            &self.settings,
        )?;

        info!(
            job_id = %job_id,
            platform = %platform,
            kind = ?spec.media_kind,
            format = %spec.format_selector,
            "starting download"
        );

        let output = match self.extractor.download(url, &spec).await {
            Ok(output) => output,
            Err(failure) => {
                let err = self.map_failure(failure);
                error!(job_id = %job_id, "download failed: {}", err);
                return Err(err);
            }
        };

        let artifact = match self.reconcile(&spec, &output).await? {
            Some(path) => path,
            None => {
                error!(job_id = %job_id, hint = ?output.path_hint, "extractor finished without an artifact");
                return Err(DownloadError::ArtifactNotProduced { job_id });
            }
        };

        let artifact_name = file_name_of(&artifact)
            .ok_or_else(|| DownloadError::ArtifactNotProduced { job_id: job_id.clone() })?;

        info!(job_id = %job_id, file = %artifact_name, "download complete");

        let title = if output.info.title.is_empty() {
            title_from_artifact(&artifact_name, &job_id)
        } else {
            output.info.title
        };

        Ok(DownloadOutcome {
            job_id,
            artifact_name,
            title,
            platform,
        })
    }

    /// Metadata only, nothing is written to storage.
    pub async fn info(&self, url: Option<&str>) -> Result<(MediaInfo, Platform)> {
        let url = validate_url(url)?;
        let platform = supported_platform(url)?;

        let options = InfoOptions::default()
            .with_proxy(self.settings.proxy.clone())
            .with_cookies_path(self.settings.cookies_path.clone())
            .with_timeout(self.settings.socket_timeout_secs)
            .with_user_agent(Some(BROWSER_USER_AGENT.to_string()));

        match self.extractor.fetch_info(url, &options).await {
            Ok(info) => {
                info!(platform = %platform, title = %info.title, "fetched info");
                Ok((info, platform))
            }
            Err(failure) => {
                let err = self.map_failure(failure);
                warn!(platform = %platform, "info lookup failed: {}", err);
                Err(err)
            }
        }
    }

    /// Locate the finished artifact for a job.
    ///
    /// The extractor's path hint is tried first with the post-processed
    /// extension, then as reported. Otherwise the newest file carrying the
    /// job id prefix wins.
    async fn reconcile(
        &self,
        spec: &ExtractionJobSpec,
        output: &ExtractionOutput,
    ) -> Result<Option<PathBuf>> {
        let hinted = output
            .path_hint
            .as_deref()
            .and_then(|hint| file_name_of(Path::new(hint)))
            .filter(|name| name.starts_with(&format!("{}_", spec.job_id)));

        if let Some(name) = hinted {
            let mut candidates = Vec::with_capacity(2);
            if let Some(ext) = spec.expected_extension() {
                candidates.push(Path::new(&name).with_extension(ext).to_string_lossy().to_string());
            }
            candidates.push(name);

            for candidate in &candidates {
                if let Some(path) = self.store.existing(candidate).await? {
                    return Ok(Some(path));
                }
            }
        }

        self.store.find_job_artifact(&spec.job_id).await
    }

    fn map_failure(&self, failure: ExtractorFailure) -> DownloadError {
        match failure {
            ExtractorFailure::Upstream(raw) => self.classifier.classify(&raw),
            other => other.into(),
        }
    }
}

fn validate_url(url: Option<&str>) -> Result<&str> {
    match url.map(str::trim) {
        Some(url) if !url.is_empty() => Ok(url),
        _ => Err(DownloadError::MissingUrl),
    }
}

fn supported_platform(url: &str) -> Result<Platform> {
    let platform = Platform::classify(url);
    if platform.is_supported() {
        Ok(platform)
    } else {
        Err(DownloadError::UnsupportedPlatform)
    }
}

/// First 8 hex characters of a random UUID
fn new_job_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(JOB_ID_LEN);
    id
}

/// `{job_id}_{title}.{ext}` back to `{title}`
fn title_from_artifact(artifact_name: &str, job_id: &str) -> String {
    let stem = Path::new(artifact_name)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(artifact_name);
    stem.strip_prefix(job_id)
        .and_then(|rest| rest.strip_prefix('_'))
        .unwrap_or(stem)
        .to_string()
}

fn file_name_of(path: &Path) -> Option<String> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
}
