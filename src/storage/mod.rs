// Artifact storage - one flat directory of finished downloads
//
// Every artifact is named `{job_id}_{title}.{ext}` and the directory listing
// is the only inventory. Lookups never leave the directory, even through
// symlinks.

pub mod retention;

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, warn};

use crate::downloader::errors::{DownloadError, Result};

pub use retention::{RetentionSweeper, SweepReport};

/// Suffixes of files the extractor is still writing
const PARTIAL_SUFFIXES: &[&str] = &[".part", ".ytdl", ".temp", ".tmp"];

/// Artifact directory shared by the orchestrator, the file endpoint and the sweeper
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
    canonical_root: PathBuf,
}

impl ArtifactStore {
    /// Open the store, creating the directory if it doesn't exist.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        let canonical_root = std::fs::canonicalize(&root)?;

        Ok(Self {
            root,
            canonical_root,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Existing artifact with exactly this file name
    pub async fn existing(&self, file_name: &str) -> Result<Option<PathBuf>> {
        match sanitize_requested_name(file_name) {
            Some(name) if !is_partial_file(name) => {
                self.contained_file(&self.root.join(name)).await
            }
            _ => Ok(None),
        }
    }

    /// Newest finished artifact produced by a job
    pub async fn find_job_artifact(&self, job_id: &str) -> Result<Option<PathBuf>> {
        let prefix = format!("{}_", job_id);
        self.newest_match(|name| name.starts_with(&prefix)).await
    }

    /// Resolve a client-supplied artifact name to a file inside the store.
    ///
    /// Only the last path component of `requested` is used. When no file has
    /// that exact name, the newest file whose name contains it, or starts with
    /// its job id token (the part before the first `_`), is returned instead.
    pub async fn resolve(&self, requested: &str) -> Result<PathBuf> {
        let name = sanitize_requested_name(requested)
            .ok_or_else(|| DownloadError::NotFound(requested.to_string()))?;

        if let Some(path) = self.existing(name).await? {
            return Ok(path);
        }

        let token_prefix = name
            .split_once('_')
            .map(|(token, _)| token)
            .filter(|token| !token.is_empty())
            .map(|token| format!("{}_", token));

        let fallback = self
            .newest_match(|candidate| {
                candidate.contains(name)
                    || token_prefix
                        .as_deref()
                        .is_some_and(|prefix| candidate.starts_with(prefix))
            })
            .await?;

        match fallback {
            Some(path) => {
                debug!(requested = %name, resolved = %path.display(), "served artifact by fuzzy match");
                Ok(path)
            }
            None => Err(DownloadError::NotFound(name.to_string())),
        }
    }

    /// Newest finished regular file in the directory whose name satisfies `accept`
    async fn newest_match<F>(&self, accept: F) -> Result<Option<PathBuf>>
    where
        F: Fn(&str) -> bool,
    {
        let mut entries = tokio::fs::read_dir(&self.root).await?;
        let mut best: Option<(SystemTime, PathBuf)> = None;

        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(error) => {
                    warn!("could not read storage directory entry: {error}");
                    break;
                }
            };

            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };
            if is_partial_file(name) || !accept(name) {
                continue;
            }

            let Some(path) = self.contained_file(&entry.path()).await? else {
                continue;
            };
            let modified = match tokio::fs::metadata(&path).await.and_then(|m| m.modified()) {
                Ok(modified) => modified,
                Err(_) => SystemTime::UNIX_EPOCH,
            };

            if best.as_ref().map_or(true, |(newest, _)| modified > *newest) {
                best = Some((modified, path));
            }
        }

        Ok(best.map(|(_, path)| path))
    }

    /// Canonical path of `candidate` if it is a regular file inside the store
    async fn contained_file(&self, candidate: &Path) -> Result<Option<PathBuf>> {
        let metadata = match tokio::fs::metadata(candidate).await {
            Ok(metadata) => metadata,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(None),
            Err(error) => return Err(error.into()),
        };

        if !metadata.is_file() {
            return Ok(None);
        }

        let canonical = match tokio::fs::canonicalize(candidate).await {
            Ok(path) => path,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(None),
            Err(error) => return Err(error.into()),
        };

        if !canonical.starts_with(&self.canonical_root) {
            warn!(path = %canonical.display(), "blocked file outside the storage directory");
            return Ok(None);
        }

        Ok(Some(canonical))
    }
}

/// Last path component of a client-supplied name, `None` if nothing usable is left
pub fn sanitize_requested_name(requested: &str) -> Option<&str> {
    let name = requested
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();

    if name.is_empty() || name == "." || name == ".." || name.contains('\0') {
        None
    } else {
        Some(name)
    }
}

/// Whether the extractor is still writing this file
pub fn is_partial_file(name: &str) -> bool {
    PARTIAL_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
}

pub fn content_type_for_filename(filename: &str) -> &'static str {
    let extension = Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mkv" => "video/x-matroska",
        "mov" => "video/quicktime",
        "mp3" => "audio/mpeg",
        "m4a" => "audio/mp4",
        "aac" => "audio/aac",
        "wav" => "audio/wav",
        "ogg" | "opus" => "audio/ogg",
        "flac" => "audio/flac",
        _ => "application/octet-stream",
    }
}

/// `attachment` disposition with an ASCII fallback and the UTF-8 name
pub fn content_disposition(filename: &str) -> String {
    let safe_ascii = sanitize_ascii_filename(filename);
    format!(
        "attachment; filename=\"{safe_ascii}\"; filename*=UTF-8''{}",
        urlencoding::encode(filename)
    )
}

fn sanitize_ascii_filename(value: &str) -> String {
    let sanitized: String = value
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | ' ' | '(' | ')') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let compact = sanitized.trim();
    if compact.is_empty() {
        "download.bin".to_string()
    } else {
        compact.to_string()
    }
}
