// Extractor chain - ordered backends with fallback
//
// Strategy:
// 1. Skip backends that are not installed
// 2. Fall through to the next backend only when one cannot run at all
// 3. Content and blocking failures come from the platform, so they are
//    returned at once instead of being retried elsewhere

use async_trait::async_trait;
use tracing::{info, warn};

use super::traits::{ExtractionOutput, Extractor, ExtractorFailure, InfoOptions};
use crate::downloader::models::{ExtractionJobSpec, MediaInfo};

/// Orchestrator over several extractor backends
pub struct ExtractorChain {
    backends: Vec<Box<dyn Extractor>>,
}

impl ExtractorChain {
    pub fn new() -> Self {
        Self {
            backends: Vec::new(),
        }
    }

    pub fn with_backend(mut self, backend: Box<dyn Extractor>) -> Self {
        self.backends.push(backend);
        self
    }

    pub fn backend_names(&self) -> Vec<&'static str> {
        self.backends.iter().map(|b| b.name()).collect()
    }

    fn no_backend() -> ExtractorFailure {
        ExtractorFailure::Unavailable(
            "Neither the yt-dlp binary nor the Python yt_dlp module is available".to_string(),
        )
    }
}

impl Default for ExtractorChain {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Extractor for ExtractorChain {
    fn name(&self) -> &'static str {
        "chain"
    }

    fn is_available(&self) -> bool {
        self.backends.iter().any(|b| b.is_available())
    }

    async fn fetch_info(
        &self,
        url: &str,
        options: &InfoOptions,
    ) -> Result<MediaInfo, ExtractorFailure> {
        let mut last_error = Self::no_backend();

        for backend in self.backends.iter().filter(|b| b.is_available()) {
            info!(backend = backend.name(), "fetching info");

            match backend.fetch_info(url, options).await {
                Ok(info) => return Ok(info),
                Err(ExtractorFailure::Unavailable(msg)) => {
                    warn!(backend = backend.name(), "backend unavailable: {}", msg);
                    last_error = ExtractorFailure::Unavailable(msg);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error)
    }

    async fn download(
        &self,
        url: &str,
        spec: &ExtractionJobSpec,
    ) -> Result<ExtractionOutput, ExtractorFailure> {
        let mut last_error = Self::no_backend();

        for backend in self.backends.iter().filter(|b| b.is_available()) {
            info!(backend = backend.name(), job_id = %spec.job_id, "trying download");

            match backend.download(url, spec).await {
                Ok(output) => {
                    info!(backend = backend.name(), job_id = %spec.job_id, "download succeeded");
                    return Ok(output);
                }
                Err(ExtractorFailure::Unavailable(msg)) => {
                    warn!(backend = backend.name(), job_id = %spec.job_id, "backend unavailable: {}", msg);
                    last_error = ExtractorFailure::Unavailable(msg);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Stub {
        name: &'static str,
        available: bool,
        result: Result<MediaInfo, ExtractorFailure>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Extractor for Stub {
        fn name(&self) -> &'static str {
            self.name
        }

        fn is_available(&self) -> bool {
            self.available
        }

        async fn fetch_info(
            &self,
            _url: &str,
            _options: &InfoOptions,
        ) -> Result<MediaInfo, ExtractorFailure> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result.clone()
        }

        async fn download(
            &self,
            _url: &str,
            _spec: &ExtractionJobSpec,
        ) -> Result<ExtractionOutput, ExtractorFailure> {
            unreachable!("not used in these tests")
        }
    }

    fn stub(
        name: &'static str,
        available: bool,
        result: Result<MediaInfo, ExtractorFailure>,
    ) -> (Box<dyn Extractor>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let s = Stub {
            name,
            available,
            result,
            calls: calls.clone(),
        };
        (Box::new(s), calls)
    }

    fn info(title: &str) -> MediaInfo {
        MediaInfo {
            title: title.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_skips_unavailable_backends() {
        let (first, first_calls) = stub("first", false, Ok(info("first")));
        let (second, _) = stub("second", true, Ok(info("second")));
        let chain = ExtractorChain::new().with_backend(first).with_backend(second);

        let res = chain.fetch_info("u", &InfoOptions::default()).await.unwrap();
        assert_eq!(res.title, "second");
        assert_eq!(first_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_falls_back_on_tool_failure() {
        let (first, _) = stub(
            "first",
            true,
            Err(ExtractorFailure::Unavailable("gone".to_string())),
        );
        let (second, _) = stub("second", true, Ok(info("second")));
        let chain = ExtractorChain::new().with_backend(first).with_backend(second);

        let res = chain.fetch_info("u", &InfoOptions::default()).await.unwrap();
        assert_eq!(res.title, "second");
    }

    #[tokio::test]
    async fn test_upstream_failure_is_not_retried() {
        let (first, _) = stub(
            "first",
            true,
            Err(ExtractorFailure::Upstream("ERROR: Private video".to_string())),
        );
        let (second, second_calls) = stub("second", true, Ok(info("second")));
        let chain = ExtractorChain::new().with_backend(first).with_backend(second);

        let res = chain.fetch_info("u", &InfoOptions::default()).await;
        assert!(matches!(res, Err(ExtractorFailure::Upstream(_))));
        assert_eq!(second_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_chain_is_unavailable() {
        let chain = ExtractorChain::new();
        assert!(!chain.is_available());
        let res = chain.fetch_info("u", &InfoOptions::default()).await;
        assert!(matches!(res, Err(ExtractorFailure::Unavailable(_))));
    }
}
