// Downloader module - platform rules, job specs and the extraction pipeline

pub mod errors;
pub mod extractors;
pub mod format_selector;
pub mod models;
pub mod orchestrator;
pub mod platform;
pub mod request_builder;
pub mod tools;
pub mod utils;

pub use errors::DownloadError;
pub use extractors::{ErrorClassifier, ExtractorChain, Extractor, ExtractorMode, NetworkConfig, YtDlpExtractor};
pub use models::{DownloadOutcome, DownloadRequest, MediaInfo, MediaKind, QualityTier};
pub use orchestrator::DownloadOrchestrator;
pub use platform::Platform;
pub use tools::ToolManager;

use crate::config::ExtractorSettings;

/// Extractor backends for the configured mode.
///
/// Auto tries the native binary first and falls back to the Python module.
pub fn build_extractor(settings: &ExtractorSettings, tools: &ToolManager) -> ExtractorChain {
    let network = NetworkConfig {
        proxy: settings.proxy.clone(),
        cookies_path: settings.cookies_path.clone(),
        timeout_seconds: settings.socket_timeout_secs,
    };

    let cli = || Box::new(YtDlpExtractor::cli(tools.ytdlp_path(), network.clone())) as Box<dyn Extractor>;
    let python =
        || Box::new(YtDlpExtractor::python(tools.python_path(), network.clone())) as Box<dyn Extractor>;

    match settings.mode {
        ExtractorMode::Cli => ExtractorChain::new().with_backend(cli()),
        ExtractorMode::Python => ExtractorChain::new().with_backend(python()),
        ExtractorMode::Auto => ExtractorChain::new()
            .with_backend(cli())
            .with_backend(python()),
    }
}
