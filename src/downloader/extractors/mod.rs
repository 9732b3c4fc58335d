// Extractor module - the opaque media extraction collaborator
//
// Provides two yt-dlp modes:
// - CLI mode: native `yt-dlp` binary
// - Python mode: `python3 -m yt_dlp`
//
// ExtractorChain tries them in order and falls back when one is missing.
// Raw failures are classified by the ErrorClassifier in diagnostics.

mod diagnostics;
mod orchestrator;
mod traits;
mod ytdlp;

pub use diagnostics::{error_summary, ErrorClassifier, FailureCategory};
pub use orchestrator::ExtractorChain;
pub use traits::{ExtractionOutput, Extractor, ExtractorFailure, ExtractorMode, InfoOptions};
pub use ytdlp::{NetworkConfig, YtDlpExtractor};
