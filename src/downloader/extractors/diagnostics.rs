// Failure diagnostics - maps raw extractor error text to user-facing categories
//
// yt-dlp reports no structured error codes, so classification is best-effort
// pattern matching. Rules are an ordered list; the first matching rule wins
// and unmatched text falls through as an unclassified error.

use regex::{Regex, RegexBuilder};

use crate::downloader::errors::{DownloadError, UnavailableReason};

/// Category an upstream failure falls into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCategory {
    /// Bot check, sign-in wall or rate limiting
    Blocked,
    /// Content cannot be fetched
    Unavailable(UnavailableReason),
}

#[derive(Clone)]
struct Rule {
    pattern: Regex,
    category: FailureCategory,
}

/// Ordered (pattern, category) rules applied to raw extractor errors
#[derive(Clone)]
pub struct ErrorClassifier {
    rules: Vec<Rule>,
}

/// Built-in rules in priority order. Age and privacy checks come first since
/// their messages also mention signing in.
const DEFAULT_RULES: &[(&str, FailureCategory)] = &[
    (
        r"age[- ]restricted|confirm your age|inappropriate for some users",
        FailureCategory::Unavailable(UnavailableReason::AgeRestricted),
    ),
    (
        r"private video|video is private|this account is private|granted access",
        FailureCategory::Unavailable(UnavailableReason::Private),
    ),
    (
        r"video unavailable|video is unavailable|has been removed|no longer available|been terminated|does not exist|content isn't available",
        FailureCategory::Unavailable(UnavailableReason::Removed),
    ),
    (
        r"not a bot|sign in to confirm|captcha|unusual traffic|too many requests|http error 429|rate[- ]limit|login required|requested content is not available",
        FailureCategory::Blocked,
    ),
];

impl ErrorClassifier {
    /// Classifier without any rules
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Append a rule, matched case-insensitively after the existing ones
    pub fn with_rule(mut self, pattern: &str, category: FailureCategory) -> Result<Self, regex::Error> {
        let pattern = RegexBuilder::new(pattern).case_insensitive(true).build()?;
        self.rules.push(Rule { pattern, category });
        Ok(self)
    }

    /// Category of the first matching rule
    pub fn diagnose(&self, error: &str) -> Option<FailureCategory> {
        self.rules
            .iter()
            .find(|rule| rule.pattern.is_match(error))
            .map(|rule| rule.category)
    }

    /// Turn raw extractor error text into a `DownloadError`
    pub fn classify(&self, raw: &str) -> DownloadError {
        let detail = error_summary(raw);

        match self.diagnose(raw) {
            Some(FailureCategory::Blocked) => DownloadError::Blocked { detail },
            Some(FailureCategory::Unavailable(reason)) => {
                DownloadError::ContentUnavailable { reason, detail }
            }
            None => DownloadError::Extractor(detail),
        }
    }
}

lazy_static::lazy_static! {
    static ref BUILTIN: ErrorClassifier = DEFAULT_RULES
        .iter()
        .try_fold(ErrorClassifier::empty(), |classifier, (pattern, category)| {
            classifier.with_rule(pattern, *category)
        })
        .unwrap();
}

impl Default for ErrorClassifier {
    /// Built-in rules, compiled once per process
    fn default() -> Self {
        BUILTIN.clone()
    }
}

/// Most useful line of an extractor error: the last `ERROR:` line, or the last
/// non-empty line.
pub fn error_summary(raw: &str) -> String {
    let lines: Vec<&str> = raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    lines
        .iter()
        .rev()
        .find(|line| line.starts_with("ERROR:"))
        .or_else(|| lines.last())
        .map(|line| line.to_string())
        .unwrap_or_else(|| "yt-dlp could not complete the operation".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diagnose(error: &str) -> Option<FailureCategory> {
        ErrorClassifier::default().diagnose(error)
    }

    #[test]
    fn test_bot_detection() {
        let error = "ERROR: [youtube] X: Sign in to confirm you're not a bot. Use --cookies-from-browser";
        assert_eq!(diagnose(error), Some(FailureCategory::Blocked));
    }

    #[test]
    fn test_rate_limit_detection() {
        assert_eq!(
            diagnose("ERROR: HTTP Error 429: Too Many Requests"),
            Some(FailureCategory::Blocked)
        );
    }

    #[test]
    fn test_age_restricted_detection() {
        let error = "ERROR: [youtube] X: Sign in to confirm your age. This video may be inappropriate for some users.";
        assert_eq!(
            diagnose(error),
            Some(FailureCategory::Unavailable(UnavailableReason::AgeRestricted))
        );
    }

    #[test]
    fn test_private_detection() {
        assert_eq!(
            diagnose("ERROR: [youtube] X: Private video. Sign in if you've been granted access"),
            Some(FailureCategory::Unavailable(UnavailableReason::Private))
        );
    }

    #[test]
    fn test_removed_detection() {
        assert_eq!(
            diagnose("ERROR: [youtube] X: Video unavailable. This video has been removed by the uploader"),
            Some(FailureCategory::Unavailable(UnavailableReason::Removed))
        );
    }

    #[test]
    fn test_unmatched_passes_through() {
        let classifier = ErrorClassifier::default();
        let err = classifier.classify("WARNING: foo\nERROR: Unsupported URL: https://x\n");
        match err {
            DownloadError::Extractor(msg) => assert_eq!(msg, "ERROR: Unsupported URL: https://x"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_custom_rule_extends_classifier() {
        let classifier = ErrorClassifier::default()
            .with_rule(r"geo.?restricted", FailureCategory::Blocked)
            .unwrap();
        assert!(matches!(
            classifier.classify("ERROR: This video is geo restricted"),
            DownloadError::Blocked { .. }
        ));
    }

    #[test]
    fn test_error_summary_falls_back_to_last_line() {
        assert_eq!(error_summary("first\n\nsecond\n"), "second");
        assert_eq!(error_summary(""), "yt-dlp could not complete the operation");
    }

    #[test]
    fn test_default_classifiers_share_builtin_rules() {
        let first = ErrorClassifier::default();
        let extended = ErrorClassifier::default()
            .with_rule(r"geo restricted", FailureCategory::Blocked)
            .unwrap();

        assert_eq!(first.rules.len(), DEFAULT_RULES.len());
        assert_eq!(extended.rules.len(), DEFAULT_RULES.len() + 1);
        // Extending a copy leaves later defaults untouched
        assert_eq!(ErrorClassifier::default().rules.len(), DEFAULT_RULES.len());
    }
}
