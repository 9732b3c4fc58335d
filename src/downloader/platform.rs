// Platform detection from raw URLs

use serde::{Deserialize, Serialize};
use std::fmt;

/// Video hosting platform a URL belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Youtube,
    Tiktok,
    Instagram,
    Twitter,
    Facebook,
    Unknown,
}

/// Ordered domain fragments, first match wins.
///
/// `x.com` is anchored on `//` or `.` so that hosts such as `netflix.com`
/// do not register as Twitter.
const DOMAIN_FRAGMENTS: &[(&str, Platform)] = &[
    ("tiktok.com", Platform::Tiktok),
    ("instagram.com", Platform::Instagram),
    ("instagr.am", Platform::Instagram),
    ("twitter.com", Platform::Twitter),
    ("//x.com", Platform::Twitter),
    (".x.com", Platform::Twitter),
    ("youtube.com", Platform::Youtube),
    ("youtu.be", Platform::Youtube),
    ("facebook.com", Platform::Facebook),
    ("fb.watch", Platform::Facebook),
    ("fb.com", Platform::Facebook),
];

impl Platform {
    /// Every platform the API accepts downloads for
    pub const SUPPORTED: [Platform; 5] = [
        Platform::Youtube,
        Platform::Tiktok,
        Platform::Instagram,
        Platform::Twitter,
        Platform::Facebook,
    ];

    /// Classify a URL by substring matching. Never fails.
    pub fn classify(url: &str) -> Platform {
        let lower = url.to_lowercase();

        DOMAIN_FRAGMENTS
            .iter()
            .find(|(fragment, _)| lower.contains(fragment))
            .map(|(_, platform)| *platform)
            .unwrap_or(Platform::Unknown)
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Unknown)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Youtube => "youtube",
            Self::Tiktok => "tiktok",
            Self::Instagram => "instagram",
            Self::Twitter => "twitter",
            Self::Facebook => "facebook",
            Self::Unknown => "unknown",
        }
    }

    /// Human-readable name for messages
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Youtube => "YouTube",
            Self::Tiktok => "TikTok",
            Self::Instagram => "Instagram",
            Self::Twitter => "Twitter/X",
            Self::Facebook => "Facebook",
            Self::Unknown => "Unknown",
        }
    }

    /// "YouTube, TikTok, ..." for error messages
    pub fn supported_list() -> String {
        Self::SUPPORTED
            .iter()
            .map(|p| p.display_name())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
