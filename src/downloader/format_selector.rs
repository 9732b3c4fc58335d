// FormatSelector - yt-dlp format strings per platform, media kind and quality
//
// YouTube serves separate video and audio streams, so video downloads pick
// the best video under the height ceiling and merge it with the best audio.
// The other platforms mostly serve single muxed streams, so they always ask
// for one combined stream.

use super::models::{MediaKind, QualityTier};
use super::platform::Platform;

pub struct FormatSelector;

impl FormatSelector {
    /// Format spec for a request
    pub fn select(platform: Platform, kind: MediaKind, quality: QualityTier) -> String {
        match kind {
            MediaKind::Audio => Self::audio(platform),
            MediaKind::Video => Self::video(platform, quality),
        }
    }

    /// Video format spec capped at the tier's height
    pub fn video(platform: Platform, quality: QualityTier) -> String {
        match (platform, quality.height_bound()) {
            (_, None) => "best".to_string(),
            (Platform::Youtube, Some(h)) => {
                format!("bestvideo[height<={h}]+bestaudio/best[height<={h}]")
            }
            (_, Some(h)) => format!("best[height<={h}]/best"),
        }
    }

    /// Audio format spec; the transcode step turns it into the final codec
    pub fn audio(platform: Platform) -> String {
        match platform {
            Platform::Youtube => "bestaudio/best".to_string(),
            _ => "best".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;

    /// Height ceiling encoded in a selector, if any
    fn height_bound_of(selector: &str) -> Option<u32> {
        Regex::new(r"height<=(\d+)")
            .unwrap()
            .captures(selector)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse().ok())
    }

    const TIERS: [(QualityTier, u32); 4] = [
        (QualityTier::P360, 360),
        (QualityTier::P480, 480),
        (QualityTier::P720, 720),
        (QualityTier::P1080, 1080),
    ];

    #[test]
    fn test_height_bound_matches_tier_for_every_platform() {
        for platform in Platform::SUPPORTED {
            for (tier, height) in TIERS {
                let spec = FormatSelector::video(platform, tier);
                assert_eq!(
                    height_bound_of(&spec),
                    Some(height),
                    "{} {:?}: {}",
                    platform,
                    tier,
                    spec
                );
            }
        }
    }

    #[test]
    fn test_highest_is_unbounded() {
        for platform in Platform::SUPPORTED {
            let spec = FormatSelector::video(platform, QualityTier::Highest);
            assert_eq!(spec, "best");
            assert_eq!(height_bound_of(&spec), None);
        }
    }

    #[test]
    fn test_youtube_video_merges_streams() {
        let spec = FormatSelector::video(Platform::Youtube, QualityTier::P720);
        assert_eq!(spec, "bestvideo[height<=720]+bestaudio/best[height<=720]");
    }

    #[test]
    fn test_other_platforms_use_combined_stream() {
        let spec = FormatSelector::video(Platform::Tiktok, QualityTier::P480);
        assert!(!spec.contains('+'));
        assert_eq!(FormatSelector::audio(Platform::Instagram), "best");
    }

    #[test]
    fn test_youtube_audio_prefers_audio_only() {
        assert_eq!(
            FormatSelector::select(Platform::Youtube, MediaKind::Audio, QualityTier::P1080),
            "bestaudio/best"
        );
    }
}
