//! User-facing reply texts

use indoc::indoc;

pub const START_TEXT: &str = indoc! {"
    Hi! Send me a TikTok link, then pick Video or Audio. /help for details.
    Tip: please don't spam, requests are rate limited."};

pub const HELP_TEXT: &str = indoc! {"
    Send a TikTok link to this bot.

    Commands:
    • Send a link → choose Video/Audio
    • /audio – get the audio (MP3) of your last link
    • /help – this help

    Note: only download content you have the rights to."};

pub const ACCESS_DENIED: &str = "This bot is in admin-only mode. Access denied.";

pub const RATE_LIMITED: &str = "Too many requests. Please try again in a moment.";

pub const INVALID_LINK: &str = "Please send a valid TikTok link. /help for examples.";

pub const CHOOSE_FORMAT: &str = "Choose an option:";

pub const NO_LAST_LINK: &str = "Send me a TikTok video first so I know where to take the audio from.";

pub const LINK_EXPIRED: &str = "I no longer remember that link. Please send it again.";

pub const BUTTON_VIDEO: &str = "⬇️ Video";

pub const BUTTON_AUDIO: &str = "🎵 Audio";

pub const VIDEO_UNAVAILABLE: &str = "The video is not available (private, geo-blocked or age-restricted).";

pub const NETWORK_PROBLEM: &str = "Could not reach TikTok right now. Please try again in a minute.";

pub const UNSUPPORTED_LINK: &str = "This link does not point to a downloadable video.";

pub const SEND_FAILED: &str = "Downloaded the media but could not send it to you. Please try again.";

pub const INTERNAL_ERROR: &str = "Something went wrong on our side. Please try again later.";

/// Generic extraction failure, with a short excerpt of the cause
pub fn extraction_failed(cause: &str) -> String {
    format!("Download failed: {}", crate::core::utils::truncate_chars(cause, 400))
}

/// Reply sent instead of a file when the media stays over the size limit
pub fn fallback_link(size_mb: &str, link: &str) -> String {
    format!("The file ({} MB) is still too large to send. Download it directly:\n{}", size_mb, link)
}
