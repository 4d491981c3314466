//! TikTok link detection and validation
//!
//! Validation is deliberately shallow: it only rejects input that cannot be
//! a TikTok link so the bot fails fast without spawning yt-dlp. Whether the
//! link actually resolves to a video is the extractor's job.

use lazy_regex::{regex, Lazy, Regex};
use thiserror::Error;
use url::Url;

/// Maximum URL length accepted from users
pub const MAX_URL_LENGTH: usize = 2048;

/// Hosts that serve TikTok video pages or share redirects
const TIKTOK_HOSTS: &[&str] = &["tiktok.com", "www.tiktok.com", "vm.tiktok.com", "vt.tiktok.com", "m.tiktok.com"];

// `@` is part of the class so canonical `/@user/video/<id>` links match whole
fn tiktok_link() -> &'static Lazy<Regex> {
    regex!(r"(?i)https?://(www\.)?(vm\.|vt\.|m\.)?tiktok\.com/[\w\-/?=&%.@~+:]+")
}

/// Validation errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Not a TikTok link: {0}")]
    NotTikTok(String),

    #[error("URL is too long ({0} characters)")]
    TooLong(usize),

    #[error("Invalid URL: {0}")]
    Malformed(String),
}

/// Finds the first TikTok link in a free-form message.
///
/// # Examples
/// ```
/// use ttdl::core::validation::extract_tiktok_url;
///
/// let text = "look at this https://vm.tiktok.com/ZMabc123/ lol";
/// assert_eq!(extract_tiktok_url(text), Some("https://vm.tiktok.com/ZMabc123/"));
/// assert_eq!(extract_tiktok_url("no links here"), None);
/// ```
pub fn extract_tiktok_url(text: &str) -> Option<&str> {
    tiktok_link().find(text).map(|m| m.as_str())
}

/// Checks that `url` looks like a TikTok link and parses it.
///
/// # Examples
/// ```
/// use ttdl::core::validation::validate_tiktok_url;
///
/// assert!(validate_tiktok_url("https://www.tiktok.com/@user/video/7234567890123456789").is_ok());
/// assert!(validate_tiktok_url("https://vt.tiktok.com/ZSabc/").is_ok());
/// assert!(validate_tiktok_url("https://evil.com/tiktok.com/video").is_err());
/// assert!(validate_tiktok_url("ftp://tiktok.com/video").is_err());
/// ```
pub fn validate_tiktok_url(url: &str) -> Result<Url, ValidationError> {
    let url = url.trim();
    if url.len() > MAX_URL_LENGTH {
        return Err(ValidationError::TooLong(url.len()));
    }

    let parsed = Url::parse(url).map_err(|e| ValidationError::Malformed(format!("{} ({})", url, e)))?;

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(ValidationError::NotTikTok(url.to_string()));
    }

    let host = parsed.host_str().unwrap_or_default().to_lowercase();
    if !TIKTOK_HOSTS.contains(&host.as_str()) {
        return Err(ValidationError::NotTikTok(url.to_string()));
    }

    // The whole string has to be a link, not text that merely contains one
    match tiktok_link().find(url) {
        Some(m) if m.start() == 0 && m.end() == url.len() => Ok(parsed),
        _ => Err(ValidationError::NotTikTok(url.to_string())),
    }
}
