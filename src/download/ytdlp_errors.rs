/// Classification of yt-dlp failures
///
/// yt-dlp reports every failure as a non-zero exit code plus free-form
/// stderr. This module maps that text onto a small set of categories so the
/// pipeline can pick a reply and decide whether the failure is worth logging
/// at error level.
use strum::AsRefStr;

/// Kinds of yt-dlp failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum YtDlpErrorType {
    /// Private, removed, geo-blocked or age-restricted
    VideoUnavailable,
    /// Timeouts, DNS, refused connections
    NetworkError,
    /// The URL resolved to something yt-dlp cannot download
    Unsupported,
    /// Anything else
    Unknown,
}

/// Analyzes yt-dlp stderr and determines the error type
pub fn analyze_ytdlp_error(stderr: &str) -> YtDlpErrorType {
    let stderr_lower = stderr.to_lowercase();

    if stderr_lower.contains("private video")
        || stderr_lower.contains("video unavailable")
        || stderr_lower.contains("video is private")
        || stderr_lower.contains("video is not available")
        || stderr_lower.contains("this video is not available")
        || stderr_lower.contains("video has been removed")
        || stderr_lower.contains("this video does not exist")
        || stderr_lower.contains("not available in your country")
        || stderr_lower.contains("geo restriction")
        || stderr_lower.contains("geo-restricted")
        || stderr_lower.contains("login required")
        || stderr_lower.contains("age-restricted")
        || stderr_lower.contains("http error 403")
        || stderr_lower.contains("http error 404")
        || stderr_lower.contains("http error 410")
    {
        return YtDlpErrorType::VideoUnavailable;
    }

    if stderr_lower.contains("unsupported url")
        || stderr_lower.contains("no video formats found")
        || stderr_lower.contains("requested format is not available")
    {
        return YtDlpErrorType::Unsupported;
    }

    if stderr_lower.contains("timed out")
        || stderr_lower.contains("timeout")
        || stderr_lower.contains("connection")
        || stderr_lower.contains("network is unreachable")
        || stderr_lower.contains("name or service not known")
        || stderr_lower.contains("temporary failure in name resolution")
        || stderr_lower.contains("failed to connect")
    {
        return YtDlpErrorType::NetworkError;
    }

    YtDlpErrorType::Unknown
}

/// Whether the failure points at the deployment rather than the content
pub fn is_operator_problem(error_type: YtDlpErrorType) -> bool {
    matches!(error_type, YtDlpErrorType::Unknown)
}

/// Last meaningful stderr line, usually the `ERROR: ...` summary
pub fn summarize_stderr(stderr: &str) -> String {
    let line = stderr
        .lines()
        .rev()
        .map(str::trim)
        .find(|l| l.starts_with("ERROR:"))
        .or_else(|| stderr.lines().rev().map(str::trim).find(|l| !l.is_empty()))
        .unwrap_or("yt-dlp exited without an error message");
    line.trim_start_matches("ERROR:").trim().to_string()
}
