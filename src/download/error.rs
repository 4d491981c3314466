use thiserror::Error;

use crate::conversion::CompressionError;
use crate::core::messages;
use crate::core::validation::ValidationError;
use crate::download::ytdlp_errors::YtDlpErrorType;

/// Why fetching the media failed.
///
/// Every variant ends the request with a chat reply; [`Self::user_message`]
/// picks the text and [`Self::kind`] gives a stable label for the logs.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("invalid link: {0}")]
    InvalidUrl(#[from] ValidationError),

    /// Private, removed, geo-blocked or age-restricted
    #[error("video unavailable: {0}")]
    Unavailable(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("unsupported link: {0}")]
    Unsupported(String),

    /// yt-dlp failed for a reason we could not classify
    #[error("yt-dlp failed: {0}")]
    Tool(String),

    /// yt-dlp exited successfully but produced no media file
    #[error("yt-dlp produced no output file")]
    NoOutput,

    #[error("yt-dlp timed out after {0}s")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExtractionError {
    /// Builds the error for a failed yt-dlp run from its classified stderr
    pub fn from_ytdlp(error_type: YtDlpErrorType, summary: String) -> Self {
        match error_type {
            YtDlpErrorType::VideoUnavailable => ExtractionError::Unavailable(summary),
            YtDlpErrorType::NetworkError => ExtractionError::Network(summary),
            YtDlpErrorType::Unsupported => ExtractionError::Unsupported(summary),
            YtDlpErrorType::Unknown => ExtractionError::Tool(summary),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ExtractionError::InvalidUrl(_) => "invalid_url",
            ExtractionError::Unavailable(_) => "unavailable",
            ExtractionError::Network(_) => "network",
            ExtractionError::Unsupported(_) => "unsupported",
            ExtractionError::Tool(_) => "tool",
            ExtractionError::NoOutput => "no_output",
            ExtractionError::Timeout(_) => "timeout",
            ExtractionError::Io(_) => "io",
        }
    }

    /// Whether retrying with another stream variant can help
    pub fn is_retryable(&self) -> bool {
        !matches!(self, ExtractionError::InvalidUrl(_))
    }

    pub fn user_message(&self) -> String {
        match self {
            ExtractionError::InvalidUrl(_) => messages::INVALID_LINK.to_string(),
            ExtractionError::Unavailable(_) => messages::VIDEO_UNAVAILABLE.to_string(),
            ExtractionError::Network(_) | ExtractionError::Timeout(_) => messages::NETWORK_PROBLEM.to_string(),
            ExtractionError::Unsupported(_) => messages::UNSUPPORTED_LINK.to_string(),
            ExtractionError::Tool(cause) => messages::extraction_failed(cause),
            ExtractionError::NoOutput | ExtractionError::Io(_) => messages::INTERNAL_ERROR.to_string(),
        }
    }
}

/// Failure to hand a reply or file to the chat
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("Telegram error: {0}")]
    Telegram(#[from] teloxide::RequestError),

    #[error("transport error: {0}")]
    Transport(String),
}

/// Every way a delivery request can end without the media being sent
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("user is not on the admin list")]
    AuthorizationDenied,

    #[error("rate limit exceeded")]
    RateLimited,

    #[error("extraction failed: {0}")]
    ExtractionFailed(#[from] ExtractionError),

    /// Compression failed or did not get under the limit; the user gets a link
    #[error("compression failed ({source}), falling back to a link")]
    CompressionFailed {
        #[source]
        source: CompressionError,
        fallback_link: String,
        size_bytes: u64,
    },

    #[error("delivery failed: {0}")]
    DeliveryFailed(#[from] DeliveryError),

    #[error("workspace error: {0}")]
    Workspace(std::io::Error),
}
