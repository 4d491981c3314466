//! Media produced by a request

use std::path::PathBuf;
use strum::{AsRefStr, Display};

/// What the user asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum MediaFormat {
    Video,
    Audio,
}

impl MediaFormat {
    /// Container extension of the delivered file
    pub fn extension(self) -> &'static str {
        match self {
            MediaFormat::Video => "mp4",
            MediaFormat::Audio => "mp3",
        }
    }
}

/// Which stream variant the extractor was asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr)]
#[strum(serialize_all = "kebab-case")]
pub enum SourceVariant {
    /// Stream served without the platform's overlay branding
    NoWatermark,
    /// Whatever the platform serves by default
    Standard,
}

/// A downloaded (or re-encoded) media file living inside a request workspace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaArtifact {
    pub path: PathBuf,
    pub size_bytes: u64,
    pub format: MediaFormat,
    pub variant: SourceVariant,
    /// Human title used for the caption
    pub title: String,
    /// Direct media URL reported by the extractor, used for the fallback link
    pub direct_url: Option<String>,
}

impl MediaArtifact {
    pub fn exceeds(&self, max_size_bytes: u64) -> bool {
        self.size_bytes > max_size_bytes
    }
}
