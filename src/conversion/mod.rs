//! Media re-encoding
//!
//! Only one conversion exists: shrinking a file that is too large for
//! Telegram. Video is re-encoded with x264 at a fixed CRF and capped height,
//! audio is re-encoded to a lower MP3 bitrate.
//!
//! The pipeline talks to the [`TranscodeTool`] trait so tests can swap the
//! ffmpeg subprocess for a scripted double.

pub mod video;

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::download::artifact::MediaFormat;

pub use video::FfmpegTranscoder;

/// Errors that can occur during compression
#[derive(Error, Debug)]
pub enum CompressionError {
    #[error("FFmpeg error: {0}")]
    Ffmpeg(String),

    #[error("Input file not found: {0}")]
    InputNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ffmpeg timed out after {0}s")]
    Timeout(u64),

    #[error("File size exceeds limit after compression: {actual} > {limit}")]
    StillTooLarge { actual: u64, limit: u64 },
}

pub type CompressionResult<T> = Result<T, CompressionError>;

/// Encoder settings for one compression pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TranscodeParams {
    pub format: MediaFormat,
    /// x264 constant rate factor, 0..=51
    pub crf: u8,
    /// Output height cap in pixels; smaller sources are never upscaled
    pub max_height: u32,
}

/// Something that can re-encode a media file into a directory
#[async_trait]
pub trait TranscodeTool: Send + Sync {
    /// Re-encodes `input` and returns the path of the new file inside `output_dir`.
    ///
    /// Implementations must not leave a partial output behind on failure.
    async fn transcode(&self, input: &Path, output_dir: &Path, params: &TranscodeParams) -> CompressionResult<PathBuf>;
}

/// Get file size in bytes
pub async fn get_file_size<P: AsRef<Path>>(path: P) -> CompressionResult<u64> {
    let metadata = fs_err::tokio::metadata(path.as_ref()).await?;
    Ok(metadata.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_file_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.bin");
        std::fs::write(&path, vec![0u8; 1234]).unwrap();
        assert_eq!(get_file_size(&path).await.unwrap(), 1234);
        assert!(matches!(
            get_file_size(dir.path().join("missing")).await,
            Err(CompressionError::Io(_))
        ));
    }

    #[test]
    fn test_still_too_large_display() {
        let err = CompressionError::StillTooLarge { actual: 10, limit: 5 };
        assert_eq!(err.to_string(), "File size exceeds limit after compression: 10 > 5");
    }
}
