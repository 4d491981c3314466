//! ffmpeg-backed compression
//!
//! - Video: H.264 at the configured CRF, height capped, AAC audio, faststart
//! - Audio: MP3 at a reduced bitrate

use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;

use super::{CompressionError, CompressionResult, TranscodeParams, TranscodeTool};
use crate::core::config::compression;
use crate::core::error::AppError;
use crate::core::process::run_with_timeout;
use crate::download::artifact::MediaFormat;

/// Runs the `ffmpeg` binary
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    bin: String,
    timeout: Duration,
}

impl FfmpegTranscoder {
    pub fn new(bin: impl Into<String>) -> Self {
        Self {
            bin: bin.into(),
            timeout: compression::ffmpeg_timeout(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Output file name for a pass, kept inside the request workspace
    pub fn output_path(output_dir: &Path, params: &TranscodeParams) -> PathBuf {
        match params.format {
            MediaFormat::Video => output_dir.join(format!("compressed_crf{}.mp4", params.crf)),
            MediaFormat::Audio => output_dir.join("compressed.mp3"),
        }
    }

    /// Full ffmpeg argument list, without the program name
    pub fn build_args(input: &Path, output: &Path, params: &TranscodeParams) -> Vec<OsString> {
        let mut args: Vec<OsString> = ["-hide_banner", "-loglevel", "error", "-y", "-i"]
            .iter()
            .map(OsString::from)
            .collect();
        args.push(input.as_os_str().to_owned());

        match params.format {
            MediaFormat::Video => {
                // even height keeps libx264 happy; min() avoids upscaling
                let scale = format!("scale=-2:'trunc(min({},ih)/2)*2'", params.max_height);
                let crf = params.crf.to_string();
                args.extend(
                    [
                        "-vf",
                        scale.as_str(),
                        "-c:v",
                        "libx264",
                        "-preset",
                        compression::PRESET,
                        "-crf",
                        crf.as_str(),
                        "-c:a",
                        "aac",
                        "-b:a",
                        compression::VIDEO_AUDIO_BITRATE,
                        "-movflags",
                        "+faststart",
                    ]
                    .iter()
                    .map(OsString::from),
                );
            }
            MediaFormat::Audio => {
                args.extend(
                    ["-vn", "-c:a", "libmp3lame", "-b:a", compression::AUDIO_BITRATE]
                        .iter()
                        .map(OsString::from),
                );
            }
        }

        args.push(output.as_os_str().to_owned());
        args
    }
}

#[async_trait]
impl TranscodeTool for FfmpegTranscoder {
    async fn transcode(&self, input: &Path, output_dir: &Path, params: &TranscodeParams) -> CompressionResult<PathBuf> {
        if !input.exists() {
            return Err(CompressionError::InputNotFound(input.display().to_string()));
        }

        let output_path = Self::output_path(output_dir, params);
        log::info!(
            "Compressing {} -> {} (crf {}, max height {})",
            input.display(),
            output_path.display(),
            params.crf,
            params.max_height
        );

        let mut cmd = Command::new(&self.bin);
        cmd.args(Self::build_args(input, &output_path, params));

        let result = match run_with_timeout(&mut cmd, &self.bin, self.timeout).await {
            Ok(output) if output.status.success() => Ok(output_path.clone()),
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                log::error!("FFmpeg compression error: {}", stderr.trim());
                Err(CompressionError::Ffmpeg(stderr.trim().to_string()))
            }
            Err(AppError::Timeout { secs, .. }) => Err(CompressionError::Timeout(secs)),
            Err(AppError::Io(e)) => Err(CompressionError::Io(e)),
            Err(e) => Err(CompressionError::Ffmpeg(e.to_string())),
        };

        if result.is_err() {
            let _ = fs_err::tokio::remove_file(&output_path).await;
        }
        result
    }
}
