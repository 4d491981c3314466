//! yt-dlp backed [`ExtractionTool`]

use async_trait::async_trait;
use serde::Deserialize;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;
use url::Url;

use crate::core::config::download;
use crate::core::error::AppError;
use crate::core::process::run_with_timeout;
use crate::download::artifact::{MediaFormat, SourceVariant};
use crate::download::error::ExtractionError;
use crate::download::extractor::{ExtractedMedia, ExtractionTool};
use crate::download::ytdlp_errors::{analyze_ytdlp_error, is_operator_problem, summarize_stderr};

/// Stem of every file yt-dlp writes into the workspace
const OUTPUT_STEM: &str = "media";

/// Suffixes yt-dlp leaves behind for unfinished or auxiliary files
const SCRATCH_SUFFIXES: &[&str] = &[".part", ".ytdl", ".json", ".temp"];

/// Subset of `--dump-json` output we care about
#[derive(Debug, Default, Deserialize)]
pub struct VideoInfo {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub formats: Vec<FormatInfo>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FormatInfo {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub format_note: Option<String>,
}

impl VideoInfo {
    /// Parses the first JSON object line in yt-dlp's stdout.
    pub fn from_stdout(stdout: &str) -> Option<Self> {
        stdout
            .lines()
            .map(str::trim)
            .filter(|line| line.starts_with('{'))
            .find_map(|line| serde_json::from_str(line).ok())
    }

    /// Direct media URL: the selected format's url, else the tallest format's
    pub fn direct_url(&self) -> Option<String> {
        self.url.clone().or_else(|| {
            self.formats
                .iter()
                .filter(|f| f.url.is_some())
                .max_by_key(|f| f.height.unwrap_or(0))
                .and_then(|f| f.url.clone())
        })
    }
}

/// Runs the `yt-dlp` binary
#[derive(Debug, Clone)]
pub struct YtDlpTool {
    bin: String,
    ffmpeg_bin: String,
    timeout: Duration,
}

impl YtDlpTool {
    pub fn new(bin: impl Into<String>, ffmpeg_bin: impl Into<String>) -> Self {
        Self {
            bin: bin.into(),
            ffmpeg_bin: ffmpeg_bin.into(),
            timeout: download::ytdlp_timeout(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// yt-dlp `-f` expression for a variant and format
    pub fn format_selector(variant: SourceVariant, format: MediaFormat) -> &'static str {
        match (variant, format) {
            (SourceVariant::NoWatermark, MediaFormat::Video) => "bv*[format_note!*=?watermark]+ba/b[format_note!*=?watermark]",
            (SourceVariant::Standard, MediaFormat::Video) => "bv*+ba/best",
            (SourceVariant::NoWatermark, MediaFormat::Audio) => "ba/b[format_note!*=?watermark]",
            (SourceVariant::Standard, MediaFormat::Audio) => "bestaudio/best",
        }
    }

    /// Full argument list, without the program name
    pub fn build_args(&self, url: &Url, variant: SourceVariant, format: MediaFormat, dest: &Path) -> Vec<OsString> {
        let socket_timeout = download::SOCKET_TIMEOUT_SECS.to_string();
        let mut args: Vec<OsString> = [
            "--no-playlist",
            "--no-warnings",
            "--no-progress",
            "--socket-timeout",
            socket_timeout.as_str(),
            "--no-simulate",
            "--dump-json",
            "-f",
            Self::format_selector(variant, format),
            "-o",
        ]
        .iter()
        .map(OsString::from)
        .collect();
        args.push(dest.join(format!("{}.%(ext)s", OUTPUT_STEM)).into_os_string());

        match format {
            MediaFormat::Video => {
                args.extend(["--merge-output-format", "mp4"].iter().map(OsString::from));
            }
            MediaFormat::Audio => {
                args.extend(
                    [
                        "--extract-audio",
                        "--audio-format",
                        "mp3",
                        "--audio-quality",
                        download::AUDIO_QUALITY,
                    ]
                    .iter()
                    .map(OsString::from),
                );
            }
        }

        if self.ffmpeg_bin != "ffmpeg" {
            args.push("--ffmpeg-location".into());
            args.push(self.ffmpeg_bin.clone().into());
        }

        args.push("--".into());
        args.push(url.as_str().into());
        args
    }
}

/// Finds the finished output yt-dlp wrote into `dir`.
///
/// `media.<ext>` for the requested format wins. Otherwise the first other
/// finished `media.*` file in name order is taken, so a post-processing
/// leftover never shadows the real output.
pub async fn find_output_file(dir: &Path, format: MediaFormat) -> std::io::Result<Option<PathBuf>> {
    let expected = dir.join(format!("{}.{}", OUTPUT_STEM, format.extension()));
    if fs_err::tokio::metadata(&expected).await.is_ok_and(|m| m.is_file()) {
        return Ok(Some(expected));
    }

    let mut entries = fs_err::tokio::read_dir(dir).await?;
    let mut candidates = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if !name.starts_with(&format!("{}.", OUTPUT_STEM)) {
            continue;
        }
        if SCRATCH_SUFFIXES.iter().any(|suffix| name.ends_with(suffix)) {
            continue;
        }
        if entry.file_type().await?.is_file() {
            candidates.push(entry.path());
        }
    }
    candidates.sort();
    Ok(candidates.into_iter().next())
}

#[async_trait]
impl ExtractionTool for YtDlpTool {
    fn name(&self) -> &str {
        "yt-dlp"
    }

    async fn extract(
        &self,
        url: &Url,
        variant: SourceVariant,
        format: MediaFormat,
        dest: &Path,
    ) -> Result<ExtractedMedia, ExtractionError> {
        log::debug!("yt-dlp {} {} -> {}", variant, format, dest.display());

        let mut cmd = Command::new(&self.bin);
        cmd.args(self.build_args(url, variant, format, dest));

        let output = match run_with_timeout(&mut cmd, &self.bin, self.timeout).await {
            Ok(output) => output,
            Err(AppError::Timeout { secs, .. }) => return Err(ExtractionError::Timeout(secs)),
            Err(AppError::Io(e)) => {
                log::error!("Failed to run {}: {}", self.bin, e);
                return Err(ExtractionError::Tool(format!("cannot run {}: {}", self.bin, e)));
            }
            Err(e) => return Err(ExtractionError::Tool(e.to_string())),
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let error_type = analyze_ytdlp_error(&stderr);
            let summary = summarize_stderr(&stderr);
            if is_operator_problem(error_type) {
                log::error!("yt-dlp failed ({}): {}", output.status, stderr.trim());
            } else {
                log::warn!("yt-dlp failed ({}): {}", error_type.as_ref(), summary);
            }
            return Err(ExtractionError::from_ytdlp(error_type, summary));
        }

        let info = VideoInfo::from_stdout(&String::from_utf8_lossy(&output.stdout)).unwrap_or_default();
        let path = find_output_file(dest, format).await?.ok_or(ExtractionError::NoOutput)?;

        Ok(ExtractedMedia {
            path,
            direct_url: info.direct_url(),
            title: info.title,
        })
    }
}
