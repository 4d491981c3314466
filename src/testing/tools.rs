//! Scripted extraction and transcoding tools

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use url::Url;

use crate::conversion::{CompressionError, CompressionResult, FfmpegTranscoder, TranscodeParams, TranscodeTool};
use crate::download::artifact::{MediaFormat, SourceVariant};
use crate::download::error::ExtractionError;
use crate::download::extractor::{ExtractedMedia, ExtractionTool};

type ErrorFactory = Box<dyn Fn() -> ExtractionError + Send + Sync>;

enum Script {
    Size(u64),
    Fail(ErrorFactory),
}

/// Creates `path` as a sparse file of `size` bytes
async fn write_sparse(path: &Path, size: u64) -> std::io::Result<()> {
    let file = fs_err::tokio::File::create(path).await?;
    file.set_len(size).await?;
    Ok(())
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// [`ExtractionTool`] whose result per variant is fixed up front.
///
/// An unscripted variant fails with [`ExtractionError::Tool`].
pub struct ScriptedExtractionTool {
    no_watermark: Option<Script>,
    standard: Option<Script>,
    title: Option<String>,
    direct_url: Option<String>,
    leave_partial: bool,
    calls: Mutex<Vec<SourceVariant>>,
    formats: Mutex<Vec<MediaFormat>>,
    urls: Mutex<Vec<String>>,
}

impl Default for ScriptedExtractionTool {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedExtractionTool {
    pub fn new() -> Self {
        Self {
            no_watermark: None,
            standard: None,
            title: Some("Test clip".to_string()),
            direct_url: Some("https://cdn.tiktok.test/media.mp4".to_string()),
            leave_partial: false,
            calls: Mutex::new(Vec::new()),
            formats: Mutex::new(Vec::new()),
            urls: Mutex::new(Vec::new()),
        }
    }

    pub fn no_watermark_size(mut self, size: u64) -> Self {
        self.no_watermark = Some(Script::Size(size));
        self
    }

    pub fn no_watermark_error(mut self, error: impl Fn() -> ExtractionError + Send + Sync + 'static) -> Self {
        self.no_watermark = Some(Script::Fail(Box::new(error)));
        self
    }

    pub fn standard_size(mut self, size: u64) -> Self {
        self.standard = Some(Script::Size(size));
        self
    }

    pub fn standard_error(mut self, error: impl Fn() -> ExtractionError + Send + Sync + 'static) -> Self {
        self.standard = Some(Script::Fail(Box::new(error)));
        self
    }

    pub fn title(mut self, title: Option<String>) -> Self {
        self.title = title;
        self
    }

    pub fn direct_url(mut self, direct_url: Option<String>) -> Self {
        self.direct_url = direct_url;
        self
    }

    /// Leave a `.part` file behind on failure, like an interrupted download
    pub fn leave_partial(mut self, leave: bool) -> Self {
        self.leave_partial = leave;
        self
    }

    /// Variants requested so far, in order
    pub fn calls(&self) -> Vec<SourceVariant> {
        lock(&self.calls).clone()
    }

    /// Formats requested so far, in order
    pub fn formats(&self) -> Vec<MediaFormat> {
        lock(&self.formats).clone()
    }

    /// Links requested so far, one per variant tried
    pub fn urls(&self) -> Vec<String> {
        lock(&self.urls).clone()
    }
}

#[async_trait]
impl ExtractionTool for ScriptedExtractionTool {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn extract(
        &self,
        url: &Url,
        variant: SourceVariant,
        format: MediaFormat,
        dest: &Path,
    ) -> Result<ExtractedMedia, ExtractionError> {
        lock(&self.urls).push(url.as_str().to_string());
        lock(&self.calls).push(variant);
        lock(&self.formats).push(format);

        let script = match variant {
            SourceVariant::NoWatermark => &self.no_watermark,
            SourceVariant::Standard => &self.standard,
        };

        match script {
            Some(Script::Size(size)) => {
                let path = dest.join(format!("media.{}", format.extension()));
                write_sparse(&path, *size).await?;
                Ok(ExtractedMedia {
                    path,
                    title: self.title.clone(),
                    direct_url: self.direct_url.clone(),
                })
            }
            Some(Script::Fail(error)) => {
                if self.leave_partial {
                    write_sparse(&dest.join(format!("media.{}.part", format.extension())), 1024).await?;
                }
                Err(error())
            }
            None => Err(ExtractionError::Tool(format!("{} variant not scripted", variant))),
        }
    }
}

/// [`TranscodeTool`] that produces an output of a fixed size, or fails
pub struct ScriptedTranscoder {
    output_size: Option<u64>,
    failure: Option<String>,
    calls: AtomicUsize,
    last_params: Mutex<Option<TranscodeParams>>,
    inputs: Mutex<Vec<PathBuf>>,
}

impl ScriptedTranscoder {
    pub fn with_output_size(size: u64) -> Self {
        Self {
            output_size: Some(size),
            failure: None,
            calls: AtomicUsize::new(0),
            last_params: Mutex::new(None),
            inputs: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            output_size: None,
            failure: Some(message.into()),
            calls: AtomicUsize::new(0),
            last_params: Mutex::new(None),
            inputs: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_params(&self) -> Option<TranscodeParams> {
        *lock(&self.last_params)
    }

    pub fn inputs(&self) -> Vec<PathBuf> {
        lock(&self.inputs).clone()
    }
}

#[async_trait]
impl TranscodeTool for ScriptedTranscoder {
    async fn transcode(&self, input: &Path, output_dir: &Path, params: &TranscodeParams) -> CompressionResult<PathBuf> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *lock(&self.last_params) = Some(*params);
        lock(&self.inputs).push(input.to_path_buf());

        if !input.exists() {
            return Err(CompressionError::InputNotFound(input.display().to_string()));
        }
        if let Some(message) = &self.failure {
            return Err(CompressionError::Ffmpeg(message.clone()));
        }

        let output = FfmpegTranscoder::output_path(output_dir, params);
        write_sparse(&output, self.output_size.unwrap_or(0)).await?;
        Ok(output)
    }
}
