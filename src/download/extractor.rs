//! Extractor adapter: turns a TikTok link into a media file on disk.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use url::Url;

use crate::core::validation::validate_tiktok_url;
use crate::download::artifact::{MediaArtifact, MediaFormat, SourceVariant};
use crate::download::error::ExtractionError;
use crate::download::workspace::RequestWorkspace;

/// Caption used when the extractor reports no title
pub const DEFAULT_TITLE: &str = "TikTok video";

/// What an extraction tool hands back
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedMedia {
    pub path: PathBuf,
    pub title: Option<String>,
    pub direct_url: Option<String>,
}

/// External downloader (yt-dlp in production)
#[async_trait]
pub trait ExtractionTool: Send + Sync {
    /// Human-readable name of this tool, for logs
    fn name(&self) -> &str;

    /// Downloads one variant of `url` into `dest`.
    async fn extract(
        &self,
        url: &Url,
        variant: SourceVariant,
        format: MediaFormat,
        dest: &Path,
    ) -> Result<ExtractedMedia, ExtractionError>;
}

/// Validates the link, then tries the no-watermark stream and falls back to
/// the standard one exactly once.
#[derive(Clone)]
pub struct Extractor {
    tool: Arc<dyn ExtractionTool>,
}

impl Extractor {
    pub fn new(tool: Arc<dyn ExtractionTool>) -> Self {
        Self { tool }
    }

    pub async fn fetch(
        &self,
        raw_url: &str,
        format: MediaFormat,
        workspace: &RequestWorkspace,
    ) -> Result<MediaArtifact, ExtractionError> {
        let url = validate_tiktok_url(raw_url)?;

        let first = match self.attempt(&url, SourceVariant::NoWatermark, format, workspace).await {
            Ok(artifact) => return Ok(artifact),
            Err(e) if !e.is_retryable() => return Err(e),
            Err(e) => e,
        };

        log::warn!(
            "{} no-watermark {} failed for {} ({}: {}), retrying standard variant",
            self.tool.name(),
            format,
            url,
            first.kind(),
            first
        );
        workspace.clear().await?;

        self.attempt(&url, SourceVariant::Standard, format, workspace)
            .await
            .inspect_err(|e| log::warn!("{} standard {} failed for {}: {}", self.tool.name(), format, url, e))
    }

    async fn attempt(
        &self,
        url: &Url,
        variant: SourceVariant,
        format: MediaFormat,
        workspace: &RequestWorkspace,
    ) -> Result<MediaArtifact, ExtractionError> {
        let media = self.tool.extract(url, variant, format, workspace.path()).await?;

        let size_bytes = match fs_err::tokio::metadata(&media.path).await {
            Ok(meta) if meta.is_file() => meta.len(),
            Ok(_) => return Err(ExtractionError::NoOutput),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(ExtractionError::NoOutput),
            Err(e) => return Err(ExtractionError::Io(e)),
        };
        if size_bytes == 0 {
            return Err(ExtractionError::NoOutput);
        }

        let title = media
            .title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| DEFAULT_TITLE.to_string());

        log::info!(
            "Fetched {} {} ({} bytes) into {}",
            variant,
            format,
            size_bytes,
            media.path.display()
        );

        Ok(MediaArtifact {
            path: media.path,
            size_bytes,
            format,
            variant,
            title,
            direct_url: media.direct_url,
        })
    }
}
