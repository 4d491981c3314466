//! Compressor adapter: one re-encode pass for media over the size limit.

use std::sync::Arc;

use crate::conversion::{get_file_size, CompressionError, CompressionResult, TranscodeParams, TranscodeTool};
use crate::core::utils::format_mb;
use crate::download::artifact::MediaArtifact;
use crate::download::workspace::RequestWorkspace;

#[derive(Clone)]
pub struct Compressor {
    tool: Arc<dyn TranscodeTool>,
}

impl Compressor {
    pub fn new(tool: Arc<dyn TranscodeTool>) -> Self {
        Self { tool }
    }

    /// Re-encodes `artifact` once.
    ///
    /// On success the original file is discarded and the returned artifact
    /// points at the compressed copy. When the copy is still over
    /// `max_size_bytes` it is deleted and [`CompressionError::StillTooLarge`]
    /// is returned; the original stays in the workspace.
    pub async fn compress(
        &self,
        artifact: &MediaArtifact,
        max_size_bytes: u64,
        crf: u8,
        max_height: u32,
        workspace: &RequestWorkspace,
    ) -> CompressionResult<MediaArtifact> {
        let params = TranscodeParams {
            format: artifact.format,
            crf,
            max_height,
        };

        let output = self.tool.transcode(&artifact.path, workspace.path(), &params).await?;
        let size_bytes = match get_file_size(&output).await {
            Ok(size) => size,
            Err(e) => {
                workspace.discard(&output).await;
                return Err(e);
            }
        };

        if size_bytes > max_size_bytes {
            log::warn!(
                "Compressed {} is still {} MB (limit {} MB)",
                artifact.format,
                format_mb(size_bytes),
                format_mb(max_size_bytes)
            );
            workspace.discard(&output).await;
            return Err(CompressionError::StillTooLarge {
                actual: size_bytes,
                limit: max_size_bytes,
            });
        }

        log::info!(
            "Compressed {} from {} MB to {} MB",
            artifact.format,
            format_mb(artifact.size_bytes),
            format_mb(size_bytes)
        );
        workspace.discard(&artifact.path).await;

        Ok(MediaArtifact {
            path: output,
            size_bytes,
            ..artifact.clone()
        })
    }
}
