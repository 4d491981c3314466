//! Delivery pipeline orchestrator.
//!
//! One request walks through
//!   received → authorized → rate ok → fetched → size checked → (compressed) → delivered
//! and stops at the first failure. Every failure is answered in chat and
//! mapped to a terminal [`DeliveryOutcome`]. Temporary files live in a
//! [`RequestWorkspace`] that is dropped before the outcome is returned.

use bon::Builder;
use chrono::{DateTime, Utc};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use strum::{AsRefStr, Display};
use teloxide::types::{ChatId, UserId};

use crate::conversion::TranscodeTool;
use crate::core::access::AccessGuard;
use crate::core::config::{self, BotConfig};
use crate::core::messages;
use crate::core::rate_limiter::RateLimiter;
use crate::core::utils::{format_mb, truncate_chars};
use crate::download::artifact::MediaFormat;
use crate::download::compressor::Compressor;
use crate::download::error::PipelineError;
use crate::download::extractor::{ExtractionTool, Extractor};
use crate::download::send::{send_media, Transport};
use crate::download::workspace::RequestWorkspace;

/// A single "send me this video" request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryRequest {
    pub user_id: UserId,
    pub chat_id: ChatId,
    pub url: String,
    pub format: MediaFormat,
    pub received_at: DateTime<Utc>,
}

impl DeliveryRequest {
    pub fn new(user_id: UserId, chat_id: ChatId, url: impl Into<String>, format: MediaFormat) -> Self {
        Self {
            user_id,
            chat_id,
            url: url.into(),
            format,
            received_at: Utc::now(),
        }
    }
}

impl fmt::Display for DeliveryRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} request from user {} in chat {} for {}",
            self.format, self.user_id, self.chat_id, self.url
        )
    }
}

/// Terminal state of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryOutcome {
    Delivered { compressed: bool },
    Denied,
    RateLimited,
    FetchFailed,
    CompressFailedFallbackLink,
    SendFailed,
}

impl DeliveryOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, DeliveryOutcome::Delivered { .. })
    }
}

/// Intermediate states, logged at debug level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum PipelineStage {
    Received,
    Authorized,
    RateOk,
    Fetched,
    SizeChecked,
    Compressed,
}

/// Size and encoder limits applied to every request
#[derive(Debug, Clone, PartialEq, Eq, Builder)]
pub struct PipelineSettings {
    pub max_size_bytes: u64,
    #[builder(default = 28)]
    pub crf: u8,
    #[builder(default = 720)]
    pub max_height: u32,
    #[builder(into)]
    pub temp_dir: PathBuf,
}

impl PipelineSettings {
    pub fn from_config(config: &BotConfig) -> Self {
        Self::builder()
            .max_size_bytes(config.compress_max_bytes())
            .crf(config.crf)
            .max_height(config.max_height)
            .temp_dir(config.temp_dir.clone())
            .build()
    }
}

pub struct DeliveryPipeline {
    access: AccessGuard,
    rate_limiter: Arc<RateLimiter>,
    extractor: Extractor,
    compressor: Compressor,
    transport: Arc<dyn Transport>,
    settings: PipelineSettings,
}

impl DeliveryPipeline {
    pub fn new(
        access: AccessGuard,
        rate_limiter: Arc<RateLimiter>,
        extraction_tool: Arc<dyn ExtractionTool>,
        transcoder: Arc<dyn TranscodeTool>,
        transport: Arc<dyn Transport>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            access,
            rate_limiter,
            extractor: Extractor::new(extraction_tool),
            compressor: Compressor::new(transcoder),
            transport,
            settings,
        }
    }

    pub fn access(&self) -> &AccessGuard {
        &self.access
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Runs a request to completion and replies in chat. Never fails.
    pub async fn handle(&self, request: &DeliveryRequest) -> DeliveryOutcome {
        log::info!("Received {}", request);
        stage(request, PipelineStage::Received);

        let outcome = match self.run(request).await {
            Ok(outcome) => outcome,
            Err(err) => self.report_failure(request, err).await,
        };

        match outcome {
            DeliveryOutcome::Delivered { compressed } => log::info!(
                "{} for user {} (compressed: {}, {} ms)",
                outcome,
                request.user_id,
                compressed,
                (Utc::now() - request.received_at).num_milliseconds()
            ),
            _ => log::warn!("{} for user {}: {}", outcome, request.user_id, request.url),
        }
        outcome
    }

    async fn run(&self, request: &DeliveryRequest) -> Result<DeliveryOutcome, PipelineError> {
        if !self.access.is_authorized(request.user_id) {
            return Err(PipelineError::AuthorizationDenied);
        }
        stage(request, PipelineStage::Authorized);

        if !self.rate_limiter.allow_now(request.user_id) {
            return Err(PipelineError::RateLimited);
        }
        stage(request, PipelineStage::RateOk);

        if let Err(e) = self.transport.notify_upload(request.chat_id, request.format).await {
            log::debug!("Chat action failed for chat {}: {}", request.chat_id, e);
        }

        let workspace = RequestWorkspace::create(&self.settings.temp_dir)
            .await
            .map_err(PipelineError::Workspace)?;

        let artifact = self.extractor.fetch(&request.url, request.format, &workspace).await?;
        stage(request, PipelineStage::Fetched);

        let (artifact, compressed) = if artifact.exceeds(self.settings.max_size_bytes) {
            log::info!(
                "{} is {} MB, over the {} MB limit, compressing",
                artifact.path.display(),
                format_mb(artifact.size_bytes),
                format_mb(self.settings.max_size_bytes)
            );
            let result = self
                .compressor
                .compress(
                    &artifact,
                    self.settings.max_size_bytes,
                    self.settings.crf,
                    self.settings.max_height,
                    &workspace,
                )
                .await;
            match result {
                Ok(smaller) => {
                    stage(request, PipelineStage::Compressed);
                    (smaller, true)
                }
                Err(source) => {
                    return Err(PipelineError::CompressionFailed {
                        source,
                        fallback_link: artifact.direct_url.clone().unwrap_or_else(|| request.url.clone()),
                        size_bytes: artifact.size_bytes,
                    });
                }
            }
        } else {
            (artifact, false)
        };
        stage(request, PipelineStage::SizeChecked);

        let caption = truncate_chars(&artifact.title, config::telegram::CAPTION_MAX_CHARS);
        send_media(
            self.transport.as_ref(),
            request.chat_id,
            artifact.format,
            &artifact.path,
            caption,
        )
        .await?;

        Ok(DeliveryOutcome::Delivered { compressed })
    }

    /// Answers the user and maps the error to its terminal state.
    async fn report_failure(&self, request: &DeliveryRequest, err: PipelineError) -> DeliveryOutcome {
        let (reply, outcome) = match &err {
            PipelineError::AuthorizationDenied => (messages::ACCESS_DENIED.to_string(), DeliveryOutcome::Denied),
            PipelineError::RateLimited => (messages::RATE_LIMITED.to_string(), DeliveryOutcome::RateLimited),
            PipelineError::ExtractionFailed(e) => {
                log::warn!("Extraction failed ({}) for {}: {}", e.kind(), request.url, e);
                (e.user_message(), DeliveryOutcome::FetchFailed)
            }
            PipelineError::CompressionFailed {
                source,
                fallback_link,
                size_bytes,
            } => {
                log::warn!("Compression failed for {}: {}", request.url, source);
                (
                    messages::fallback_link(&format_mb(*size_bytes), fallback_link),
                    DeliveryOutcome::CompressFailedFallbackLink,
                )
            }
            PipelineError::DeliveryFailed(e) => {
                log::error!("Failed to deliver media to chat {}: {}", request.chat_id, e);
                (messages::SEND_FAILED.to_string(), DeliveryOutcome::SendFailed)
            }
            PipelineError::Workspace(e) => {
                log::error!("Failed to create workspace in {}: {}", self.settings.temp_dir.display(), e);
                (messages::INTERNAL_ERROR.to_string(), DeliveryOutcome::FetchFailed)
            }
        };

        if let Err(e) = self.transport.send_text(request.chat_id, &reply).await {
            log::warn!("Failed to send {} reply to chat {}: {}", outcome, request.chat_id, e);
        }
        outcome
    }
}

fn stage(request: &DeliveryRequest, stage: PipelineStage) {
    log::debug!("[{} {}] -> {}", request.user_id, request.format, stage);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{RecordingTransport, ScriptedExtractionTool, ScriptedTranscoder, MB};

    #[test]
    fn test_outcome_names() {
        assert_eq!(DeliveryOutcome::Delivered { compressed: true }.to_string(), "DELIVERED");
        assert_eq!(
            DeliveryOutcome::CompressFailedFallbackLink.to_string(),
            "COMPRESS_FAILED_FALLBACK_LINK"
        );
        assert_eq!(PipelineStage::RateOk.to_string(), "RATE_OK");
    }

    #[test]
    fn test_settings_defaults() {
        let settings = PipelineSettings::builder()
            .max_size_bytes(45 * MB)
            .temp_dir("/tmp")
            .build();
        assert_eq!(settings.crf, 28);
        assert_eq!(settings.max_height, 720);
    }

    #[test]
    fn test_request_display() {
        let req = DeliveryRequest::new(UserId(7), ChatId(9), "https://vm.tiktok.com/x/", MediaFormat::Audio);
        assert_eq!(
            req.to_string(),
            "audio request from user 7 in chat 9 for https://vm.tiktok.com/x/"
        );
    }

    #[tokio::test]
    async fn test_denied_user_gets_refusal() {
        let root = tempfile::tempdir().unwrap();
        let tool = Arc::new(ScriptedExtractionTool::new().no_watermark_size(MB));
        let transport = Arc::new(RecordingTransport::new());
        let pipeline = DeliveryPipeline::new(
            AccessGuard::new([UserId(1)].into_iter().collect()),
            Arc::new(RateLimiter::new(5)),
            tool.clone(),
            Arc::new(ScriptedTranscoder::with_output_size(MB)),
            transport.clone(),
            PipelineSettings::builder().max_size_bytes(45 * MB).temp_dir(root.path()).build(),
        );

        let req = DeliveryRequest::new(UserId(2), ChatId(2), "https://vm.tiktok.com/ZMabc/", MediaFormat::Video);
        assert_eq!(pipeline.handle(&req).await, DeliveryOutcome::Denied);
        assert!(tool.calls().is_empty());
        assert_eq!(transport.texts(), vec![messages::ACCESS_DENIED.to_string()]);
    }

    #[tokio::test]
    async fn test_caption_is_truncated() {
        let root = tempfile::tempdir().unwrap();
        let tool = Arc::new(
            ScriptedExtractionTool::new()
                .no_watermark_size(MB)
                .title(Some("x".repeat(2000))),
        );
        let transport = Arc::new(RecordingTransport::new());
        let pipeline = DeliveryPipeline::new(
            AccessGuard::open(),
            Arc::new(RateLimiter::new(5)),
            tool,
            Arc::new(ScriptedTranscoder::with_output_size(MB)),
            transport.clone(),
            PipelineSettings::builder().max_size_bytes(45 * MB).temp_dir(root.path()).build(),
        );

        let req = DeliveryRequest::new(UserId(1), ChatId(1), "https://vm.tiktok.com/ZMabc/", MediaFormat::Video);
        assert!(pipeline.handle(&req).await.is_delivered());
        let sent = transport.media();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].caption.chars().count(), config::telegram::CAPTION_MAX_CHARS);
    }
}
