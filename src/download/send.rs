//! Outbound side of the pipeline
//!
//! The pipeline never touches `teloxide::Bot` directly; it talks to a
//! [`Transport`]. Production uses `crate::telegram::TelegramTransport`,
//! tests use `crate::testing::RecordingTransport`.

use async_trait::async_trait;
use std::path::Path;
use teloxide::types::{ChatId, MessageId};

use crate::download::artifact::MediaFormat;
use crate::download::error::DeliveryError;

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<(), DeliveryError>;

    /// Sends `text` with the Video/Audio choice under it and returns the id
    /// of that message.
    async fn send_format_choice(&self, chat_id: ChatId, text: &str) -> Result<MessageId, DeliveryError>;

    async fn send_video(&self, chat_id: ChatId, path: &Path, caption: &str) -> Result<(), DeliveryError>;

    async fn send_audio(&self, chat_id: ChatId, path: &Path, caption: &str) -> Result<(), DeliveryError>;

    /// Best-effort "uploading..." indicator. Errors are ignored by callers.
    async fn notify_upload(&self, _chat_id: ChatId, _format: MediaFormat) -> Result<(), DeliveryError> {
        Ok(())
    }
}

/// Sends `path` with the method matching `format`
pub async fn send_media(
    transport: &dyn Transport,
    chat_id: ChatId,
    format: MediaFormat,
    path: &Path,
    caption: &str,
) -> Result<(), DeliveryError> {
    match format {
        MediaFormat::Video => transport.send_video(chat_id, path, caption).await,
        MediaFormat::Audio => transport.send_audio(chat_id, path, caption).await,
    }
}
