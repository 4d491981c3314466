//! [`Transport`] on top of `teloxide::Bot`

use async_trait::async_trait;
use std::path::Path;
use teloxide::payloads::{SendAudio, SendVideo};
use teloxide::prelude::*;
use teloxide::requests::MultipartRequest;
use teloxide::types::{ChatAction, InputFile, MessageId};

use super::handlers::format_keyboard;
use crate::download::artifact::MediaFormat;
use crate::download::error::DeliveryError;
use crate::download::send::Transport;

#[derive(Clone)]
pub struct TelegramTransport {
    bot: Bot,
}

impl TelegramTransport {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

fn video_request(bot: &Bot, chat_id: ChatId, path: &Path, caption: &str) -> MultipartRequest<SendVideo> {
    bot.send_video(chat_id, InputFile::file(path))
        .caption(caption)
        .supports_streaming(true)
}

// caption only; a title would show the same text twice in clients
fn audio_request(bot: &Bot, chat_id: ChatId, path: &Path, caption: &str) -> MultipartRequest<SendAudio> {
    bot.send_audio(chat_id, InputFile::file(path)).caption(caption)
}

#[async_trait]
impl Transport for TelegramTransport {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<(), DeliveryError> {
        self.bot.send_message(chat_id, text).await?;
        Ok(())
    }

    async fn send_format_choice(&self, chat_id: ChatId, text: &str) -> Result<MessageId, DeliveryError> {
        let message = self
            .bot
            .send_message(chat_id, text)
            .reply_markup(format_keyboard())
            .await?;
        Ok(message.id)
    }

    async fn send_video(&self, chat_id: ChatId, path: &Path, caption: &str) -> Result<(), DeliveryError> {
        log::info!("Uploading video {} to chat {}", path.display(), chat_id);
        video_request(&self.bot, chat_id, path, caption).await?;
        Ok(())
    }

    async fn send_audio(&self, chat_id: ChatId, path: &Path, caption: &str) -> Result<(), DeliveryError> {
        log::info!("Uploading audio {} to chat {}", path.display(), chat_id);
        audio_request(&self.bot, chat_id, path, caption).await?;
        Ok(())
    }

    async fn notify_upload(&self, chat_id: ChatId, format: MediaFormat) -> Result<(), DeliveryError> {
        let action = match format {
            MediaFormat::Video => ChatAction::UploadVideo,
            MediaFormat::Audio => ChatAction::UploadVoice,
        };
        self.bot.send_chat_action(chat_id, action).await?;
        Ok(())
    }
}
