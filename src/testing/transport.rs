//! In-memory [`Transport`] that records everything sent through it

use async_trait::async_trait;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicUsize, Ordering};
use std::sync::Mutex;
use teloxide::types::{ChatId, MessageId};

use crate::download::artifact::MediaFormat;
use crate::download::error::DeliveryError;
use crate::download::send::Transport;

/// A file handed to the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMedia {
    pub chat_id: ChatId,
    pub format: MediaFormat,
    pub file_name: String,
    pub caption: String,
    /// Size on disk at send time, None when the file was missing
    pub size_bytes: Option<u64>,
}

/// A message sent with the Video/Audio keyboard under it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentChoice {
    pub chat_id: ChatId,
    pub message_id: MessageId,
    pub text: String,
}

#[derive(Default)]
pub struct RecordingTransport {
    texts: Mutex<Vec<(ChatId, String)>>,
    choices: Mutex<Vec<SentChoice>>,
    last_message_id: AtomicI32,
    media: Mutex<Vec<SentMedia>>,
    upload_notices: AtomicUsize,
    fail_media: AtomicBool,
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every media send fail, as if Telegram rejected the upload
    pub fn failing_media() -> Self {
        let transport = Self::default();
        transport.fail_media.store(true, Ordering::SeqCst);
        transport
    }

    pub fn texts(&self) -> Vec<String> {
        lock(&self.texts).iter().map(|(_, text)| text.clone()).collect()
    }

    pub fn texts_for(&self, chat_id: ChatId) -> Vec<String> {
        lock(&self.texts)
            .iter()
            .filter(|(chat, _)| *chat == chat_id)
            .map(|(_, text)| text.clone())
            .collect()
    }

    pub fn choices(&self) -> Vec<SentChoice> {
        lock(&self.choices).clone()
    }

    pub fn media(&self) -> Vec<SentMedia> {
        lock(&self.media).clone()
    }

    pub fn upload_notices(&self) -> usize {
        self.upload_notices.load(Ordering::SeqCst)
    }

    fn record_media(&self, chat_id: ChatId, format: MediaFormat, path: &Path, caption: &str) -> Result<(), DeliveryError> {
        let size_bytes = std::fs::metadata(path).ok().map(|m| m.len());
        lock(&self.media).push(SentMedia {
            chat_id,
            format,
            file_name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            caption: caption.to_string(),
            size_bytes,
        });

        if self.fail_media.load(Ordering::SeqCst) {
            return Err(DeliveryError::Transport("upload rejected".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<(), DeliveryError> {
        lock(&self.texts).push((chat_id, text.to_string()));
        Ok(())
    }

    /// Message ids start at 1 and grow with every keyboard sent
    async fn send_format_choice(&self, chat_id: ChatId, text: &str) -> Result<MessageId, DeliveryError> {
        let message_id = MessageId(self.last_message_id.fetch_add(1, Ordering::SeqCst) + 1);
        lock(&self.choices).push(SentChoice {
            chat_id,
            message_id,
            text: text.to_string(),
        });
        Ok(message_id)
    }

    async fn send_video(&self, chat_id: ChatId, path: &Path, caption: &str) -> Result<(), DeliveryError> {
        self.record_media(chat_id, MediaFormat::Video, path, caption)
    }

    async fn send_audio(&self, chat_id: ChatId, path: &Path, caption: &str) -> Result<(), DeliveryError> {
        self.record_media(chat_id, MediaFormat::Audio, path, caption)
    }

    async fn notify_upload(&self, _chat_id: ChatId, _format: MediaFormat) -> Result<(), DeliveryError> {
        self.upload_notices.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
