//! Handler implementations: commands, links and the Video/Audio buttons
//!
//! Handlers take plain ids instead of teloxide updates and reply through
//! [`HandlerDeps::transport`], so the dispatcher schema only unpacks updates.

use teloxide::types::{ChatId, InlineKeyboardButton, InlineKeyboardMarkup, MessageId, UserId};

use super::types::HandlerDeps;
use crate::core::messages;
use crate::core::validation::extract_tiktok_url;
use crate::download::artifact::MediaFormat;
use crate::download::error::DeliveryError;
use crate::download::pipeline::{DeliveryOutcome, DeliveryRequest};
use crate::telegram::bot::Command;

/// Callback data of the "Video" button
pub const CALLBACK_VIDEO: &str = "dl";
/// Callback data of the "Audio" button
pub const CALLBACK_AUDIO: &str = "au";

/// Maps button callback data to the requested format
pub fn parse_callback_format(data: &str) -> Option<MediaFormat> {
    match data {
        CALLBACK_VIDEO => Some(MediaFormat::Video),
        CALLBACK_AUDIO => Some(MediaFormat::Audio),
        _ => None,
    }
}

/// The [Video] [Audio] keyboard shown under a recognized link
pub fn format_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![
        InlineKeyboardButton::callback(messages::BUTTON_VIDEO, CALLBACK_VIDEO),
        InlineKeyboardButton::callback(messages::BUTTON_AUDIO, CALLBACK_AUDIO),
    ]])
}

/// Handle /start, /help and /audio
pub async fn handle_command(
    deps: &HandlerDeps,
    user_id: UserId,
    chat_id: ChatId,
    cmd: Command,
) -> Result<(), DeliveryError> {
    if !deps.is_authorized(user_id) {
        log::info!("Refusing {:?} from user {}", cmd, user_id);
        return deps.transport.send_text(chat_id, messages::ACCESS_DENIED).await;
    }

    match cmd {
        Command::Start => deps.transport.send_text(chat_id, messages::START_TEXT).await,
        Command::Help => deps.transport.send_text(chat_id, messages::HELP_TEXT).await,
        Command::Audio => match deps.links.last(user_id) {
            Some(url) => {
                let request = DeliveryRequest::new(user_id, chat_id, url, MediaFormat::Audio);
                deps.pipeline.handle(&request).await;
                Ok(())
            }
            None => deps.transport.send_text(chat_id, messages::NO_LAST_LINK).await,
        },
    }
}

/// Handle a plain text message: look for a link and offer the keyboard
pub async fn handle_text(
    deps: &HandlerDeps,
    user_id: UserId,
    chat_id: ChatId,
    private_chat: bool,
    text: &str,
) -> Result<(), DeliveryError> {
    let link = extract_tiktok_url(text);
    // groups only hear from us when a link is posted
    if link.is_none() && !private_chat {
        return Ok(());
    }

    if !deps.is_authorized(user_id) {
        log::info!("Refusing user {} in chat {}", user_id, chat_id);
        return deps.transport.send_text(chat_id, messages::ACCESS_DENIED).await;
    }

    let Some(url) = link else {
        return deps.transport.send_text(chat_id, messages::INVALID_LINK).await;
    };

    log::info!("User {} sent link {}", user_id, url);
    deps.links.remember_last(user_id, url);
    let keyboard_id = deps
        .transport
        .send_format_choice(chat_id, messages::CHOOSE_FORMAT)
        .await?;
    deps.links.attach(chat_id, keyboard_id, url);
    Ok(())
}

/// Handle a Video/Audio press on the keyboard sent as `keyboard_id`.
///
/// Returns the pipeline outcome, or None when nothing was downloaded.
pub async fn handle_format_choice(
    deps: &HandlerDeps,
    user_id: UserId,
    chat_id: ChatId,
    keyboard_id: MessageId,
    data: &str,
) -> Result<Option<DeliveryOutcome>, DeliveryError> {
    let Some(format) = parse_callback_format(data) else {
        log::debug!("Ignoring unknown callback data {:?}", data);
        return Ok(None);
    };

    let Some(url) = deps.links.for_keyboard(chat_id, keyboard_id) else {
        deps.transport.send_text(chat_id, messages::LINK_EXPIRED).await?;
        return Ok(None);
    };

    let request = DeliveryRequest::new(user_id, chat_id, url, format);
    let outcome = deps.pipeline.handle(&request).await;
    if outcome == DeliveryOutcome::Denied {
        log::info!("Button press from unauthorized user {}", user_id);
    }
    Ok(Some(outcome))
}

#[cfg(test)]
mod tests {
    use super::*;
    use teloxide::types::InlineKeyboardButtonKind;

    #[test]
    fn test_parse_callback_format() {
        assert_eq!(parse_callback_format("dl"), Some(MediaFormat::Video));
        assert_eq!(parse_callback_format("au"), Some(MediaFormat::Audio));
        assert_eq!(parse_callback_format("history:repeat"), None);
    }

    #[test]
    fn test_keyboard_layout() {
        let keyboard = format_keyboard();
        assert_eq!(keyboard.inline_keyboard.len(), 1);
        let row = &keyboard.inline_keyboard[0];
        assert_eq!(row.len(), 2);
        assert_eq!(row[0].text, messages::BUTTON_VIDEO);
        assert_eq!(row[1].text, messages::BUTTON_AUDIO);
        match &row[1].kind {
            InlineKeyboardButtonKind::CallbackData(data) => {
                assert_eq!(data, CALLBACK_AUDIO);
                assert!(data.len() <= 64);
            }
            other => panic!("unexpected button kind: {:?}", other),
        }
    }
}
