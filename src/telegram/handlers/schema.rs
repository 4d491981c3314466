//! Dispatcher schema and handler chain builders

use teloxide::dispatching::{UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;
use teloxide::types::Message;

use super::commands::{handle_command, handle_format_choice, handle_text};
use super::types::{HandlerDeps, HandlerError};
use crate::telegram::bot::Command;

/// Creates the main dispatcher schema for the Telegram bot.
///
/// Endpoints unpack the update and hand plain ids to the handlers in
/// [`super::commands`]; handler errors are logged, never propagated.
pub fn schema(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    dptree::entry()
        .branch(command_handler(deps.clone()))
        .branch(message_handler(deps.clone()))
        .branch(callback_handler(deps))
}

fn command_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message().branch(dptree::entry().filter_command::<Command>().endpoint(
        move |msg: Message, cmd: Command| {
            let deps = deps.clone();
            async move {
                log::info!("🎯 Received command: {:?} from chat {}", cmd, msg.chat.id);

                let Some(user) = msg.from.as_ref() else {
                    return Ok(());
                };
                if let Err(e) = handle_command(&deps, user.id, msg.chat.id, cmd.clone()).await {
                    log::error!("❌ {:?} handler failed for chat {}: {}", cmd, msg.chat.id, e);
                }
                Ok(())
            }
        },
    ))
}

fn message_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .filter(|msg: Message| msg.text().is_some())
        .endpoint(move |msg: Message| {
            let deps = deps.clone();
            async move {
                let (Some(user), Some(text)) = (msg.from.as_ref(), msg.text()) else {
                    return Ok(());
                };
                if let Err(e) = handle_text(&deps, user.id, msg.chat.id, msg.chat.is_private(), text).await {
                    log::error!("❌ Message handler failed for chat {}: {}", msg.chat.id, e);
                }
                Ok(())
            }
        })
}

fn callback_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_callback_query().endpoint(move |bot: Bot, q: CallbackQuery| {
        let deps = deps.clone();
        async move {
            if let Err(e) = bot.answer_callback_query(q.id.clone()).await {
                log::warn!("Failed to answer callback query from user {}: {}", q.from.id, e);
            }

            let (Some(data), Some(keyboard)) = (q.data.as_deref(), q.message.as_ref()) else {
                return Ok(());
            };
            let chat_id = keyboard.chat().id;
            if let Err(e) = handle_format_choice(&deps, q.from.id, chat_id, keyboard.id(), data).await {
                log::error!("❌ Callback handler failed for user {}: {}", q.from.id, e);
            }
            Ok(())
        }
    })
}
