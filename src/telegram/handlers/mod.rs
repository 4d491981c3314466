//! Telegram bot handler tree configuration
//!
//! This module provides the main dispatcher schema for the Telegram bot.
//! The handlers take plain ids and reply through the pipeline's transport,
//! so integration tests drive them with a recording transport.

mod commands;
mod schema;
mod types;

pub use commands::{
    format_keyboard, handle_command, handle_format_choice, handle_text, parse_callback_format, CALLBACK_AUDIO,
    CALLBACK_VIDEO,
};
pub use schema::schema;
pub use types::{HandlerDeps, HandlerError, LinkStore};
