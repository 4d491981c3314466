//! Telegram bot integration and handlers

pub mod bot;
pub mod handlers;
pub mod transport;

// Re-exports for convenience
pub use bot::{create_bot, setup_bot_commands, Command};
pub use handlers::{
    handle_command, handle_format_choice, handle_text, schema, HandlerDeps, HandlerError, LinkStore,
};
pub use transport::TelegramTransport;
