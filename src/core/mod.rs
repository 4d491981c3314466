//! Core utilities, configuration, and common functionality

pub mod access;
pub mod config;
pub mod error;
pub mod logging;
pub mod messages;
pub mod process;
pub mod rate_limiter;
pub mod utils;
pub mod validation;

// Re-exports for convenience
pub use access::AccessGuard;
pub use config::{BotConfig, ConfigError};
pub use error::AppError;
pub use logging::{init_logger, log_startup_configuration, ToolReport};
pub use rate_limiter::RateLimiter;
