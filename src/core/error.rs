use thiserror::Error;

use crate::core::config::ConfigError;

/// Error type for process execution and startup
///
/// Child-process runs and configuration loading report through this enum.
/// Pipeline failures live in [`crate::download::error`]; they are answered
/// in chat and never bubble up.
///
/// # Example
///
/// ```no_run
/// use ttdl::core::error::AppError;
///
/// fn handle_error(err: AppError) {
///     eprintln!("Error: {}", err);
/// }
/// ```
#[derive(Error, Debug)]
pub enum AppError {
    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or missing configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// External process exceeded its time budget
    #[error("{program} timed out after {secs}s")]
    Timeout { program: String, secs: u64 },
}
