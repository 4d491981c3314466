//! Logging initialization and startup diagnostics
//!
//! This module provides:
//! - Logger initialization (console + file)
//! - A startup report of the external tools and the effective limits

use anyhow::Result;
use simplelog::*;
use std::fs::File;

use crate::core::config::BotConfig;
use crate::core::process::tool_version;

/// Initialize logger for both console and file output
///
/// # Arguments
/// * `log_file_path` - Path to the log file
///
/// # Returns
/// * `Ok(())` - Logger initialized successfully
/// * `Err(anyhow::Error)` - Failed to create the file or a logger was already set
pub fn init_logger(log_file_path: &str) -> Result<()> {
    let log_file = File::create(log_file_path).map_err(|e| anyhow::anyhow!("Failed to create log file: {}", e))?;

    CombinedLogger::init(vec![
        TermLogger::new(
            LevelFilter::Info,
            Config::default(),
            TerminalMode::Mixed,
            ColorChoice::Auto,
        ),
        WriteLogger::new(LevelFilter::Info, Config::default(), log_file),
    ])
    .map_err(|e| anyhow::anyhow!("Failed to initialize logger: {}", e))?;

    Ok(())
}

/// Availability of the external tools the pipeline shells out to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolReport {
    pub ytdlp_version: Option<String>,
    pub ffmpeg_version: Option<String>,
}

impl ToolReport {
    pub async fn detect(config: &BotConfig) -> Self {
        Self {
            ytdlp_version: tool_version(&config.ytdl_bin, "--version").await,
            ffmpeg_version: tool_version(&config.ffmpeg_bin, "-version").await,
        }
    }

    pub fn all_available(&self) -> bool {
        self.ytdlp_version.is_some() && self.ffmpeg_version.is_some()
    }
}

/// Logs tool availability and the effective limits at startup.
///
/// Missing tools are reported loudly but do not abort startup: the bot still
/// answers commands and reports extraction failures per request.
pub fn log_startup_configuration(config: &BotConfig, tools: &ToolReport) {
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    log::info!("🔧 Configuration Check");
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    match &tools.ytdlp_version {
        Some(version) => log::info!("✅ yt-dlp ({}): {}", config.ytdl_bin, version),
        None => {
            log::error!("❌ yt-dlp ({}): NOT FOUND", config.ytdl_bin);
            log::error!("   Every download will fail. Install it: pip3 install -U yt-dlp");
        }
    }

    match &tools.ffmpeg_version {
        Some(version) => log::info!("✅ ffmpeg ({}): {}", config.ffmpeg_bin, version),
        None => {
            log::error!("❌ ffmpeg ({}): NOT FOUND", config.ffmpeg_bin);
            log::error!("   Audio extraction, merging and compression will fail.");
        }
    }

    if config.admin_ids.is_empty() {
        log::info!("🔓 Access: open to everyone (ADMIN_IDS empty)");
    } else {
        log::info!("🔒 Access: admin-only ({} user(s))", config.admin_ids.len());
    }

    log::info!("⏱️  Rate limit: {} request(s) per minute per user", config.rate_limit_per_min);
    log::info!(
        "📦 Size limit: {} MB (CRF {}, max height {}p)",
        config.compress_max_mb,
        config.crf,
        config.max_height
    );
    log::info!("📁 Temp dir: {}", config.temp_dir.display());

    if tools.all_available() {
        log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        log::info!("✅ External tools ready");
        log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    } else {
        log::error!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        log::error!("❌ External tools missing - downloads will FAIL!");
        log::error!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    }
}
