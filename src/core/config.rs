//! Runtime configuration
//!
//! Everything the operator can tune is read once at startup into
//! [`BotConfig`] and handed to the components that need it. Fixed operational
//! constants (timeouts, bitrates, caption length) live in the submodules below.

use secrecy::SecretString;
use std::collections::HashSet;
use std::fmt::Display;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use teloxide::types::UserId;
use thiserror::Error;
use url::Url;

/// Errors raised while reading configuration. All of them abort startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("BOT_TOKEN is not set. Put it in .env or environment variables.")]
    MissingBotToken,

    #[error("USE_WEBHOOK=true but WEBHOOK_URL is empty")]
    MissingWebhookUrl,

    #[error("invalid value for {key}: {value:?} ({reason})")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Bot configuration assembled from environment variables
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Telegram bot token (BOT_TOKEN, falls back to TELOXIDE_TOKEN)
    pub bot_token: SecretString,
    /// Authorized user ids (ADMIN_IDS). Empty means everyone may use the bot.
    pub admin_ids: HashSet<UserId>,
    /// Download requests allowed per user per minute (RATE_LIMIT_PER_MIN)
    pub rate_limit_per_min: u32,
    /// Size threshold above which media is compressed, in MiB (COMPRESS_MAX_MB)
    pub compress_max_mb: u64,
    /// x264 constant rate factor used when compressing (CRF)
    pub crf: u8,
    /// Vertical resolution cap applied when compressing (MAX_HEIGHT)
    pub max_height: u32,
    /// Receive updates through a webhook instead of long polling (USE_WEBHOOK)
    pub use_webhook: bool,
    /// Public URL Telegram posts updates to (WEBHOOK_URL)
    pub webhook_url: Option<Url>,
    /// Port the webhook server binds (PORT)
    pub port: u16,
    /// Address the webhook server binds (LISTEN_ADDR)
    pub listen_addr: IpAddr,
    /// Secret token Telegram echoes in webhook requests (WEBHOOK_SECRET)
    pub webhook_secret: Option<SecretString>,
    /// yt-dlp executable (YTDL_BIN)
    pub ytdl_bin: String,
    /// ffmpeg executable (FFMPEG_BIN)
    pub ffmpeg_bin: String,
    /// Root under which per-request workspaces are created (TEMP_FILES_DIR)
    pub temp_dir: PathBuf,
    /// Log file path (LOG_FILE_PATH)
    pub log_file_path: String,
    /// Custom Bot API server (BOT_API_URL)
    pub bot_api_url: Option<Url>,
}

impl BotConfig {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through an arbitrary key lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bot_token = get("BOT_TOKEN")
            .or_else(|| get("TELOXIDE_TOKEN"))
            .ok_or(ConfigError::MissingBotToken)?;

        let admin_ids = match get("ADMIN_IDS") {
            Some(raw) => parse_admin_ids(&raw)?,
            None => HashSet::new(),
        };

        let use_webhook = match get("USE_WEBHOOK") {
            Some(raw) => parse_bool("USE_WEBHOOK", &raw)?,
            None => false,
        };

        let webhook_url = get("WEBHOOK_URL")
            .map(|raw| parse_url("WEBHOOK_URL", &raw))
            .transpose()?;
        if use_webhook && webhook_url.is_none() {
            return Err(ConfigError::MissingWebhookUrl);
        }

        let listen_addr = parse_or(&get, "LISTEN_ADDR", IpAddr::V4(Ipv4Addr::UNSPECIFIED))?;

        let temp_dir = get("TEMP_FILES_DIR")
            .map(|raw| PathBuf::from(shellexpand::tilde(&raw).into_owned()))
            .unwrap_or_else(std::env::temp_dir);

        Ok(Self {
            bot_token: SecretString::from(bot_token),
            admin_ids,
            rate_limit_per_min: parse_or(&get, "RATE_LIMIT_PER_MIN", 5)?,
            compress_max_mb: parse_compress_max_mb(&get)?,
            crf: parse_crf(&get)?,
            max_height: parse_or(&get, "MAX_HEIGHT", 720)?,
            use_webhook,
            webhook_url,
            port: parse_or(&get, "PORT", 8080)?,
            listen_addr,
            webhook_secret: get("WEBHOOK_SECRET")
                .map(|raw| parse_webhook_secret(&raw))
                .transpose()?,
            ytdl_bin: get("YTDL_BIN").unwrap_or_else(|| "yt-dlp".to_string()),
            ffmpeg_bin: get("FFMPEG_BIN").unwrap_or_else(|| "ffmpeg".to_string()),
            temp_dir,
            log_file_path: get("LOG_FILE_PATH").unwrap_or_else(|| "app.log".to_string()),
            bot_api_url: get("BOT_API_URL")
                .map(|raw| parse_url("BOT_API_URL", &raw))
                .transpose()?,
        })
    }

    /// Size threshold in bytes
    pub fn compress_max_bytes(&self) -> u64 {
        self.compress_max_mb.saturating_mul(BYTES_PER_MB)
    }

    /// Socket address for the webhook server
    pub fn webhook_addr(&self) -> SocketAddr {
        SocketAddr::new(self.listen_addr, self.port)
    }
}

fn parse_admin_ids(raw: &str) -> Result<HashSet<UserId>, ConfigError> {
    raw.split([',', ' ', '\n', '\t'])
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<u64>().map(UserId).map_err(|e| ConfigError::InvalidValue {
                key: "ADMIN_IDS",
                value: part.to_string(),
                reason: e.to_string(),
            })
        })
        .collect()
}

fn parse_bool(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: raw.to_string(),
            reason: "expected true or false".to_string(),
        }),
    }
}

fn parse_url(key: &'static str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw).map_err(|e| ConfigError::InvalidValue {
        key,
        value: raw.to_string(),
        reason: e.to_string(),
    })
}

fn parse_or<T, G>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw.parse::<T>().map_err(|e| ConfigError::InvalidValue {
            key,
            value: raw.clone(),
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

/// Telegram accepts 1-256 characters of `A-Za-z0-9_-` as a secret token
fn parse_webhook_secret(raw: &str) -> Result<SecretString, ConfigError> {
    let valid = raw.len() <= 256 && raw.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if !valid {
        return Err(ConfigError::InvalidValue {
            key: "WEBHOOK_SECRET",
            value: "<hidden>".to_string(),
            reason: "only A-Z, a-z, 0-9, _ and - are allowed, up to 256 characters".to_string(),
        });
    }
    Ok(SecretString::from(raw.to_string()))
}

const BYTES_PER_MB: u64 = 1024 * 1024;

/// The limit has to be expressible in bytes
fn parse_compress_max_mb<G>(get: &G) -> Result<u64, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    let mb: u64 = parse_or(get, "COMPRESS_MAX_MB", 45)?;
    if mb.checked_mul(BYTES_PER_MB).is_none() {
        return Err(ConfigError::InvalidValue {
            key: "COMPRESS_MAX_MB",
            value: mb.to_string(),
            reason: format!("must be at most {} MB", u64::MAX / BYTES_PER_MB),
        });
    }
    Ok(mb)
}

/// x264 accepts CRF 0..=51
fn parse_crf<G>(get: &G) -> Result<u8, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    let crf: u8 = parse_or(get, "CRF", 28)?;
    if crf > 51 {
        return Err(ConfigError::InvalidValue {
            key: "CRF",
            value: crf.to_string(),
            reason: "must be between 0 and 51".to_string(),
        });
    }
    Ok(crf)
}

/// Rate limiting configuration
pub mod rate_limit {
    use std::time::Duration;

    /// Length of one rate-limit window (the "per minute" of RATE_LIMIT_PER_MIN)
    pub const WINDOW_SECS: u64 = 60;

    /// How often expired windows are purged
    pub const CLEANUP_INTERVAL_SECS: u64 = 300;

    pub fn window() -> Duration {
        Duration::from_secs(WINDOW_SECS)
    }

    pub fn cleanup_interval() -> Duration {
        Duration::from_secs(CLEANUP_INTERVAL_SECS)
    }
}

/// Download configuration
pub mod download {
    use std::time::Duration;

    /// Timeout for one yt-dlp invocation (in seconds)
    pub const YTDLP_TIMEOUT_SECS: u64 = 240;

    /// Network socket timeout passed to yt-dlp
    pub const SOCKET_TIMEOUT_SECS: u64 = 30;

    /// Audio quality requested when extracting MP3
    pub const AUDIO_QUALITY: &str = "192K";

    pub fn ytdlp_timeout() -> Duration {
        Duration::from_secs(YTDLP_TIMEOUT_SECS)
    }
}

/// Compression configuration
pub mod compression {
    use std::time::Duration;

    /// Timeout for one ffmpeg pass (in seconds)
    pub const FFMPEG_TIMEOUT_SECS: u64 = 300;

    /// x264 preset; speed matters more than the last few percent of size here
    pub const PRESET: &str = "veryfast";

    /// Audio track bitrate inside compressed videos
    pub const VIDEO_AUDIO_BITRATE: &str = "128k";

    /// Bitrate used when an audio-only artifact has to shrink
    pub const AUDIO_BITRATE: &str = "96k";

    pub fn ffmpeg_timeout() -> Duration {
        Duration::from_secs(FFMPEG_TIMEOUT_SECS)
    }
}

/// Network configuration
pub mod network {
    use std::time::Duration;

    /// Request timeout for Bot API calls (uploads of ~50 MB included)
    pub const REQUEST_TIMEOUT_SECS: u64 = 900;

    pub fn timeout() -> Duration {
        Duration::from_secs(REQUEST_TIMEOUT_SECS)
    }
}

/// Telegram message limits
pub mod telegram {
    use std::time::Duration;

    /// Captions are cut at this many characters (Telegram allows 1024)
    pub const CAPTION_MAX_CHARS: usize = 990;

    /// Keyboard links older than this are pruned once the store is full
    pub const KEYBOARD_LINK_TTL_SECS: u64 = 24 * 60 * 60;

    /// Keyboard links kept before pruning kicks in
    pub const KEYBOARD_LINK_PRUNE_AT: usize = 10_000;

    pub fn keyboard_link_ttl() -> Duration {
        Duration::from_secs(KEYBOARD_LINK_TTL_SECS)
    }
}
