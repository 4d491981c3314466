use anyhow::{anyhow, Result};
use dotenvy::dotenv;
use secrecy::ExposeSecret;
use std::path::PathBuf;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::update_listeners::{webhooks, Polling};

use ttdl::cli::{Cli, Commands};
use ttdl::conversion::FfmpegTranscoder;
use ttdl::core::utils::{escape_filename, format_mb};
use ttdl::core::{config, init_logger, log_startup_configuration, AccessGuard, BotConfig, RateLimiter, ToolReport};
use ttdl::download::{
    Compressor, DeliveryPipeline, Extractor, MediaFormat, PipelineSettings, RequestWorkspace, Transport, YtDlpTool,
};
use ttdl::telegram::{create_bot, schema, setup_bot_commands, HandlerDeps, TelegramTransport};

/// Main entry point for the Telegram bot
///
/// Parses CLI arguments and dispatches to appropriate subcommand.
///
/// # Errors
/// Returns an error if initialization fails (configuration, logging, bot creation).
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    // Log panics from handler tasks instead of losing them on stderr
    std::panic::set_hook(Box::new(|panic_info| {
        log::error!("Panic caught: {:?}", panic_info);
        if let Some(location) = panic_info.location() {
            log::error!("Panic at {}:{}:{}", location.file(), location.line(), location.column());
        }
        if let Some(msg) = panic_info.payload().downcast_ref::<&str>() {
            log::error!("Panic message: {}", msg);
        }
    }));

    // Load environment variables from .env if present
    let _ = dotenv();

    match cli.command {
        Some(Commands::Run { webhook }) => {
            let config = BotConfig::from_env()?;
            init_logger(&config.log_file_path)?;
            run_bot(config, webhook).await
        }
        Some(Commands::Fetch { url, audio, output }) => {
            // fetch never talks to Telegram, so no token is needed
            let config = BotConfig::from_lookup(|key| match key {
                "BOT_TOKEN" => Some("unused".to_string()),
                _ => std::env::var(key).ok(),
            })?;
            init_logger(&config.log_file_path)?;
            let format = if audio { MediaFormat::Audio } else { MediaFormat::Video };
            run_fetch(config, url, format, output).await
        }
        None => {
            let config = BotConfig::from_env()?;
            init_logger(&config.log_file_path)?;
            run_bot(config, false).await
        }
    }
}

/// Runs the bot until Ctrl+C
async fn run_bot(config: BotConfig, webhook_flag: bool) -> Result<()> {
    log::info!("Starting ttdl v{}", env!("CARGO_PKG_VERSION"));

    let tools = ToolReport::detect(&config).await;
    log_startup_configuration(&config, &tools);

    fs_err::create_dir_all(&config.temp_dir)?;

    let bot = create_bot(&config)?;
    if let Err(e) = setup_bot_commands(&bot).await {
        log::warn!("Failed to register bot commands: {}", e);
    }

    let transport: Arc<dyn Transport> = Arc::new(TelegramTransport::new(bot.clone()));
    let rate_limiter = Arc::new(RateLimiter::new(config.rate_limit_per_min));
    let _cleanup = Arc::clone(&rate_limiter).spawn_cleanup_task(config::rate_limit::cleanup_interval());

    let pipeline = Arc::new(DeliveryPipeline::new(
        AccessGuard::new(config.admin_ids.clone()),
        rate_limiter,
        Arc::new(YtDlpTool::new(&config.ytdl_bin, &config.ffmpeg_bin)),
        Arc::new(FfmpegTranscoder::new(&config.ffmpeg_bin)),
        transport.clone(),
        PipelineSettings::from_config(&config),
    ));

    let handler = schema(HandlerDeps::new(pipeline, transport));
    let mut dispatcher = Dispatcher::builder(bot.clone(), handler)
        .enable_ctrlc_handler()
        .build();

    if webhook_flag || config.use_webhook {
        let url = config
            .webhook_url
            .clone()
            .ok_or_else(|| anyhow!("webhook mode requires WEBHOOK_URL"))?;
        let addr = config.webhook_addr();

        let mut options = webhooks::Options::new(addr, url.clone()).path(url.path().to_string());
        if let Some(secret) = &config.webhook_secret {
            options = options.secret_token(secret.expose_secret().to_string());
        }

        log::info!("Starting bot in webhook mode at {} (listening on {})", url, addr);
        let listener = webhooks::axum(bot, options).await?;
        dispatcher
            .dispatch_with_listener(
                listener,
                LoggingErrorHandler::with_custom_text("An error from the update listener"),
            )
            .await;
    } else {
        log::info!("Starting bot in long polling mode");
        let listener = Polling::builder(bot).drop_pending_updates().build();
        dispatcher
            .dispatch_with_listener(
                listener,
                LoggingErrorHandler::with_custom_text("An error from the update listener"),
            )
            .await;
    }

    log::info!("Dispatcher shutdown gracefully");
    Ok(())
}

/// Downloads one link into `output`, compressing it when over the limit
async fn run_fetch(config: BotConfig, url: String, format: MediaFormat, output: PathBuf) -> Result<()> {
    fs_err::create_dir_all(&config.temp_dir)?;
    fs_err::create_dir_all(&output)?;

    let workspace = RequestWorkspace::create(&config.temp_dir).await?;
    let extractor = Extractor::new(Arc::new(YtDlpTool::new(&config.ytdl_bin, &config.ffmpeg_bin)));

    let mut artifact = extractor.fetch(&url, format, &workspace).await?;
    log::info!(
        "Fetched {} ({} MB, {} variant)",
        artifact.title,
        format_mb(artifact.size_bytes),
        artifact.variant
    );

    let max_size = config.compress_max_bytes();
    if artifact.exceeds(max_size) {
        let compressor = Compressor::new(Arc::new(FfmpegTranscoder::new(&config.ffmpeg_bin)));
        match compressor
            .compress(&artifact, max_size, config.crf, config.max_height, &workspace)
            .await
        {
            Ok(smaller) => artifact = smaller,
            Err(e) => {
                let link = artifact.direct_url.clone().unwrap_or(url);
                return Err(anyhow!("compression failed ({}); download it directly: {}", e, link));
            }
        }
    }

    let dest = output.join(format!("{}.{}", escape_filename(&artifact.title), format.extension()));
    fs_err::tokio::copy(&artifact.path, &dest).await?;
    println!("{}", dest.display());
    Ok(())
}
