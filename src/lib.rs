//! ttdl - Telegram bot that delivers TikTok videos and audio
//!
//! A user sends a TikTok link and picks Video or Audio. The bot downloads the
//! media with yt-dlp (no-watermark stream first, standard stream once as a
//! fallback), re-encodes it once with ffmpeg when it is over the size limit,
//! and sends the file back, or a direct link when it cannot be made small
//! enough.
//!
//! # Module Structure
//!
//! - `core`: configuration, errors, logging, access guard, rate limiter
//! - `download`: extractor, compressor and the delivery pipeline
//! - `conversion`: ffmpeg re-encoding
//! - `telegram`: dispatcher schema, handlers and the Telegram transport
//! - `testing`: scripted tools and a recording transport for tests

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

pub mod cli;
pub mod conversion;
pub mod core;
pub mod download;
pub mod telegram;
pub mod testing;

// Re-export commonly used types for convenience
pub use core::{config, AppError, BotConfig};
pub use download::{DeliveryOutcome, DeliveryPipeline, DeliveryRequest, MediaFormat};
