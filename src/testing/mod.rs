//! Test doubles for the pipeline's external seams
//!
//! The pipeline depends on three traits: [`ExtractionTool`], [`TranscodeTool`]
//! and [`Transport`]. This module provides scripted implementations that
//! write sparse files of a chosen size and record what they were asked to do,
//! so unit tests and the `tests/` suite can drive every branch without
//! yt-dlp, ffmpeg or Telegram.
//!
//! ```
//! use std::sync::Arc;
//! use ttdl::testing::{RecordingTransport, ScriptedExtractionTool, ScriptedTranscoder, MB};
//!
//! let extractor = Arc::new(ScriptedExtractionTool::new().no_watermark_size(20 * MB));
//! let transcoder = Arc::new(ScriptedTranscoder::with_output_size(40 * MB));
//! let transport = Arc::new(RecordingTransport::new());
//! # let _ = (extractor, transcoder, transport);
//! ```
//!
//! [`ExtractionTool`]: crate::download::ExtractionTool
//! [`TranscodeTool`]: crate::conversion::TranscodeTool
//! [`Transport`]: crate::download::Transport

pub mod tools;
pub mod transport;

pub use tools::{ScriptedExtractionTool, ScriptedTranscoder};
pub use transport::{RecordingTransport, SentChoice, SentMedia};

/// One mebibyte, the unit `COMPRESS_MAX_MB` is expressed in
pub const MB: u64 = 1024 * 1024;
