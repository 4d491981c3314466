use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ttdl")]
#[command(author, version, about = "Telegram bot that delivers TikTok videos and audio", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Run the bot (default when no subcommand is given)
    Run {
        /// Use webhook mode instead of long polling
        #[arg(long)]
        webhook: bool,
    },

    /// Download one link locally without Telegram, applying the size limit
    Fetch {
        /// TikTok link
        url: String,

        /// Extract audio (MP3) instead of video
        #[arg(long)]
        audio: bool,

        /// Directory the result is copied into
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
