//! CLI module for Innsikt.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Innsikt - ask a tool-calling AI agent about stocks, videos and food labels
///
/// The name "Innsikt" is Norwegian for "insight."
#[derive(Parser, Debug)]
#[command(name = "innsikt")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ask about stock prices, company fundamentals, or financial news
    Finance {
        /// The question to ask
        question: String,
    },

    /// Ask about a YouTube video using its transcript
    Youtube {
        /// YouTube link (youtu.be/... or youtube.com/watch?v=...)
        url: String,

        /// What insights are you seeking from the video?
        query: String,
    },

    /// Ask about a local video file (mp4, mov, avi)
    Video {
        /// Path to the video file
        file: String,

        /// What insights are you seeking from the video?
        query: String,
    },

    /// Analyze a photo of a product's ingredient label (jpg, png, webp)
    Ingredients {
        /// Path to the image
        image: String,

        /// Specific question about the product (optional)
        #[arg(short, long)]
        query: Option<String>,
    },

    /// Show the video ID and thumbnail for a YouTube link
    VideoId {
        /// YouTube link
        url: String,
    },

    /// Check API keys and external tools
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Write the default configuration file if none exists
    Init,

    /// Show configuration file path
    Path,
}
