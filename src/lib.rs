//! Innsikt - AI Insight Assistant
//!
//! A CLI tool that puts a tool-calling AI agent in front of financial
//! questions, YouTube videos, local video files and ingredient labels.
//!
//! The name "Innsikt" is Norwegian for "insight."
//!
//! # Overview
//!
//! Innsikt allows you to:
//! - Ask about stock prices, fundamentals, analyst ratings and company news
//! - Ask questions about a YouTube video using its captions
//! - Ask questions about a local video file
//! - Get a health-oriented breakdown of a product's ingredient label
//!
//! # Architecture
//!
//! - `config` - Settings, agent profiles and prompt framings
//! - `youtube` - Link parsing and caption retrieval
//! - `media` - Local image and video attachments
//! - `tools` - Functions the agent may call (finance data, web search)
//! - `agent` - The chat completion loop with tool calling
//! - `orchestrator` - Prompt composition and one agent call per request
//!
//! # Example
//!
//! ```rust,no_run
//! use innsikt::config::Settings;
//! use innsikt::orchestrator::Analyzer;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let analyzer = Analyzer::from_settings(&settings, &settings.agents.youtube)?;
//!
//!     let result = analyzer
//!         .analyze_youtube("https://youtu.be/dQw4w9WgXcQ", "What is this video about?")
//!         .await?;
//!     println!("{}", result.text);
//!
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod cli;
pub mod config;
pub mod error;
pub mod media;
pub mod openai;
pub mod orchestrator;
pub mod tools;
pub mod youtube;

pub use error::{InnsiktError, Result};
