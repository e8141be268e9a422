//! Innsikt CLI entry point.

use anyhow::Result;
use clap::Parser;
use innsikt::cli::{commands, Cli, Commands};
use innsikt::config::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config_path = cli.config.as_deref().map(Settings::expand_path);
    let settings = Settings::load_from(config_path.as_ref())?;

    // Initialize logging
    let log_level = match cli.verbose {
        0 => settings.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("innsikt={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    std::fs::create_dir_all(settings.temp_dir())?;

    match &cli.command {
        Commands::Finance { question } => {
            commands::run_finance(question, cli.verbose, settings).await?;
        }

        Commands::Youtube { url, query } => {
            commands::run_youtube(url, query, cli.verbose, settings).await?;
        }

        Commands::Video { file, query } => {
            commands::run_video(file, query, cli.verbose, settings).await?;
        }

        Commands::Ingredients { image, query } => {
            commands::run_ingredients(image, query.as_deref(), cli.verbose, settings).await?;
        }

        Commands::VideoId { url } => {
            commands::run_video_id(url)?;
        }

        Commands::Doctor => {
            commands::run_doctor(&settings, config_path)?;
        }

        Commands::Config { action } => {
            commands::run_config(action, config_path, settings)?;
        }
    }

    Ok(())
}
