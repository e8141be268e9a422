//! YouTube command implementation.

use super::{print_result, report_failure};
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Analyzer;
use crate::youtube::VideoReference;
use anyhow::Result;

/// Run the youtube command.
pub async fn run_youtube(url: &str, query: &str, verbose: u8, settings: Settings) -> Result<()> {
    let profile = &settings.agents.youtube;
    if let Err(e) = preflight::check(Operation::YoutubeAnalyze, &settings, profile) {
        Output::error(&format!("{}", e));
        Output::info("Run 'innsikt doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    if let Ok(reference) = VideoReference::parse(url) {
        Output::info(&format!("Video ID: {}", reference.video_id()));
    }

    let analyzer = Analyzer::from_settings(&settings, profile)?;

    let spinner = Output::spinner("Fetching transcript and analyzing video...");
    let outcome = analyzer.analyze_youtube(url, query).await;
    spinner.finish_and_clear();

    let result = outcome.map_err(report_failure)?;
    print_result(&result, verbose);

    Ok(())
}
