//! Video command implementation.

use super::{print_result, report_failure};
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Analyzer;
use anyhow::Result;
use std::path::PathBuf;

/// Run the video command.
pub async fn run_video(file: &str, query: &str, verbose: u8, settings: Settings) -> Result<()> {
    let profile = &settings.agents.video;
    if let Err(e) = preflight::check(Operation::Analyze, &settings, profile) {
        Output::error(&format!("{}", e));
        Output::info("Run 'innsikt doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let path: PathBuf = Settings::expand_path(file);
    let analyzer = Analyzer::from_settings(&settings, profile)?;

    let spinner = Output::spinner("Processing video and gathering insights...");
    let outcome = analyzer.analyze_video(&path, query).await;
    spinner.finish_and_clear();

    let result = outcome.map_err(report_failure)?;
    print_result(&result, verbose);

    Ok(())
}
