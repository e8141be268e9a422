//! Finance command implementation.

use super::{print_result, report_failure};
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Analyzer;
use anyhow::Result;

/// Run the finance command.
pub async fn run_finance(question: &str, verbose: u8, settings: Settings) -> Result<()> {
    let profile = &settings.agents.finance;
    if let Err(e) = preflight::check(Operation::Analyze, &settings, profile) {
        Output::error(&format!("{}", e));
        Output::info("Run 'innsikt doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let analyzer = Analyzer::from_settings(&settings, profile)?;

    let spinner = Output::spinner("Fetching financial insights...");
    let outcome = analyzer.ask_finance(question).await;
    spinner.finish_and_clear();

    let result = outcome.map_err(report_failure)?;
    print_result(&result, verbose);

    Ok(())
}
