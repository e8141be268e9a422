//! CLI command implementations.

mod config;
mod doctor;
mod finance;
mod ingredients;
mod video;
mod video_id;
mod youtube;

pub use config::run_config;
pub use doctor::run_doctor;
pub use finance::run_finance;
pub use ingredients::run_ingredients;
pub use video::run_video;
pub use video_id::run_video_id;
pub use youtube::run_youtube;

use crate::cli::Output;
use crate::error::{ErrorKind, InnsiktError};
use crate::orchestrator::AnalysisResult;

/// Print an analysis under the result header, with tool calls when verbose.
fn print_result(result: &AnalysisResult, verbose: u8) {
    if verbose > 0 && !result.tool_calls.is_empty() {
        Output::header("Tool Calls");
        for call in &result.tool_calls {
            Output::tool_call(&call.name, &call.arguments);
        }
    }

    Output::header("Analysis Result");
    println!("{}", result.text);
}

/// Report a failed analysis the way every analysis command does.
fn report_failure(e: InnsiktError) -> anyhow::Error {
    Output::error(&format!("An error occurred during analysis: {}", e));
    match e.kind() {
        ErrorKind::InvalidInput => {}
        ErrorKind::Config => Output::info("Run 'innsikt doctor' for detailed diagnostics."),
        ErrorKind::ExternalService | ErrorKind::Internal => {
            Output::info("Run again with -v for request details.")
        }
    }
    e.into()
}
