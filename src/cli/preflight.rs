//! Pre-flight checks before calling the model.
//!
//! Validates that required keys and tools are available before starting
//! operations that would otherwise fail midway.

use crate::config::{AgentProfile, Settings};
use crate::error::{InnsiktError, Result};
use std::process::Command;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Any agent call needs the model API key.
    Analyze,
    /// YouTube analysis also needs yt-dlp for captions.
    YoutubeAnalyze,
}

/// Run pre-flight checks for the given operation and agent profile.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation, settings: &Settings, profile: &AgentProfile) -> Result<()> {
    check_api_key(settings)?;
    if let Operation::YoutubeAnalyze = operation {
        check_tool("yt-dlp")?;
    }
    check_profile(settings, profile)
}

/// Check keys needed by the tools a profile enables.
fn check_profile(settings: &Settings, profile: &AgentProfile) -> Result<()> {
    if profile.tools.iter().any(|t| t == "tavily_search") && settings.search.tavily_api_key().is_none() {
        return Err(InnsiktError::Config(format!(
            "{} not set. Set it with: export {}='tvly-...'",
            settings.search.tavily_api_key_env, settings.search.tavily_api_key_env
        )));
    }
    Ok(())
}

/// Check that the model API key is configured.
fn check_api_key(settings: &Settings) -> Result<()> {
    let var = &settings.model.api_key_env;
    match std::env::var(var) {
        Ok(key) if !key.is_empty() => Ok(()),
        Ok(_) => Err(InnsiktError::Config(format!(
            "{} is empty. Set it with: export {}='...'",
            var, var
        ))),
        Err(_) => Err(InnsiktError::Config(format!(
            "{} not set. Set it with: export {}='...'",
            var, var
        ))),
    }
}

/// Check if an external tool is available.
pub fn check_tool(name: &str) -> Result<()> {
    match Command::new(name).arg("--version").output() {
        Ok(output) if output.status.success() => Ok(()),
        Ok(_) => Err(InnsiktError::ToolNotFound(format!(
            "{} is installed but not working correctly",
            name
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(InnsiktError::ToolNotFound(name.to_string()))
        }
        Err(e) => Err(InnsiktError::ToolNotFound(format!("{}: {}", name, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_api_key() {
        let mut settings = Settings::default();
        settings.model.api_key_env = "INNSIKT_TEST_UNSET_MODEL_KEY".to_string();
        let profile = settings.agents.finance.clone();
        let err = check(Operation::Analyze, &settings, &profile).unwrap_err();
        assert!(err.to_string().contains("INNSIKT_TEST_UNSET_MODEL_KEY not set"));
    }

    #[test]
    fn test_missing_tavily_key_for_profile() {
        let mut settings = Settings::default();
        settings.search.tavily_api_key_env = "INNSIKT_TEST_UNSET_TAVILY_KEY".to_string();
        let err = check_profile(&settings, &settings.agents.ingredients).unwrap_err();
        assert!(err.to_string().contains("INNSIKT_TEST_UNSET_TAVILY_KEY"));

        assert!(check_profile(&settings, &settings.agents.finance).is_ok());
    }

    #[test]
    fn test_missing_tool() {
        let err = check_tool("innsikt-test-no-such-binary").unwrap_err();
        assert!(matches!(err, InnsiktError::ToolNotFound(_)));
    }
}
