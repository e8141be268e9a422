//! Chat-completions client configuration.
//!
//! The hosted model is reached through an OpenAI-compatible endpoint, so the
//! same client works against Gemini's compatibility API or OpenAI itself.

use crate::config::ModelSettings;
use crate::error::{InnsiktError, Result};
use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Default timeout for model API requests (5 minutes).
const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Create a client for the configured endpoint.
///
/// Fails when the API key environment variable is unset.
pub fn create_client(settings: &ModelSettings) -> Result<Client<OpenAIConfig>> {
    let api_key = settings.api_key().ok_or_else(|| {
        InnsiktError::Config(format!(
            "{} not set. Set it with: export {}='...'",
            settings.api_key_env, settings.api_key_env
        ))
    })?;

    let timeout = match settings.timeout_seconds {
        0 => DEFAULT_TIMEOUT_SECS,
        secs => secs,
    };

    let config = OpenAIConfig::new()
        .with_api_base(settings.api_base.trim_end_matches('/'))
        .with_api_key(api_key);

    Ok(Client::with_config(config).with_http_client(http_client(Duration::from_secs(timeout))?))
}

/// Shared HTTP client builder used by the model client and the tools.
pub fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("innsikt/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(InnsiktError::Http)
}
