//! Configuration settings for Innsikt.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub model: ModelSettings,
    pub search: SearchSettings,
    pub transcript: TranscriptSettings,
    pub media: MediaSettings,
    pub prompts: PromptSettings,
    pub agents: AgentSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for temporary files (caption downloads).
    pub temp_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            temp_dir: "/tmp/innsikt".to_string(),
            log_level: "warn".to_string(),
        }
    }
}

/// Hosted model endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    /// Base URL of an OpenAI-compatible chat completions API.
    pub api_base: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Model identifier.
    pub model: String,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
    /// Maximum model round-trips per agent run.
    pub max_iterations: usize,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            api_base: "https://generativelanguage.googleapis.com/v1beta/openai".to_string(),
            api_key_env: "GOOGLE_API_KEY".to_string(),
            model: "gemini-2.0-flash-exp".to_string(),
            timeout_seconds: 300,
            max_iterations: 10,
        }
    }
}

impl ModelSettings {
    /// Read the API key from the configured environment variable.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env).ok().filter(|k| !k.is_empty())
    }
}

/// Web search tool settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Environment variable holding the Tavily API key.
    pub tavily_api_key_env: String,
    /// Maximum results returned to the model per search.
    pub max_results: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            tavily_api_key_env: "TAVILY_API_KEY".to_string(),
            max_results: 5,
        }
    }
}

impl SearchSettings {
    /// Read the Tavily API key from the configured environment variable.
    pub fn tavily_api_key(&self) -> Option<String> {
        std::env::var(&self.tavily_api_key_env)
            .ok()
            .filter(|k| !k.is_empty())
    }
}

/// Caption retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptSettings {
    /// Preferred caption languages, most preferred first.
    pub languages: Vec<String>,
}

impl Default for TranscriptSettings {
    fn default() -> Self {
        Self {
            languages: vec!["en".to_string()],
        }
    }
}

/// Inline media settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaSettings {
    /// Largest image sent inline with a request.
    pub max_inline_bytes: u64,
    /// Base URL of the Files API that videos are uploaded to.
    pub files_api_base: String,
    /// Seconds between processing-state checks after an upload.
    pub poll_interval_seconds: u64,
    /// Give up on an upload still processing after this many seconds.
    pub processing_timeout_seconds: u64,
}

impl Default for MediaSettings {
    fn default() -> Self {
        Self {
            max_inline_bytes: 20 * 1024 * 1024,
            files_api_base: "https://generativelanguage.googleapis.com".to_string(),
            poll_interval_seconds: 1,
            processing_timeout_seconds: 600,
        }
    }
}

impl MediaSettings {
    /// Polling schedule for uploaded files.
    pub fn poll(&self) -> crate::media::PollSettings {
        crate::media::PollSettings {
            interval: std::time::Duration::from_secs(self.poll_interval_seconds),
            timeout: std::time::Duration::from_secs(self.processing_timeout_seconds),
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

/// Agent definition: persona, instructions and enabled tools.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AgentProfile {
    /// Display name, used in logs.
    pub name: String,
    /// Optional system prompt placed before the instructions.
    pub system_prompt: Option<String>,
    /// Instructions appended to the system message as a bullet list.
    pub instructions: Vec<String>,
    /// Names of the tools the agent may call.
    pub tools: Vec<String>,
    /// Ask the model to answer in Markdown.
    pub markdown: bool,
}

impl Default for AgentProfile {
    fn default() -> Self {
        Self {
            name: "Agent".to_string(),
            system_prompt: None,
            instructions: Vec::new(),
            tools: vec!["web_search".to_string()],
            markdown: true,
        }
    }
}

/// Agent profiles, one per analysis mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    pub finance: AgentProfile,
    pub video: AgentProfile,
    pub youtube: AgentProfile,
    pub ingredients: AgentProfile,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            finance: AgentProfile {
                name: "Finance AI Agent".to_string(),
                system_prompt: None,
                instructions: vec![
                    "Use DuckDuckGo for web searches.".to_string(),
                    "Provide financial data in tabular format.".to_string(),
                    "Always include sources for any information provided.".to_string(),
                ],
                tools: vec![
                    "get_stock_price".to_string(),
                    "get_analyst_recommendations".to_string(),
                    "get_stock_fundamentals".to_string(),
                    "get_company_news".to_string(),
                    "web_search".to_string(),
                ],
                markdown: true,
            },
            video: AgentProfile {
                name: "Video AI Summarizer".to_string(),
                ..AgentProfile::default()
            },
            youtube: AgentProfile {
                name: "YouTube Video AI Summarizer".to_string(),
                ..AgentProfile::default()
            },
            ingredients: AgentProfile {
                name: "Product Ingredient Agent".to_string(),
                system_prompt: Some(
                    "You are an expert Food Product Analyst specialized in ingredient analysis and nutrition science.\n\
                     Your role is to analyze product ingredients, provide health insights, and identify potential concerns by combining ingredient analysis with scientific research.\n\
                     You utilize your nutritional knowledge and research works to provide evidence-based insights, making complex ingredient information accessible and actionable for users."
                        .to_string(),
                ),
                instructions: vec![
                    "Read ingredient list from product image".to_string(),
                    "Remember the user may not be educated about the product, break it down in simple words like explaining to a 10-year-old".to_string(),
                    "Identify artificial additives and preservatives".to_string(),
                    "Check against major dietary restrictions (vegan, halal, kosher). Include this in response.".to_string(),
                    "Rate nutritional value on a scale of 1-5".to_string(),
                    "Highlight key health implications or concerns".to_string(),
                    "Suggest healthier alternatives if needed".to_string(),
                    "Provide brief evidence-based recommendations".to_string(),
                    "Use the Search tool for getting context".to_string(),
                ],
                tools: vec!["tavily_search".to_string()],
                markdown: true,
            },
        }
    }
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Self::from_toml(&content)
        } else {
            Ok(Settings::default())
        }
    }

    /// Parse a configuration file on top of the defaults.
    ///
    /// Tables merge key by key, so a partial `[agents.<mode>]` section keeps
    /// that mode's own name, persona and instructions.
    pub fn from_toml(content: &str) -> crate::error::Result<Self> {
        let overrides: toml::Value = toml::from_str(content)?;
        let mut merged = toml::Value::try_from(Settings::default())
            .map_err(|e| crate::error::InnsiktError::Config(e.to_string()))?;
        super::merge_toml(&mut merged, overrides);
        Ok(merged.try_into()?)
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::InnsiktError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("innsikt")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded temp directory path.
    pub fn temp_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.temp_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_falls_back_to_defaults() -> crate::error::Result<()> {
        let dir = tempfile::tempdir()?;
        let settings = Settings::load_from(Some(&dir.path().join("absent.toml")))?;
        assert_eq!(settings.model.model, "gemini-2.0-flash-exp");
        assert_eq!(settings.transcript.languages, vec!["en".to_string()]);
        Ok(())
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() -> crate::error::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[model]\nmodel = \"gemini-1.5-pro\"\n\n[agents.youtube]\ntools = []\n",
        )?;

        let settings = Settings::load_from(Some(&path))?;
        assert_eq!(settings.model.model, "gemini-1.5-pro");
        assert_eq!(settings.model.api_key_env, "GOOGLE_API_KEY");
        assert!(settings.agents.youtube.tools.is_empty());
        assert_eq!(settings.agents.finance.tools.len(), 5);
        Ok(())
    }

    #[test]
    fn test_partial_agent_override_keeps_mode_defaults() -> crate::error::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[agents.ingredients]\ntools = [\"web_search\"]\n")?;

        let settings = Settings::load_from(Some(&path))?;
        let ingredients = &settings.agents.ingredients;
        assert_eq!(ingredients.tools, vec!["web_search".to_string()]);
        assert_eq!(ingredients.name, "Product Ingredient Agent");
        assert!(ingredients
            .system_prompt
            .as_deref()
            .is_some_and(|p| p.starts_with("You are an expert Food Product Analyst")));
        assert_eq!(ingredients.instructions.len(), 9);
        Ok(())
    }

    #[test]
    fn test_save_and_reload() -> crate::error::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("nested").join("config.toml");

        let mut settings = Settings::default();
        settings.media.max_inline_bytes = 1024;
        settings.save_to(&path)?;

        let reloaded = Settings::load_from(Some(&path))?;
        assert_eq!(reloaded.media.max_inline_bytes, 1024);
        assert_eq!(reloaded.agents.ingredients, settings.agents.ingredients);
        Ok(())
    }
}
