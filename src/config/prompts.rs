//! Prompt framings for Innsikt.
//!
//! Framings can be customized by placing TOML files in the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Collection of all prompt framings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Prompts {
    pub youtube: Framing,
    pub video: Framing,
    pub ingredients: Framing,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// Fixed instructional text wrapped around fetched context and the user's query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Framing {
    /// Text placed before everything else.
    pub preamble: String,
    /// Heading for the context block, e.g. "Transcript".
    pub context_label: String,
    /// Text placed after the query.
    pub closing: String,
    /// Query used when the user supplies none. Empty means a query is required.
    pub default_query: String,
}

impl Default for Framing {
    fn default() -> Self {
        Self {
            preamble: String::new(),
            context_label: "Context".to_string(),
            closing: String::new(),
            default_query: String::new(),
        }
    }
}

impl Default for Prompts {
    fn default() -> Self {
        Self {
            youtube: Framing {
                preamble: r#"You are an intelligent assistant with access to a YouTube video transcript and web search tools.
Your task is to answer the user's query by:
1. Understanding the video transcript.
2. Supplementing the response with relevant information from web searches."#
                    .to_string(),
                context_label: "Transcript".to_string(),
                closing: "Provide a clear, concise, and actionable response. Include references to both the transcript and additional web findings when needed.".to_string(),
                default_query: String::new(),
            },
            video: Framing {
                preamble: "Analyze the uploaded video for content and context. Respond to the following query using video insights and supplementary web research.".to_string(),
                context_label: "Context".to_string(),
                closing: String::new(),
                default_query: String::new(),
            },
            ingredients: Framing {
                preamble: "Analyze the given image of a product's ingredient label.".to_string(),
                context_label: "Context".to_string(),
                closing: String::new(),
                default_query: "Analyze the given image".to_string(),
            },
            variables: HashMap::new(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            for (file, slot) in [
                ("youtube.toml", &mut prompts.youtube),
                ("video.toml", &mut prompts.video),
                ("ingredients.toml", &mut prompts.ingredients),
            ] {
                let path = custom_path.join(file);
                if path.exists() {
                    let content = std::fs::read_to_string(&path)?;
                    let mut framing = toml::Value::try_from(&*slot)
                        .map_err(|e| crate::error::InnsiktError::Config(e.to_string()))?;
                    super::merge_toml(&mut framing, toml::from_str(&content)?);
                    *slot = framing.try_into()?;
                }
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }

    /// Render a prompt template with custom config variables.
    pub fn render_custom(&self, template: &str) -> String {
        Self::render(template, &self.variables)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prompts() {
        let prompts = Prompts::default();
        assert!(prompts.youtube.preamble.contains("YouTube video transcript"));
        assert_eq!(prompts.youtube.context_label, "Transcript");
        assert!(prompts.video.default_query.is_empty());
        assert_eq!(prompts.ingredients.default_query, "Analyze the given image");
    }

    #[test]
    fn test_render_template() {
        let template = "Hello {{name}}, you have {{count}} messages.";
        let mut vars = HashMap::new();
        vars.insert("name".to_string(), "Alice".to_string());
        vars.insert("count".to_string(), "5".to_string());

        let result = Prompts::render(template, &vars);
        assert_eq!(result, "Hello Alice, you have 5 messages.");
    }

    #[test]
    fn test_custom_dir_overrides_single_framing() -> crate::error::Result<()> {
        let dir = tempfile::tempdir()?;
        std::fs::write(
            dir.path().join("video.toml"),
            "preamble = \"Describe the clip for {{audience}}.\"\n",
        )?;

        let mut vars = HashMap::new();
        vars.insert("audience".to_string(), "investors".to_string());

        let prompts = Prompts::load(dir.path().to_str(), Some(&vars))?;
        assert_eq!(
            prompts.render_custom(&prompts.video.preamble),
            "Describe the clip for investors."
        );
        assert_eq!(prompts.video.context_label, "Context");
        assert_eq!(prompts.youtube, Prompts::default().youtube);
        Ok(())
    }

    #[test]
    fn test_partial_override_keeps_mode_framing() -> crate::error::Result<()> {
        let dir = tempfile::tempdir()?;
        std::fs::write(dir.path().join("youtube.toml"), "preamble = \"Be brief.\"\n")?;

        let prompts = Prompts::load(dir.path().to_str(), None)?;
        let defaults = Prompts::default().youtube;
        assert_eq!(prompts.youtube.preamble, "Be brief.");
        assert_eq!(prompts.youtube.context_label, "Transcript");
        assert_eq!(prompts.youtube.closing, defaults.closing);
        Ok(())
    }
}
