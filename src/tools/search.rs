//! Web search tools.

use super::{required_str, Tool};
use crate::error::{InnsiktError, Result};
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::LazyLock;
use tracing::debug;

const DUCKDUCKGO_URL: &str = "https://api.duckduckgo.com/";
const TAVILY_URL: &str = "https://api.tavily.com/search";

static HTML_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]+>").expect("Invalid regex"));

fn query_parameters() -> Value {
    json!({
        "type": "object",
        "properties": {
            "query": {
                "type": "string",
                "description": "The search query"
            }
        },
        "required": ["query"]
    })
}

/// `web_search`: DuckDuckGo instant answers.
pub struct DuckDuckGo {
    http: reqwest::Client,
    max_results: usize,
}

impl DuckDuckGo {
    pub fn new(http: reqwest::Client, max_results: usize) -> Self {
        Self { http, max_results }
    }
}

#[async_trait]
impl Tool for DuckDuckGo {
    fn name(&self) -> &'static str {
        "web_search"
    }

    fn description(&self) -> &'static str {
        "Search the web with DuckDuckGo. Use this for current events, background facts and sources."
    }

    fn parameters(&self) -> Value {
        query_parameters()
    }

    async fn call(&self, arguments: &Value) -> Result<String> {
        let query = required_str(arguments, "query")?;
        debug!("DuckDuckGo search: {}", query);

        let body: Value = self
            .http
            .get(DUCKDUCKGO_URL)
            .query(&[
                ("q", query),
                ("format", "json"),
                ("no_html", "1"),
                ("skip_disambig", "1"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(format_duckduckgo(query, &body, self.max_results))
    }
}

fn format_duckduckgo(query: &str, body: &Value, max_results: usize) -> String {
    let mut lines = Vec::new();

    let heading = body["Heading"].as_str().unwrap_or_default();
    let abstract_text = body["AbstractText"].as_str().unwrap_or_default();
    if !abstract_text.is_empty() {
        lines.push(format!(
            "{}: {} ({})",
            if heading.is_empty() { query } else { heading },
            abstract_text,
            body["AbstractURL"].as_str().unwrap_or_default()
        ));
    }

    if let Some(answer) = body["Answer"].as_str().filter(|a| !a.is_empty()) {
        lines.push(format!("Answer: {}", answer));
    }

    // Grouped topics nest their entries under "Topics".
    let topics = body["RelatedTopics"]
        .as_array()
        .into_iter()
        .flatten()
        .flat_map(|topic| match topic["Topics"].as_array() {
            Some(nested) => nested.iter().collect::<Vec<_>>(),
            None => vec![topic],
        })
        .filter_map(|topic| {
            let text = topic["Text"]
                .as_str()
                .map(|t| HTML_TAG.replace_all(t, "").to_string())?;
            Some(format!(
                "- {} ({})",
                text,
                topic["FirstURL"].as_str().unwrap_or_default()
            ))
        })
        .take(max_results);
    lines.extend(topics);

    if lines.is_empty() {
        format!("No results found for '{}'.", query)
    } else {
        lines.join("\n")
    }
}

/// `tavily_search`: Tavily's research-oriented search API.
pub struct Tavily {
    http: reqwest::Client,
    api_key: String,
    max_results: usize,
}

impl Tavily {
    pub fn new(http: reqwest::Client, api_key: String, max_results: usize) -> Self {
        Self {
            http,
            api_key,
            max_results,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    answer: Option<String>,
    #[serde(default)]
    results: Vec<TavilyResult>,
}

#[derive(Debug, Deserialize)]
struct TavilyResult {
    title: String,
    url: String,
    #[serde(default)]
    content: String,
}

#[async_trait]
impl Tool for Tavily {
    fn name(&self) -> &'static str {
        "tavily_search"
    }

    fn description(&self) -> &'static str {
        "Search the web with Tavily for research material, health and nutrition evidence, and sources."
    }

    fn parameters(&self) -> Value {
        query_parameters()
    }

    async fn call(&self, arguments: &Value) -> Result<String> {
        let query = required_str(arguments, "query")?;
        debug!("Tavily search: {}", query);

        let response = self
            .http
            .post(TAVILY_URL)
            .bearer_auth(&self.api_key)
            .json(&json!({
                "api_key": self.api_key,
                "query": query,
                "max_results": self.max_results,
                "include_answer": true,
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(InnsiktError::Tool(format!(
                "Tavily returned {}: {}",
                status, body
            )));
        }

        let parsed: TavilyResponse = response.json().await?;
        Ok(format_tavily(query, parsed))
    }
}

fn format_tavily(query: &str, response: TavilyResponse) -> String {
    let mut lines = Vec::new();
    if let Some(answer) = response.answer.filter(|a| !a.is_empty()) {
        lines.push(format!("Answer: {}", answer));
    }
    for (i, result) in response.results.iter().enumerate() {
        lines.push(format!(
            "{}. {} ({})\n   {}",
            i + 1,
            result.title,
            result.url,
            result.content.chars().take(500).collect::<String>()
        ));
    }

    if lines.is_empty() {
        format!("No results found for '{}'.", query)
    } else {
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duckduckgo() {
        let body = json!({
            "Heading": "Rust (programming language)",
            "AbstractText": "Rust is a general-purpose programming language.",
            "AbstractURL": "https://en.wikipedia.org/wiki/Rust_(programming_language)",
            "Answer": "",
            "RelatedTopics": [
                {"Text": "Cargo - the <b>Rust</b> package manager", "FirstURL": "https://duckduckgo.com/Cargo"},
                {"Name": "See also", "Topics": [
                    {"Text": "Ferris - mascot", "FirstURL": "https://duckduckgo.com/Ferris"},
                    {"Text": "Crates.io - registry", "FirstURL": "https://duckduckgo.com/Crates"}
                ]}
            ]
        });

        let text = format_duckduckgo("rust", &body, 2);
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Rust (programming language): Rust is a general-purpose"));
        assert_eq!(lines[1], "- Cargo - the Rust package manager (https://duckduckgo.com/Cargo)");
        assert_eq!(lines[2], "- Ferris - mascot (https://duckduckgo.com/Ferris)");
    }

    #[test]
    fn test_format_duckduckgo_empty() {
        let text = format_duckduckgo("zzqx", &json!({"RelatedTopics": []}), 5);
        assert_eq!(text, "No results found for 'zzqx'.");
    }

    #[test]
    fn test_format_tavily() {
        let response: TavilyResponse = serde_json::from_value(json!({
            "answer": "Carrageenan is a thickener derived from seaweed.",
            "results": [
                {"title": "Carrageenan safety", "url": "https://example.org/c", "content": "Studies suggest..."}
            ]
        }))
        .unwrap();

        let text = format_tavily("carrageenan", response);
        assert!(text.starts_with("Answer: Carrageenan is a thickener"));
        assert!(text.contains("1. Carrageenan safety (https://example.org/c)\n   Studies suggest..."));
    }
}
