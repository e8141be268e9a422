//! Tools the agent can call: web search and stock data.
//!
//! Tools are only ever invoked by the agent in response to a model request;
//! the analysis code never calls them directly.

mod finance;
mod search;

pub use finance::{AnalystRecommendations, CompanyNews, StockFundamentals, StockPrice, YahooFinance};
pub use search::{DuckDuckGo, Tavily};

use crate::config::Settings;
use crate::error::{InnsiktError, Result};
use async_openai::types::{ChatCompletionTool, ChatCompletionToolType, FunctionObject};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Timeout for a single tool HTTP request.
const TOOL_TIMEOUT_SECS: u64 = 30;

/// A callable capability exposed to the model.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Function name the model uses.
    fn name(&self) -> &'static str;

    /// What the tool does, shown to the model.
    fn description(&self) -> &'static str;

    /// JSON schema of the arguments.
    fn parameters(&self) -> Value;

    /// Run the tool with parsed JSON arguments.
    async fn call(&self, arguments: &Value) -> Result<String>;
}

/// Fetch a required string argument.
pub(crate) fn required_str<'a>(arguments: &'a Value, key: &str) -> Result<&'a str> {
    arguments[key]
        .as_str()
        .ok_or_else(|| InnsiktError::Tool(format!("Missing '{}' argument", key)))
}

/// The set of tools available to one agent.
#[derive(Clone, Default)]
pub struct Toolbox {
    tools: Vec<Arc<dyn Tool>>,
}

impl Toolbox {
    pub fn new(tools: Vec<Arc<dyn Tool>>) -> Self {
        Self { tools }
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Names of the tools in this box.
    pub fn names(&self) -> Vec<&'static str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    /// Function definitions in chat-completions format.
    pub fn definitions(&self) -> Vec<ChatCompletionTool> {
        self.tools
            .iter()
            .map(|tool| ChatCompletionTool {
                r#type: ChatCompletionToolType::Function,
                function: FunctionObject {
                    name: tool.name().to_string(),
                    description: Some(tool.description().to_string()),
                    parameters: Some(tool.parameters()),
                    strict: None,
                },
            })
            .collect()
    }

    /// Execute a tool call requested by the model.
    ///
    /// Failures are returned as text so the model can react to them.
    pub async fn execute(&self, name: &str, arguments: &str) -> String {
        info!("Agent calling tool: {} with args: {}", name, arguments);

        let Some(tool) = self.tools.iter().find(|t| t.name() == name) else {
            warn!("Model requested unknown tool {}", name);
            return format!("Unknown tool: {}", name);
        };

        let args: Value = match serde_json::from_str(arguments) {
            Ok(args) => args,
            Err(e) => return format!("Failed to parse tool call: Invalid tool arguments: {}", e),
        };

        match tool.call(&args).await {
            Ok(output) => output,
            Err(e) => {
                warn!("Tool {} failed: {}", name, e);
                match e {
                    InnsiktError::Tool(message) => format!("Tool error: {}", message),
                    other => format!("Tool error: {}", other),
                }
            }
        }
    }
}

/// Builds toolboxes from tool names, sharing HTTP clients between them.
pub struct ToolFactory {
    http: reqwest::Client,
    yahoo: Arc<YahooFinance>,
    tavily_api_key: Option<String>,
    max_results: usize,
}

impl ToolFactory {
    pub fn new(settings: &Settings) -> Result<Self> {
        let timeout = Duration::from_secs(TOOL_TIMEOUT_SECS);
        let http = crate::openai::http_client(timeout)?;
        let yahoo_http = reqwest::Client::builder()
            .timeout(timeout)
            .cookie_store(true)
            .user_agent(concat!("Mozilla/5.0 (compatible; innsikt/", env!("CARGO_PKG_VERSION"), ")"))
            .build()?;

        Ok(Self {
            http,
            yahoo: Arc::new(YahooFinance::new(yahoo_http)),
            tavily_api_key: settings.search.tavily_api_key(),
            max_results: settings.search.max_results,
        })
    }

    /// Build the named tools. Unknown names and missing keys are configuration errors.
    pub fn toolbox(&self, names: &[String]) -> Result<Toolbox> {
        let mut seen = HashSet::new();
        let mut tools: Vec<Arc<dyn Tool>> = Vec::new();

        for name in names {
            if !seen.insert(name.as_str()) {
                continue;
            }
            let tool: Arc<dyn Tool> = match name.as_str() {
                "web_search" => Arc::new(DuckDuckGo::new(self.http.clone(), self.max_results)),
                "tavily_search" => {
                    let api_key = self.tavily_api_key.clone().ok_or_else(|| {
                        InnsiktError::Config(
                            "tavily_search needs TAVILY_API_KEY. Set it with: export TAVILY_API_KEY='tvly-...'"
                                .to_string(),
                        )
                    })?;
                    Arc::new(Tavily::new(self.http.clone(), api_key, self.max_results))
                }
                "get_stock_price" => Arc::new(StockPrice::new(self.yahoo.clone())),
                "get_stock_fundamentals" => Arc::new(StockFundamentals::new(self.yahoo.clone())),
                "get_analyst_recommendations" => {
                    Arc::new(AnalystRecommendations::new(self.yahoo.clone()))
                }
                "get_company_news" => Arc::new(CompanyNews::new(self.yahoo.clone(), self.max_results)),
                other => {
                    return Err(InnsiktError::Config(format!("Unknown tool: {}", other)));
                }
            };
            tools.push(tool);
        }

        Ok(Toolbox::new(tools))
    }
}
