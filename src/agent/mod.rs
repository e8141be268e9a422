//! Agent abstraction: a hosted model plus the tools it may call.
//!
//! Callers hand an agent one prompt (and optional media) and get text back.
//! Everything between, model calls and tool round-trips, stays inside the
//! agent implementation.

mod runner;

pub use runner::{build_system_message, ToolAgent};

use crate::error::Result;
use crate::media::Attachment;
use async_trait::async_trait;

/// Something that turns a prompt into text.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Display name, used in logs.
    fn name(&self) -> &str;

    /// Run a single prompt to completion.
    async fn run(&self, prompt: &str, attachments: &[Attachment]) -> Result<AgentResponse>;
}

/// Response from an agent run.
#[derive(Debug, Clone, Default)]
pub struct AgentResponse {
    /// The final response content from the agent.
    pub content: String,
    /// Record of all tool calls made during execution.
    pub tool_calls: Vec<ToolCallRecord>,
    /// Number of iterations (model calls) used.
    pub iterations: usize,
}

/// Record of a tool call made by the agent.
#[derive(Debug, Clone)]
pub struct ToolCallRecord {
    /// Name of the tool called.
    pub name: String,
    /// JSON arguments passed to the tool.
    pub arguments: String,
    /// Result returned by the tool.
    pub result: String,
}

impl std::fmt::Display for ToolCallRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.name, self.arguments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_call_record_display() {
        let record = ToolCallRecord {
            name: "get_stock_price".to_string(),
            arguments: r#"{"symbol": "NVDA"}"#.to_string(),
            result: "| NVDA | 131.50 USD |".to_string(),
        };
        assert_eq!(format!("{}", record), r#"get_stock_price({"symbol": "NVDA"})"#);
    }
}
