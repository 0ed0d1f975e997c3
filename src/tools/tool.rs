//! Tool trait definition
//!
//! All tools implement this trait to provide a consistent interface.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::llm::ToolDefinition;

/// Result of executing a tool
///
/// Tool-server replies are classified once, when they cross the MCP
/// boundary. Everything downstream matches on this instead of probing
/// loosely typed payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ToolOutcome {
    /// Machine-readable JSON payload
    Structured(Value),
    /// Plain text (possibly several content parts joined)
    Text(String),
    /// The tool reported a failure
    Error(String),
}

impl ToolOutcome {
    /// Create a successful text outcome
    pub fn text(output: impl Into<String>) -> Self {
        ToolOutcome::Text(output.into())
    }

    /// Create an error outcome
    pub fn error(message: impl Into<String>) -> Self {
        ToolOutcome::Error(message.into())
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ToolOutcome::Error(_))
    }

    /// Text handed back to the model in a `tool_result` block
    pub fn to_content(&self) -> String {
        match self {
            ToolOutcome::Structured(value) => {
                serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
            }
            ToolOutcome::Text(text) => text.clone(),
            ToolOutcome::Error(message) => message.clone(),
        }
    }

    /// JSON view of the payload
    ///
    /// Text that happens to be JSON is parsed, since many servers return
    /// their structured data as a single text part.
    pub fn json(&self) -> Option<Value> {
        match self {
            ToolOutcome::Structured(value) => Some(value.clone()),
            ToolOutcome::Text(text) => serde_json::from_str(text).ok(),
            ToolOutcome::Error(_) => None,
        }
    }
}

/// Information about a tool call, shown on the console
#[derive(Debug, Clone)]
pub struct ToolInfo {
    /// Name of the tool
    pub name: String,
    /// Human-readable description of what this invocation will do
    pub action_description: String,
    /// Additional details (e.g. the arguments)
    pub details: Option<String>,
}

/// Trait for tools that the agent can use
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the name of this tool
    fn name(&self) -> &str;

    /// Get a description of this tool
    fn description(&self) -> &str;

    /// Get the tool definition for the Anthropic API
    fn definition(&self) -> ToolDefinition;

    /// Get information about what this tool invocation will do
    fn get_info(&self, input: &Value) -> ToolInfo;

    /// Execute the tool with the given input
    ///
    /// The input is a JSON value that matches the tool's input schema.
    async fn execute(&self, input: &Value) -> Result<ToolOutcome>;
}
