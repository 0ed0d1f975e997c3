//! Agent Configuration

use std::sync::Arc;

use crate::llm::{RetryPolicy, ToolDefinition};
use crate::tools::ToolRegistry;

/// Default cap on model calls within one turn
pub const DEFAULT_MAX_TOOL_ITERATIONS: usize = 25;

/// Configuration for an `Agent`
///
/// ```ignore
/// let config = AgentConfig::new("You are a helpful assistant")
///     .with_tools(tools)
///     .with_max_tool_iterations(10)
///     .with_history_window(5);
/// ```
pub struct AgentConfig {
    /// System prompt for the model
    pub system_prompt: String,

    /// Tool registry (optional - agent can work without tools)
    pub tools: Option<Arc<ToolRegistry>>,

    /// Maximum number of model calls per turn (prevents infinite tool loops)
    pub max_tool_iterations: usize,

    /// Backoff applied to each model request
    pub retry: RetryPolicy,

    /// Only send the last N turns of history to the model
    pub history_window: Option<usize>,
}

impl AgentConfig {
    /// Create a new agent configuration with a system prompt
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            tools: None,
            max_tool_iterations: DEFAULT_MAX_TOOL_ITERATIONS,
            retry: RetryPolicy::default(),
            history_window: None,
        }
    }

    /// Set the tool registry
    pub fn with_tools(mut self, tools: Arc<ToolRegistry>) -> Self {
        self.tools = Some(tools);
        self
    }

    /// Set maximum tool iterations per turn
    pub fn with_max_tool_iterations(mut self, max: usize) -> Self {
        self.max_tool_iterations = max.max(1);
        self
    }

    /// Set the retry policy for model requests
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Limit the history sent with each request to the last `turns` turns
    pub fn with_history_window(mut self, turns: usize) -> Self {
        self.history_window = Some(turns);
        self
    }

    /// Get tool definitions (empty vec if no tools)
    pub fn tool_definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .as_ref()
            .map(|t| t.get_definitions())
            .unwrap_or_default()
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self::new("You are a helpful assistant.")
    }
}

impl std::fmt::Debug for AgentConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentConfig")
            .field(
                "system_prompt",
                &format!("{}...", &self.system_prompt.chars().take(50).collect::<String>()),
            )
            .field("tools", &self.tools.as_ref().map(|t| t.tool_names()))
            .field("max_tool_iterations", &self.max_tool_iterations)
            .field("retry", &self.retry)
            .field("history_window", &self.history_window)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_config_defaults() {
        let config = AgentConfig::default();
        assert_eq!(config.max_tool_iterations, DEFAULT_MAX_TOOL_ITERATIONS);
        assert_eq!(config.retry.max_attempts, 5);
        assert!(config.history_window.is_none());
        assert!(config.tool_definitions().is_empty());
    }

    #[test]
    fn test_max_tool_iterations_is_at_least_one() {
        let config = AgentConfig::new("Test").with_max_tool_iterations(0);
        assert_eq!(config.max_tool_iterations, 1);
    }
}
