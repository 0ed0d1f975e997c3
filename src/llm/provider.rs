//! LLM Provider trait
//!
//! Abstracts the model interface so the agent loop can run against the
//! Anthropic API or a scripted test double.

use anyhow::Result;

use super::types::{Message, MessageResponse, ToolDefinition};

/// Trait for LLM providers that can be used by the `Agent`.
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send a request with tools and system prompt, returning the full response.
    async fn send_with_tools(
        &self,
        messages: Vec<Message>,
        system: Option<&str>,
        tools: Vec<ToolDefinition>,
    ) -> Result<MessageResponse>;

    /// Get the current model name.
    fn model(&self) -> String;

    /// Get the provider name (e.g., "anthropic").
    fn provider_name(&self) -> &str;
}
