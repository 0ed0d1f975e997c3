//! Tool registry for managing available tools
//!
//! The registry holds every tool offered to the model. Tools are either
//! registered directly or pulled from providers (MCP tool servers).

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::Value;

use super::provider::ToolProvider;
use super::tool::{Tool, ToolInfo, ToolOutcome};
use crate::llm::ToolDefinition;

/// Registry that holds all available tools
pub struct ToolRegistry {
    /// Keyed by name; ordered so definitions are sent in a stable order
    tools: BTreeMap<String, Arc<dyn Tool>>,
    providers: Vec<Arc<dyn ToolProvider>>,
}

impl ToolRegistry {
    /// Create a new empty tool registry
    pub fn new() -> Self {
        Self {
            tools: BTreeMap::new(),
            providers: Vec::new(),
        }
    }

    /// Register a static tool in the registry
    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        let name = tool.name().to_string();
        tracing::info!("Registering tool: {}", name);
        self.tools.insert(name, Arc::new(tool));
    }

    /// Add a tool provider
    ///
    /// Fetches the provider's tools immediately. Fails on a name conflict
    /// with a tool that is already registered.
    pub async fn add_provider(&mut self, provider: Arc<dyn ToolProvider>) -> Result<()> {
        tracing::info!("[ToolRegistry] Adding provider '{}'", provider.name());

        let tools = provider.get_tools().await?;

        for tool in tools {
            let name = tool.name().to_string();

            if self.tools.contains_key(&name) {
                return Err(anyhow::anyhow!(
                    "Tool name conflict: '{}' already exists (from provider '{}')",
                    name,
                    provider.name()
                ));
            }

            tracing::info!(
                "[ToolRegistry] Registering tool '{}' from provider '{}'",
                name,
                provider.name()
            );
            self.tools.insert(name, tool);
        }

        self.providers.push(provider);

        Ok(())
    }

    /// Names of the providers added so far
    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Get all tool definitions for the Anthropic API
    pub fn get_definitions(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|t| t.definition()).collect()
    }

    /// Get information about a tool invocation
    pub fn get_tool_info(&self, name: &str, input: &Value) -> Option<ToolInfo> {
        self.tools.get(name).map(|t| t.get_info(input))
    }

    /// Execute a tool by name
    pub async fn execute(&self, name: &str, input: &Value) -> Result<ToolOutcome> {
        let tool = self
            .tools
            .get(name)
            .with_context(|| format!("Tool not found: {}", name))?;

        tracing::info!("Executing tool: {}", name);
        tracing::debug!("Input: {:?}", input);

        let outcome = tool.execute(input).await?;

        tracing::debug!("Tool {} completed. Is error: {}", name, outcome.is_error());

        Ok(outcome)
    }

    /// Get the list of tool names
    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.keys().map(|s| s.as_str()).collect()
    }

    /// Get the number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
