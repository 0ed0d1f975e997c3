//! MCP Tool Provider
//!
//! Implements ToolProvider for a set of tool servers

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use crate::tools::{Tool, ToolProvider, ToolRegistry};

use super::manager::ToolServerSet;
use super::tool_adapter::MCPToolAdapter;

/// Tool provider that lists tools from every server in a set
pub struct MCPToolProvider {
    servers: Arc<ToolServerSet>,
}

impl MCPToolProvider {
    /// Create a new MCP tool provider
    pub fn new(servers: Arc<ToolServerSet>) -> Self {
        Self { servers }
    }
}

#[async_trait]
impl ToolProvider for MCPToolProvider {
    async fn get_tools(&self) -> Result<Vec<Arc<dyn Tool>>> {
        tracing::info!("[MCPToolProvider] Fetching tools from {} servers", self.servers.len());

        let mut tools: Vec<Arc<dyn Tool>> = Vec::new();

        for server in self.servers.servers() {
            match server.list_tools().await {
                Ok(listed) => {
                    for tool_def in listed {
                        tools.push(Arc::new(MCPToolAdapter::new(server.clone(), tool_def)));
                    }
                }
                Err(e) => {
                    // One broken server should not take the others down with it
                    tracing::warn!(
                        "[MCPToolProvider] Failed to get tools from server '{}': {:#}",
                        server.id(),
                        e
                    );
                }
            }
        }

        tracing::info!("[MCPToolProvider] Created {} tool adapters", tools.len());

        Ok(tools)
    }

    fn name(&self) -> &str {
        "MCP"
    }
}

/// Registry holding every tool of the given servers
pub async fn registry_for(servers: Arc<ToolServerSet>) -> Result<ToolRegistry> {
    let mut registry = ToolRegistry::new();
    if !servers.is_empty() {
        registry.add_provider(Arc::new(MCPToolProvider::new(servers))).await?;
    }
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::server::ToolServer;

    #[tokio::test]
    async fn test_closed_server_contributes_no_tools() {
        let mut set = ToolServerSet::empty();
        set.insert(ToolServer::closed_for_test("fetch")).unwrap();

        let provider = MCPToolProvider::new(Arc::new(set));
        assert!(provider.get_tools().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_registry_for_empty_set() {
        let registry = registry_for(Arc::new(ToolServerSet::empty())).await.unwrap();
        assert!(registry.is_empty());
        assert!(registry.provider_names().is_empty());
    }
}
