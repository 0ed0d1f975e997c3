//! Tool server handle
//!
//! Wraps an rmcp client session with one tool server, either a child
//! process speaking MCP over stdio or a streamable-HTTP endpoint.

use anyhow::{Context, Result};
use rmcp::model::{CallToolRequestParams, CallToolResult, ListToolsResult, Tool};
use rmcp::service::RunningService;
use rmcp::transport::{
    streamable_http_client::StreamableHttpClientTransportConfig, ConfigureCommandExt,
    StreamableHttpClientTransport, TokioChildProcess,
};
use rmcp::{RoleClient, ServiceExt};
use serde_json::{Map, Value};
use tokio::process::Command;
use tokio::sync::RwLock;

use super::config::{ToolServerConfig, ToolServerTransport};
use super::outcome::outcome_from_result;
use crate::core::AgentError;
use crate::tools::ToolOutcome;

/// The concrete transport type we use for HTTP MCP connections
pub type HttpClientTransport = StreamableHttpClientTransport<reqwest::Client>;

/// A running tool server
///
/// Once `shutdown` has been called the handle stays valid but every
/// operation fails with `AgentError::ToolServerClosed`.
pub struct ToolServer {
    id: String,
    description: String,
    service: RwLock<Option<RunningService<RoleClient, ()>>>,
}

impl std::fmt::Debug for ToolServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolServer")
            .field("id", &self.id)
            .field("description", &self.description)
            .finish()
    }
}

impl ToolServer {
    /// Start the server described by `config` and complete the MCP handshake
    pub async fn start(config: &ToolServerConfig) -> Result<Self> {
        tracing::info!("[ToolServer] Starting '{}': {}", config.id, config.describe());

        let service = match &config.transport {
            ToolServerTransport::Stdio { command, args, env } => {
                let cmd = Command::new(command).configure(|cmd| {
                    cmd.args(args).envs(env).kill_on_drop(true);
                });
                let transport = TokioChildProcess::new(cmd).map_err(|e| {
                    AgentError::tool_server(format!("failed to spawn '{}' ({}): {}", config.id, command, e))
                })?;
                ().serve(transport)
                    .await
                    .with_context(|| format!("MCP handshake with '{}' failed", config.id))?
            }
            ToolServerTransport::Http { uri } => {
                let transport = HttpClientTransport::from_config(StreamableHttpClientTransportConfig::with_uri(uri.as_str()));
                ().serve(transport)
                    .await
                    .with_context(|| format!("Failed to connect to '{}' at {}", config.id, uri))?
            }
        };

        tracing::info!("[ToolServer] '{}' is ready", config.id);

        Ok(Self {
            id: config.id.clone(),
            description: config.describe(),
            service: RwLock::new(Some(service)),
        })
    }

    /// Get the server ID
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Command line or URI the server was started from
    pub fn description(&self) -> &str {
        &self.description
    }

    /// False once `shutdown` has run
    pub async fn is_running(&self) -> bool {
        self.service.read().await.is_some()
    }

    fn closed(&self) -> anyhow::Error {
        AgentError::ToolServerClosed(self.id.clone()).into()
    }

    /// List all tools available on this server
    pub async fn list_tools(&self) -> Result<Vec<Tool>> {
        let guard = self.service.read().await;
        let service = guard.as_ref().ok_or_else(|| self.closed())?;

        tracing::debug!("[ToolServer] Listing tools from '{}'", self.id);

        let result: ListToolsResult = service
            .list_tools(Default::default())
            .await
            .with_context(|| format!("Failed to list tools on '{}'", self.id))?;

        tracing::info!("[ToolServer] Got {} tools from '{}'", result.tools.len(), self.id);

        Ok(result.tools)
    }

    /// Call a tool and return the raw MCP result
    pub async fn call_tool_raw(
        &self,
        name: &str,
        arguments: Option<Map<String, Value>>,
    ) -> Result<CallToolResult> {
        let guard = self.service.read().await;
        let service = guard.as_ref().ok_or_else(|| self.closed())?;

        tracing::info!("[ToolServer] Calling tool '{}' on server '{}'", name, self.id);
        tracing::debug!("[ToolServer] Arguments: {:?}", arguments);

        let result = service
            .call_tool(CallToolRequestParams {
                meta: None,
                name: name.to_string().into(),
                arguments,
                task: None,
            })
            .await
            .with_context(|| format!("Tool '{}' on '{}' failed", name, self.id))?;

        tracing::debug!("[ToolServer] Tool call completed for '{}'", name);

        Ok(result)
    }

    /// Call a tool and classify its reply
    pub async fn call_tool(&self, name: &str, arguments: Option<Map<String, Value>>) -> Result<ToolOutcome> {
        let result = self.call_tool_raw(name, arguments).await?;
        Ok(outcome_from_result(result))
    }

    /// Close the session and stop the child process
    ///
    /// Idempotent. Later calls on this handle fail with `ToolServerClosed`.
    pub async fn shutdown(&self) {
        let service = self.service.write().await.take();
        let Some(service) = service else {
            return;
        };

        tracing::info!("[ToolServer] Shutting down '{}'", self.id);
        match service.cancel().await {
            Ok(reason) => tracing::debug!("[ToolServer] '{}' stopped: {:?}", self.id, reason),
            Err(e) => tracing::warn!("[ToolServer] '{}' did not stop cleanly: {}", self.id, e),
        }
    }

    #[cfg(test)]
    pub(crate) fn closed_for_test(id: &str) -> Self {
        Self {
            id: id.to_string(),
            description: id.to_string(),
            service: RwLock::new(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_start_fails_for_missing_binary() {
        let config = ToolServerConfig::stdio("ghost", "definitely-not-a-real-mcp-server-binary");
        let err = ToolServer::start(&config).await.unwrap_err();
        assert!(err.to_string().contains("ghost"));
    }

    #[tokio::test]
    async fn test_closed_server_rejects_calls() {
        let server = ToolServer::closed_for_test("fetch");
        assert!(!server.is_running().await);

        let err = server.call_tool("fetch", None).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AgentError>(),
            Some(AgentError::ToolServerClosed(id)) if id == "fetch"
        ));

        let err = server.list_tools().await.unwrap_err();
        assert_eq!(err.to_string(), "Tool server 'fetch' is closed");

        // second shutdown is a no-op
        server.shutdown().await;
    }

    #[tokio::test]
    #[ignore] // Requires python with mcp_server_fetch installed
    async fn test_fetch_server_lifecycle() {
        let server = ToolServer::start(&ToolServerConfig::fetch()).await.unwrap();
        assert!(server.is_running().await);

        let tools = server.list_tools().await.unwrap();
        assert!(tools.iter().any(|t| t.name == "fetch"));

        server.shutdown().await;
        assert!(server.call_tool("fetch", None).await.is_err());
    }
}
