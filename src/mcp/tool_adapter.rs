//! MCP Tool Adapter
//!
//! Adapts tools listed by a tool server to the crate's `Tool` trait

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use crate::llm::{ToolDefinition, ToolInputSchema};
use crate::tools::{Tool, ToolInfo, ToolOutcome};

use super::server::ToolServer;

/// Separator between server ID and tool name in exposed tool names
pub const NAMESPACE_SEPARATOR: &str = "__";

/// Adapter that wraps one remote tool to implement the Tool trait
pub struct MCPToolAdapter {
    server: Arc<ToolServer>,

    /// Original tool name (used when calling the server)
    tool_name: String,

    /// Namespaced name offered to the model, e.g. `fetch__fetch`
    exposed_name: String,

    tool_definition: ToolDefinition,
}

impl MCPToolAdapter {
    /// Create a new adapter with a namespaced name
    pub fn new(server: Arc<ToolServer>, rmcp_tool: rmcp::model::Tool) -> Self {
        let exposed_name = format!("{}{}{}", server.id(), NAMESPACE_SEPARATOR, rmcp_tool.name);
        let tool_definition = Self::convert_tool_definition(&exposed_name, &rmcp_tool);

        Self {
            server,
            tool_name: rmcp_tool.name.to_string(),
            exposed_name,
            tool_definition,
        }
    }

    /// Convert an rmcp Tool definition to the Messages API format
    fn convert_tool_definition(name: &str, rmcp_tool: &rmcp::model::Tool) -> ToolDefinition {
        let schema_obj = rmcp_tool.input_schema.as_ref();

        let input_schema = ToolInputSchema {
            schema_type: schema_obj
                .get("type")
                .and_then(|v| v.as_str())
                .unwrap_or("object")
                .to_string(),
            properties: schema_obj.get("properties").cloned(),
            required: schema_obj.get("required").and_then(|v| v.as_array()).map(|arr| {
                arr.iter()
                    .filter_map(|v| v.as_str().map(|s| s.to_string()))
                    .collect()
            }),
        };

        ToolDefinition {
            name: name.to_string(),
            description: rmcp_tool.description.as_ref().map(|d| d.to_string()),
            input_schema,
        }
    }
}

#[async_trait]
impl Tool for MCPToolAdapter {
    fn name(&self) -> &str {
        &self.exposed_name
    }

    fn description(&self) -> &str {
        self.tool_definition
            .description
            .as_deref()
            .unwrap_or("MCP tool (no description)")
    }

    fn definition(&self) -> ToolDefinition {
        self.tool_definition.clone()
    }

    fn get_info(&self, input: &Value) -> ToolInfo {
        ToolInfo {
            name: self.exposed_name.clone(),
            action_description: format!("{} on {}", self.tool_name, self.server.id()),
            details: Some(format!("Input: {}", input)),
        }
    }

    async fn execute(&self, input: &Value) -> Result<ToolOutcome> {
        tracing::info!(
            "[MCPToolAdapter] Executing '{}' on server '{}'",
            self.tool_name,
            self.server.id()
        );

        let arguments = input.as_object().cloned();

        // The server knows the tool by its original, un-namespaced name
        let outcome = self.server.call_tool(&self.tool_name, arguments).await?;

        tracing::debug!(
            "[MCPToolAdapter] Tool '{}' completed. Is error: {}",
            self.tool_name,
            outcome.is_error()
        );

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::AgentError;
    use serde_json::json;

    fn rmcp_tool(name: &'static str) -> rmcp::model::Tool {
        let input_schema = Arc::new(
            serde_json::from_value(json!({
                "type": "object",
                "properties": {
                    "url": {"type": "string", "description": "URL to fetch"}
                },
                "required": ["url"]
            }))
            .unwrap(),
        );

        rmcp::model::Tool {
            name: name.into(),
            title: None,
            description: Some("Fetches a URL from the internet".into()),
            input_schema,
            output_schema: None,
            annotations: None,
            icons: None,
            meta: None,
        }
    }

    #[test]
    fn test_tool_definition_conversion() {
        let def = MCPToolAdapter::convert_tool_definition("fetch__fetch", &rmcp_tool("fetch"));
        assert_eq!(def.name, "fetch__fetch");
        assert_eq!(def.description.as_deref(), Some("Fetches a URL from the internet"));
        assert_eq!(def.input_schema.schema_type, "object");
        assert_eq!(def.input_schema.required, Some(vec!["url".to_string()]));
    }

    #[tokio::test]
    async fn test_adapter_namespaces_and_forwards() {
        let server = Arc::new(ToolServer::closed_for_test("fetch"));
        let adapter = MCPToolAdapter::new(server, rmcp_tool("fetch"));

        assert_eq!(adapter.name(), "fetch__fetch");
        assert_eq!(adapter.get_info(&json!({})).action_description, "fetch on fetch");

        let err = adapter.execute(&json!({"url": "https://example.com"})).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AgentError>(),
            Some(AgentError::ToolServerClosed(_))
        ));
    }
}
