//! Tool Executor
//!
//! Runs the tool calls requested by one model response. Failures become
//! error results for the model instead of aborting the turn.

use serde::Serialize;
use serde_json::Value;

use crate::llm::ContentBlock;
use crate::tools::{ToolOutcome, ToolRegistry};

/// One executed tool call, kept for display
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolCallRecord {
    pub id: String,
    pub name: String,
    /// Human-readable summary of the call
    pub action: String,
    pub is_error: bool,
}

/// Executes tool calls against a registry
pub struct ToolExecutor;

impl ToolExecutor {
    /// Execute one call
    pub async fn execute(tools: Option<&ToolRegistry>, tool_name: &str, input: &Value) -> ToolOutcome {
        let Some(tools) = tools else {
            return ToolOutcome::error(format!("No tools configured, cannot execute: {}", tool_name));
        };

        if tools.get(tool_name).is_none() {
            tracing::warn!("[Executor] Model requested unknown tool {}", tool_name);
            return ToolOutcome::error(format!("Unknown tool: {}", tool_name));
        }

        match tools.execute(tool_name, input).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!("[Executor] Tool {} failed: {:#}", tool_name, e);
                ToolOutcome::error(format!("Tool execution failed: {:#}", e))
            }
        }
    }

    /// Execute every `tool_use` block in order
    ///
    /// Returns the `tool_result` blocks to send back and a record per call.
    pub async fn execute_all(
        tools: Option<&ToolRegistry>,
        blocks: &[ContentBlock],
    ) -> (Vec<ContentBlock>, Vec<ToolCallRecord>) {
        let mut results = Vec::new();
        let mut records = Vec::new();

        for block in blocks {
            let Some((id, name, input)) = block.as_tool_use() else {
                continue;
            };

            tracing::info!("[Executor] Tool use: {} ({})", name, id);

            let outcome = Self::execute(tools, name, input).await;

            let action = tools
                .and_then(|t| t.get_tool_info(name, input))
                .map(|info| info.action_description)
                .unwrap_or_else(|| format!("Execute {}", name));

            records.push(ToolCallRecord {
                id: id.to_string(),
                name: name.to_string(),
                action,
                is_error: outcome.is_error(),
            });
            results.push(ContentBlock::tool_result(id, outcome.to_content(), outcome.is_error()));
        }

        (results, records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_no_registry_yields_error_results() {
        let blocks = vec![
            ContentBlock::text("Let me look."),
            ContentBlock::tool_use("toolu_1", "fetch__fetch", json!({"url": "https://example.com"})),
        ];

        let (results, records) = ToolExecutor::execute_all(None, &blocks).await;

        assert_eq!(results.len(), 1);
        match &results[0] {
            ContentBlock::ToolResult { tool_use_id, is_error, content } => {
                assert_eq!(tool_use_id, "toolu_1");
                assert_eq!(*is_error, Some(true));
                assert!(content.as_deref().unwrap().contains("No tools configured"));
            }
            other => panic!("unexpected block: {:?}", other),
        }
        assert_eq!(records[0].action, "Execute fetch__fetch");
        assert!(records[0].is_error);
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let registry = ToolRegistry::new();
        let outcome = ToolExecutor::execute(Some(&registry), "nope", &json!({})).await;
        assert_eq!(outcome, ToolOutcome::error("Unknown tool: nope"));
    }
}
