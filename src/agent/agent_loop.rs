use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;

use super::config::AgentConfig;
use super::executor::{ToolCallRecord, ToolExecutor};
use crate::conversation::History;
use crate::llm::{LlmProvider, Message, StopReason};

/// Stored in place of an assistant reply that carried no content
const EMPTY_REPLY: &str = "(no response)";

/// What one agent run produced
#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    /// Final text reply
    pub output: String,
    /// Every message of the turn in order: the prompt, tool exchanges and
    /// the final reply. Append these to the history.
    pub new_messages: Vec<Message>,
    /// Tool calls made during the turn
    pub tool_calls: Vec<ToolCallRecord>,
}

/// Anything the REPL can talk to
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Answer `prompt` given the conversation so far
    async fn respond(&self, prompt: &str, history: &History) -> Result<RunResult>;
}

/// Model-backed agent with optional tools
pub struct Agent {
    llm: Arc<dyn LlmProvider>,
    config: AgentConfig,
}

impl Agent {
    /// Create a new agent
    pub fn new(llm: Arc<dyn LlmProvider>, config: AgentConfig) -> Self {
        tracing::info!(
            "[Agent] Created with model {} and {} tools",
            llm.model(),
            config.tools.as_ref().map(|t| t.len()).unwrap_or(0)
        );
        Self { llm, config }
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Run one turn: send `prompt` after `history`, executing requested
    /// tools until the model answers without tool calls
    ///
    /// Each model request is retried on rate limits by itself, so tools that
    /// already ran are never executed twice.
    pub async fn run(&self, prompt: &str, history: &[Message]) -> Result<RunResult> {
        let tool_definitions = self.config.tool_definitions();
        let tools = self.config.tools.as_deref();
        let system = Some(self.config.system_prompt.as_str()).filter(|s| !s.is_empty());

        let mut messages = history.to_vec();
        let mut new_messages = Vec::new();
        let mut tool_calls = Vec::new();

        let user_message = Message::user(prompt);
        messages.push(user_message.clone());
        new_messages.push(user_message);

        let mut iterations = 0;

        loop {
            iterations += 1;

            tracing::info!(
                "[Agent] Calling LLM with {} messages (iteration {})",
                messages.len(),
                iterations
            );

            let response = self
                .config
                .retry
                .retry(|_| {
                    self.llm.send_with_tools(
                        messages.clone(),
                        system,
                        tool_definitions.clone(),
                    )
                })
                .await
                .context("Model request failed")?;

            tracing::info!("[Agent] LLM response: stop_reason={:?}", response.stop_reason);

            let output = response.text();
            let assistant = if response.content.is_empty() {
                Message::assistant(EMPTY_REPLY)
            } else {
                Message::assistant_with_blocks(response.content.clone())
            };
            messages.push(assistant.clone());
            new_messages.push(assistant);

            if !response.has_tool_use() {
                if response.stop_reason == Some(StopReason::MaxTokens) {
                    tracing::warn!("[Agent] Response truncated (max tokens)");
                }
                return Ok(RunResult {
                    output,
                    new_messages,
                    tool_calls,
                });
            }

            let (results, records) = ToolExecutor::execute_all(tools, &response.content).await;
            tool_calls.extend(records);

            let results_message = Message::user_with_blocks(results);
            messages.push(results_message.clone());
            new_messages.push(results_message);

            if iterations >= self.config.max_tool_iterations {
                tracing::warn!(
                    "[Agent] Max tool iterations ({}) reached",
                    self.config.max_tool_iterations
                );
                let note = format!(
                    "{}\n\n(Stopped after {} tool iterations.)",
                    output, self.config.max_tool_iterations
                );
                let note = note.trim_start().to_string();
                new_messages.push(Message::assistant(note.clone()));
                return Ok(RunResult {
                    output: note,
                    new_messages,
                    tool_calls,
                });
            }
        }
    }
}

#[async_trait]
impl ChatBackend for Agent {
    async fn respond(&self, prompt: &str, history: &History) -> Result<RunResult> {
        let context = match self.config.history_window {
            Some(turns) => history.window(turns),
            None => history.messages().to_vec(),
        };
        self.run(prompt, &context).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::AgentError;
    use crate::llm::{ContentBlock, MessageResponse, RetryPolicy, ToolDefinition, ToolInputSchema, Usage};
    use crate::tools::{Tool, ToolInfo, ToolOutcome, ToolRegistry};
    use serde_json::{json, Value};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays canned responses and records what it was sent
    struct ScriptedProvider {
        responses: Mutex<VecDeque<Result<MessageResponse>>>,
        seen: Mutex<Vec<Vec<Message>>>,
    }

    impl ScriptedProvider {
        fn new(responses: Vec<Result<MessageResponse>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn seen(&self) -> Vec<Vec<Message>> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        async fn send_with_tools(
            &self,
            messages: Vec<Message>,
            _system: Option<&str>,
            _tools: Vec<ToolDefinition>,
        ) -> Result<MessageResponse> {
            self.seen.lock().unwrap().push(messages);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(anyhow::anyhow!("script exhausted")))
        }

        fn model(&self) -> String {
            "scripted".to_string()
        }

        fn provider_name(&self) -> &str {
            "scripted"
        }
    }

    fn response(content: Vec<ContentBlock>, stop: StopReason) -> Result<MessageResponse> {
        Ok(MessageResponse {
            id: "msg_test".to_string(),
            content,
            model: "scripted".to_string(),
            stop_reason: Some(stop),
            usage: Usage::default(),
        })
    }

    fn text(reply: &str) -> Result<MessageResponse> {
        response(vec![ContentBlock::text(reply)], StopReason::EndTurn)
    }

    fn tool_call(id: &str) -> Result<MessageResponse> {
        response(
            vec![ContentBlock::tool_use(id, "echo", json!({"word": "hi"}))],
            StopReason::ToolUse,
        )
    }

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "Echo a word"
        }

        fn definition(&self) -> ToolDefinition {
            ToolDefinition {
                name: "echo".to_string(),
                description: Some("Echo a word".to_string()),
                input_schema: ToolInputSchema::new(),
            }
        }

        fn get_info(&self, input: &Value) -> ToolInfo {
            ToolInfo {
                name: "echo".to_string(),
                action_description: format!("echo {}", input["word"]),
                details: None,
            }
        }

        async fn execute(&self, input: &Value) -> Result<ToolOutcome> {
            Ok(ToolOutcome::text(input["word"].as_str().unwrap_or_default()))
        }
    }

    fn echo_registry() -> Arc<ToolRegistry> {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool);
        Arc::new(registry)
    }

    #[tokio::test]
    async fn test_plain_reply() {
        let llm = ScriptedProvider::new(vec![text("Hello! How can I help?")]);
        let agent = Agent::new(llm.clone(), AgentConfig::new("Be nice"));

        let result = agent.run("hello!", &[]).await.unwrap();

        assert_eq!(result.output, "Hello! How can I help?");
        assert_eq!(result.new_messages.len(), 2);
        assert_eq!(result.new_messages[0], Message::user("hello!"));
        assert!(result.tool_calls.is_empty());
    }

    #[tokio::test]
    async fn test_tool_loop_feeds_results_back() {
        let llm = ScriptedProvider::new(vec![tool_call("toolu_1"), text("The tool said hi.")]);
        let agent = Agent::new(llm.clone(), AgentConfig::new("Use tools").with_tools(echo_registry()));

        let result = agent.run("say hi", &[]).await.unwrap();

        assert_eq!(result.output, "The tool said hi.");
        assert_eq!(result.new_messages.len(), 4);
        assert!(result.new_messages[2].is_tool_result());
        assert_eq!(result.tool_calls.len(), 1);
        assert_eq!(result.tool_calls[0].action, "echo \"hi\"");
        assert!(!result.tool_calls[0].is_error);

        let seen = llm.seen();
        assert_eq!(seen.len(), 2);
        match &seen[1][2].content {
            crate::llm::MessageContent::Blocks(blocks) => {
                assert_eq!(blocks[0], ContentBlock::tool_result("toolu_1", "hi", false));
            }
            other => panic!("unexpected content: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_max_tool_iterations_ends_with_assistant() {
        let llm = ScriptedProvider::new(vec![tool_call("toolu_1"), tool_call("toolu_2"), tool_call("toolu_3")]);
        let agent = Agent::new(
            llm.clone(),
            AgentConfig::new("Loop").with_tools(echo_registry()).with_max_tool_iterations(2),
        );

        let result = agent.run("loop forever", &[]).await.unwrap();

        assert_eq!(llm.seen().len(), 2);
        assert!(result.output.contains("Stopped after 2 tool iterations"));
        let last = result.new_messages.last().unwrap();
        assert_eq!(last.role, crate::llm::Role::Assistant);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limited_request_is_retried() {
        let rate_limited: anyhow::Error = AgentError::Api {
            status: 429,
            message: "rate_limit_error: slow down".into(),
        }
        .into();
        let llm = ScriptedProvider::new(vec![Err(rate_limited), text("Sorry for the wait")]);
        let agent = Agent::new(
            llm.clone(),
            AgentConfig::new("Retry").with_retry_policy(RetryPolicy::default().without_jitter()),
        );

        let result = agent.run("hi", &[]).await.unwrap();

        assert_eq!(result.output, "Sorry for the wait");
        assert_eq!(llm.seen().len(), 2);
    }

    #[tokio::test]
    async fn test_other_errors_propagate() {
        let llm = ScriptedProvider::new(vec![Err(anyhow::anyhow!("invalid x-api-key"))]);
        let agent = Agent::new(llm.clone(), AgentConfig::default());

        let err = agent.run("hi", &[]).await.unwrap_err();
        assert!(format!("{:#}", err).contains("invalid x-api-key"));
        assert_eq!(llm.seen().len(), 1);
    }

    #[tokio::test]
    async fn test_history_window_limits_context() {
        let llm = ScriptedProvider::new(vec![text("fourth answer")]);
        let agent = Agent::new(llm.clone(), AgentConfig::new("Chat").with_history_window(1));

        let mut history = History::new();
        for i in 0..3 {
            history.extend_turn(vec![Message::user(format!("q{i}")), Message::assistant(format!("a{i}"))]);
        }

        agent.respond("q3", &history).await.unwrap();

        let sent = &llm.seen()[0];
        let texts: Vec<String> = sent.iter().map(|m| m.text()).collect();
        assert_eq!(texts, vec!["q2", "a2", "q3"]);
    }
}
