use anyhow::{Context, Result};
use reqwest::Client;

use super::provider::LlmProvider;
use super::types::{ApiError, Message, MessageRequest, MessageResponse, ToolDefinition};
use crate::config::AnthropicConfig;
use crate::core::AgentError;

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic Messages API provider
pub struct AnthropicProvider {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
}

impl AnthropicProvider {
    /// Create a provider from loaded configuration
    pub fn new(config: &AnthropicConfig) -> Self {
        tracing::info!("Using model: {}", config.model);
        tracing::info!("Max tokens: {}", config.max_tokens);

        Self {
            client: Client::new(),
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        }
    }

    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.base_url)
    }

    fn build_request(
        &self,
        messages: Vec<Message>,
        system: Option<&str>,
        tools: Vec<ToolDefinition>,
    ) -> MessageRequest {
        MessageRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            messages,
            system: system.map(str::to_string),
            tools: if tools.is_empty() { None } else { Some(tools) },
        }
    }
}

/// Turn a non-success body into a typed error, keeping the API's error type in the text
fn api_error(status: u16, body: &str) -> AgentError {
    let message = match serde_json::from_str::<ApiError>(body) {
        Ok(parsed) => format!("{}: {}", parsed.error.error_type, parsed.error.message),
        Err(_) => body.to_string(),
    };
    AgentError::Api { status, message }
}

#[async_trait::async_trait]
impl LlmProvider for AnthropicProvider {
    async fn send_with_tools(
        &self,
        messages: Vec<Message>,
        system: Option<&str>,
        tools: Vec<ToolDefinition>,
    ) -> Result<MessageResponse> {
        tracing::info!("Sending message to Anthropic API");
        tracing::debug!("Conversation length: {} messages", messages.len());
        tracing::debug!("Tools offered: {}", tools.len());

        let request = self.build_request(messages, system, tools);

        let response = self
            .client
            .post(self.messages_url())
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .context("Failed to send request to Anthropic API")?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .context("Failed to read Anthropic response body")?;

        tracing::debug!("Response status: {}", status);

        if !status.is_success() {
            tracing::error!("Anthropic API error: {} - {}", status, response_text);
            return Err(api_error(status.as_u16(), &response_text).into());
        }

        let parsed: MessageResponse = serde_json::from_str(&response_text)
            .context("Failed to parse Anthropic API response")?;

        tracing::info!("Received response from Anthropic API");
        tracing::debug!("Response ID: {}", parsed.id);
        tracing::debug!(
            "Usage: {} input / {} output tokens",
            parsed.usage.input_tokens,
            parsed.usage.output_tokens
        );

        Ok(parsed)
    }

    fn model(&self) -> String {
        self.model.clone()
    }

    fn provider_name(&self) -> &str {
        "anthropic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> AnthropicConfig {
        AnthropicConfig {
            api_key: "sk-ant-test".into(),
            model: "claude-3-5-sonnet-latest".into(),
            base_url: "https://api.anthropic.com/".into(),
            max_tokens: 4096,
        }
    }

    #[test]
    fn test_messages_url_strips_trailing_slash() {
        let provider = AnthropicProvider::new(&test_config());
        assert_eq!(provider.messages_url(), "https://api.anthropic.com/v1/messages");

        let mut config = test_config();
        config.base_url = "http://localhost:8080/".into();
        let provider = AnthropicProvider::new(&config);
        assert_eq!(provider.messages_url(), "http://localhost:8080/v1/messages");
    }

    #[test]
    fn test_request_omits_empty_tools() {
        let mut config = test_config();
        config.max_tokens = 100;
        let provider = AnthropicProvider::new(&config);
        let request = provider.build_request(vec![Message::user("Hello")], Some("Be brief"), vec![]);

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "claude-3-5-sonnet-latest");
        assert_eq!(json["max_tokens"], 100);
        assert_eq!(json["system"], "Be brief");
        assert!(json.get("tools").is_none());
    }

    #[test]
    fn test_api_error_parses_body() {
        let body = r#"{"type":"error","error":{"type":"rate_limit_error","message":"slow down"}}"#;
        let err = api_error(429, body);
        assert_eq!(err.to_string(), "API error (status 429): rate_limit_error: slow down");

        let err = api_error(502, "Bad Gateway");
        assert_eq!(err.to_string(), "API error (status 502): Bad Gateway");
    }
}
