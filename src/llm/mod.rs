pub mod anthropic;
pub mod provider;
pub mod retry;
pub mod types;

pub use anthropic::AnthropicProvider;
pub use provider::LlmProvider;
pub use retry::{is_rate_limit, is_rate_limit_text, RetryPolicy};
pub use types::{
    ApiError, ApiErrorDetails, ContentBlock, Message, MessageContent, MessageRequest,
    MessageResponse, Role, StopReason, ToolDefinition, ToolInputSchema, Usage,
};
