//! Agent tool loop
//!
//! `Agent` sends a prompt with the conversation history, executes the tools
//! the model asks for and returns once the model answers in plain text.

mod agent_loop;
mod config;
mod executor;

pub use agent_loop::{Agent, ChatBackend, RunResult};
pub use config::{AgentConfig, DEFAULT_MAX_TOOL_ITERATIONS};
pub use executor::{ToolCallRecord, ToolExecutor};
