//! Tool system
//!
//! - `Tool` trait: interface the agent loop executes against
//! - `ToolOutcome`: classified result of a tool call
//! - `ToolRegistry`: the set of tools offered to the model
//! - `ToolProvider` trait: dynamic tool sources (MCP tool servers)

mod provider;
mod registry;
mod tool;

pub use provider::ToolProvider;
pub use registry::ToolRegistry;
pub use tool::{Tool, ToolInfo, ToolOutcome};
