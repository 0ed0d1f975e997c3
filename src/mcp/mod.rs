//! MCP (Model Context Protocol) support
//!
//! Tool servers run as child processes (or remote streamable-HTTP endpoints)
//! and their tools are offered to the model next to any native tools.
//!
//! - `ToolServerConfig`: how to start or reach one server
//! - `ToolServer`: one live rmcp client session
//! - `ToolServerSet`: the servers of a session, with scoped shutdown
//! - `MCPToolAdapter` / `MCPToolProvider`: bridge into the `ToolRegistry`
//!
//! Tools are namespaced with their server ID: `fetch` on server `fetch` is
//! offered to the model as `fetch__fetch`.

mod config;
mod manager;
mod outcome;
mod provider;
mod server;
mod tool_adapter;

pub use config::{
    ToolServerConfig, ToolServerSetConfig, ToolServerTransport, FETCH_SERVER_ID, GMAIL_PACKAGE,
    GMAIL_SERVER_ID, PLAYWRIGHT_SERVER_ID, RESEARCH_SERVER_ID, SHOPIFY_SERVER_ID,
};
pub use manager::ToolServerSet;
pub use outcome::outcome_from_result;
pub use provider::{registry_for, MCPToolProvider};
pub use server::ToolServer;
pub use tool_adapter::{MCPToolAdapter, NAMESPACE_SEPARATOR};
