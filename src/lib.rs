pub mod config;
pub mod core;
pub mod conversation;
pub mod tools;

// Model access
pub mod llm;
pub mod logging;

// Terminal front end
pub mod cli;

// Standardized agent implementation
pub mod agent;

// MCP (Model Context Protocol) support
pub mod mcp;

// Console assistants built on the pieces above
pub mod profiles;

// Shopify store tooling without a model
pub mod shopify;
