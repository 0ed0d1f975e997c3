//! Core types shared by every profile
//!
//! - `AgentError` / `AgentResult` - typed errors at library boundaries

pub mod error;

pub use error::{AgentError, AgentResult};
