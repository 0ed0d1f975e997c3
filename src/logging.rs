//! Logging setup
//!
//! Console output stays clean for the REPL, so tracing events go to a daily
//! rolling file. `RUST_LOG` overrides the default filter.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

pub const LOG_DIR_VAR: &str = "MCP_AGENTS_LOG_DIR";
const DEFAULT_LOG_DIR: &str = "logs";
const DEFAULT_FILTER: &str = "mcp_agents=info";
const LOG_FILE_PREFIX: &str = "mcp-agents.log";

/// Directory the log files are written to
pub fn log_dir() -> PathBuf {
    std::env::var(LOG_DIR_VAR)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_DIR))
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber. Keep the returned guard alive for the
/// lifetime of the process or buffered lines are lost on exit.
pub fn init_logging() -> Result<WorkerGuard> {
    let dir = log_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create log directory {:?}", dir))?;

    let appender = tracing_appender::rolling::daily(&dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(writer)
        .with_ansi(false)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install tracing subscriber: {}", e))?;

    tracing::info!("Logging to {:?}", dir);
    Ok(guard)
}
