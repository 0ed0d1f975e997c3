//! Tool server set
//!
//! Owns every tool server of a session and guarantees they are shut down
//! when the session ends, whichever way it ends.

use std::future::Future;
use std::sync::Arc;

use anyhow::Result;

use super::config::ToolServerSetConfig;
use super::server::ToolServer;

/// Servers started together for one session
#[derive(Debug, Default)]
pub struct ToolServerSet {
    servers: Vec<Arc<ToolServer>>,
}

impl ToolServerSet {
    /// A set with no servers (profiles that run without tools)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Start every enabled server in order
    ///
    /// If one fails, the servers already started are shut down before the
    /// error is returned.
    pub async fn start_all(config: &ToolServerSetConfig) -> Result<Self> {
        let mut set = Self::empty();

        for server_config in config.enabled() {
            if set.get(&server_config.id).is_some() {
                set.shutdown().await;
                return Err(anyhow::anyhow!("Tool server '{}' configured twice", server_config.id));
            }

            match ToolServer::start(server_config).await {
                Ok(server) => set.servers.push(Arc::new(server)),
                Err(e) => {
                    tracing::error!("[ToolServerSet] Failed to start '{}': {:#}", server_config.id, e);
                    set.shutdown().await;
                    return Err(e);
                }
            }
        }

        tracing::info!("[ToolServerSet] Started {} tool servers", set.len());
        Ok(set)
    }

    /// Add an already-started server
    pub fn insert(&mut self, server: ToolServer) -> Result<()> {
        if self.get(server.id()).is_some() {
            return Err(anyhow::anyhow!("Tool server '{}' already exists", server.id()));
        }
        self.servers.push(Arc::new(server));
        Ok(())
    }

    /// Get a server by ID
    pub fn get(&self, id: &str) -> Option<Arc<ToolServer>> {
        self.servers.iter().find(|s| s.id() == id).cloned()
    }

    /// All servers, in start order
    pub fn servers(&self) -> &[Arc<ToolServer>] {
        &self.servers
    }

    /// Get all server IDs
    pub fn server_ids(&self) -> Vec<&str> {
        self.servers.iter().map(|s| s.id()).collect()
    }

    pub fn len(&self) -> usize {
        self.servers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }

    /// Shut down every server concurrently
    pub async fn shutdown(&self) {
        if self.servers.is_empty() {
            return;
        }
        tracing::info!("[ToolServerSet] Shutting down {} tool servers", self.servers.len());
        futures::future::join_all(self.servers.iter().map(|s| s.shutdown())).await;
    }

    /// Start the servers, run `body`, then shut the servers down
    ///
    /// Shutdown happens on success and on error. The servers are not usable
    /// after this returns, even through handles `body` kept.
    pub async fn scoped<T, F, Fut>(config: &ToolServerSetConfig, body: F) -> Result<T>
    where
        F: FnOnce(Arc<ToolServerSet>) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let set = Arc::new(Self::start_all(config).await?);
        let result = body(set.clone()).await;
        set.shutdown().await;
        result
    }
}
