//! Direct calls to the Shopify tool server, without a model in between

use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::{json, Map, Value};

use super::customers::CustomerPage;
use crate::config::ShopifyConfig;
use crate::mcp::{ToolServer, ToolServerConfig};
use crate::tools::ToolOutcome;

pub const GET_CUSTOMERS: &str = "get-customers";
pub const GET_SHOP_DETAILS: &str = "get-shop-details";

/// Customers requested per page
pub const PAGE_SIZE: u32 = 50;

/// Anything that can page through customers
#[async_trait]
pub trait CustomerSource: Send + Sync {
    async fn fetch_customers(&self, cursor: Option<&str>) -> Result<CustomerPage>;
}

/// Arguments for `get-customers`
pub fn customer_params(cursor: Option<&str>) -> Map<String, Value> {
    let mut params = Map::new();
    params.insert("limit".to_string(), json!(PAGE_SIZE));
    if let Some(cursor) = cursor {
        params.insert("next".to_string(), json!(cursor));
    }
    params
}

/// Store administration over one Shopify tool server
#[derive(Debug)]
pub struct ShopifyAdmin {
    server: Arc<ToolServer>,
}

impl ShopifyAdmin {
    /// Start a Shopify tool server for the configured store
    pub async fn start(config: &ShopifyConfig) -> Result<Self> {
        tracing::info!("[Shopify] Connecting to {} (API {})", config.domain, config.api_version);
        let server = ToolServer::start(&ToolServerConfig::shopify(config)).await?;
        Ok(Self::new(Arc::new(server)))
    }

    pub fn new(server: Arc<ToolServer>) -> Self {
        Self { server }
    }

    /// Names of the tools the server offers
    pub async fn tool_names(&self) -> Result<Vec<String>> {
        let tools = self.server.list_tools().await?;
        Ok(tools.into_iter().map(|t| t.name.to_string()).collect())
    }

    /// Store details as JSON; non-JSON text is returned as a string value
    pub async fn shop_details(&self) -> Result<Value> {
        match self.server.call_tool(GET_SHOP_DETAILS, Some(Map::new())).await? {
            ToolOutcome::Structured(value) => Ok(value),
            ToolOutcome::Text(text) => Ok(serde_json::from_str(&text).unwrap_or(Value::String(text))),
            ToolOutcome::Error(message) => Err(anyhow!("{} failed: {}", GET_SHOP_DETAILS, message)),
        }
    }

    pub async fn shutdown(&self) {
        self.server.shutdown().await;
    }
}

#[async_trait]
impl CustomerSource for ShopifyAdmin {
    async fn fetch_customers(&self, cursor: Option<&str>) -> Result<CustomerPage> {
        let outcome = self
            .server
            .call_tool(GET_CUSTOMERS, Some(customer_params(cursor)))
            .await?;
        let page = CustomerPage::parse(&outcome)?;

        tracing::info!(
            "[Shopify] Found {} customers (next cursor: {})",
            page.customers.len(),
            page.next.as_deref().unwrap_or("none")
        );
        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::AgentError;

    #[test]
    fn test_customer_params() {
        let first = customer_params(None);
        assert_eq!(Value::Object(first), json!({"limit": 50}));

        let next = customer_params(Some("abc"));
        assert_eq!(Value::Object(next), json!({"limit": 50, "next": "abc"}));
    }

    #[tokio::test]
    async fn test_closed_server_surfaces_errors() {
        let admin = ShopifyAdmin::new(Arc::new(ToolServer::closed_for_test("shopify")));

        let err = admin.fetch_customers(None).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AgentError>(),
            Some(AgentError::ToolServerClosed(_))
        ));
        assert!(admin.shop_details().await.is_err());
        assert!(admin.tool_names().await.is_err());
    }
}
