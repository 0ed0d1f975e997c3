//! Tool server configuration
//!
//! Describes how to reach one MCP tool server: a child process speaking MCP
//! over stdio, or a streamable-HTTP endpoint.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::{PlaywrightConfig, ShopifyConfig};

pub const FETCH_SERVER_ID: &str = "fetch";
pub const GMAIL_SERVER_ID: &str = "gmail";
pub const SHOPIFY_SERVER_ID: &str = "shopify";
pub const PLAYWRIGHT_SERVER_ID: &str = "playwright";
pub const RESEARCH_SERVER_ID: &str = "research";

pub const GMAIL_PACKAGE: &str = "@gongrzhe/server-gmail-autoauth-mcp";

/// How the client talks to the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToolServerTransport {
    /// Spawn `command args...` and speak MCP over its stdin/stdout
    Stdio {
        command: String,
        #[serde(default)]
        args: Vec<String>,
        #[serde(default)]
        env: BTreeMap<String, String>,
    },
    /// Connect to a streamable-HTTP MCP endpoint
    Http { uri: String },
}

/// Configuration for a single tool server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolServerConfig {
    /// Unique identifier, also used to namespace the server's tools
    pub id: String,

    pub transport: ToolServerTransport,

    /// Whether this server is started
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl ToolServerConfig {
    /// A child-process server with no arguments yet
    pub fn stdio(id: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            transport: ToolServerTransport::Stdio {
                command: command.into(),
                args: Vec::new(),
                env: BTreeMap::new(),
            },
            enabled: true,
        }
    }

    /// A streamable-HTTP server
    pub fn http(id: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            transport: ToolServerTransport::Http { uri: uri.into() },
            enabled: true,
        }
    }

    /// Append one argument (no-op for HTTP servers)
    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        if let ToolServerTransport::Stdio { args, .. } = &mut self.transport {
            args.push(arg.into());
        }
        self
    }

    /// Append several arguments (no-op for HTTP servers)
    pub fn with_args<I, S>(mut self, new_args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let ToolServerTransport::Stdio { args, .. } = &mut self.transport {
            args.extend(new_args.into_iter().map(Into::into));
        }
        self
    }

    /// Set an environment variable for the child (no-op for HTTP servers)
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        if let ToolServerTransport::Stdio { env, .. } = &mut self.transport {
            env.insert(key.into(), value.into());
        }
        self
    }

    /// Set whether this server is enabled
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Command line (or URI) for log messages; env values are not included
    pub fn describe(&self) -> String {
        match &self.transport {
            ToolServerTransport::Stdio { command, args, .. } => {
                if args.is_empty() {
                    command.clone()
                } else {
                    format!("{} {}", command, args.join(" "))
                }
            }
            ToolServerTransport::Http { uri } => uri.clone(),
        }
    }

    /// Web page fetching (`mcp_server_fetch`)
    pub fn fetch() -> Self {
        Self::stdio(FETCH_SERVER_ID, "python").with_args(["-m", "mcp_server_fetch"])
    }

    /// Gmail access with automatic OAuth
    pub fn gmail() -> Self {
        Self::stdio(GMAIL_SERVER_ID, "npx").with_arg(GMAIL_PACKAGE)
    }

    /// Shopify Admin API tools for one store
    pub fn shopify(config: &ShopifyConfig) -> Self {
        Self::stdio(SHOPIFY_SERVER_ID, "npx")
            .with_args(["-y", "shopify-mcp-server"])
            .with_env("SHOPIFY_ACCESS_TOKEN", &config.access_token)
            .with_env("MYSHOPIFY_DOMAIN", &config.domain)
            .with_env("SHOPIFY_API_VERSION", &config.api_version)
    }

    /// Browser automation, headed or headless
    pub fn playwright(config: &PlaywrightConfig, headless: bool) -> Self {
        let server = Self::stdio(PLAYWRIGHT_SERVER_ID, "npx")
            .with_arg("@playwright/mcp@latest")
            .with_env("PLAYWRIGHT_BROWSERS_PATH", &config.browsers_path);

        if headless {
            server.with_arg("--headless").with_env("PLAYWRIGHT_HEADLESS", "true")
        } else {
            server
        }
    }

    /// Remote SSE research server bridged to stdio through supergateway
    pub fn research_gateway(sse_url: impl Into<String>) -> Self {
        Self::stdio(RESEARCH_SERVER_ID, "npx").with_args([
            "-y".to_string(),
            "supergateway".to_string(),
            "--sse".to_string(),
            sse_url.into(),
        ])
    }
}

/// A set of tool servers started together
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolServerSetConfig {
    #[serde(default)]
    pub servers: Vec<ToolServerConfig>,
}

impl ToolServerSetConfig {
    /// Create an empty configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a server configuration
    pub fn add_server(mut self, server: ToolServerConfig) -> Self {
        self.servers.push(server);
        self
    }

    /// Servers that will actually be started
    pub fn enabled(&self) -> impl Iterator<Item = &ToolServerConfig> {
        self.servers.iter().filter(|s| s.enabled)
    }

    pub fn is_empty(&self) -> bool {
        self.enabled().next().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_command() {
        let config = ToolServerConfig::fetch();
        assert_eq!(config.id, "fetch");
        assert_eq!(config.describe(), "python -m mcp_server_fetch");
    }

    #[test]
    fn test_shopify_env() {
        let shopify = ShopifyConfig {
            store_url: "https://acme".into(),
            access_token: "shpat_123".into(),
            api_version: "2024-01".into(),
            domain: "acme.myshopify.com".into(),
        };
        let config = ToolServerConfig::shopify(&shopify);
        match &config.transport {
            ToolServerTransport::Stdio { command, args, env } => {
                assert_eq!(command, "npx");
                assert_eq!(args, &vec!["-y".to_string(), "shopify-mcp-server".to_string()]);
                assert_eq!(env["MYSHOPIFY_DOMAIN"], "acme.myshopify.com");
                assert_eq!(env["SHOPIFY_ACCESS_TOKEN"], "shpat_123");
                assert_eq!(env["SHOPIFY_API_VERSION"], "2024-01");
            }
            other => panic!("unexpected transport: {:?}", other),
        }
    }

    #[test]
    fn test_playwright_headless_flag() {
        let pw = PlaywrightConfig {
            browsers_path: "0".into(),
        };
        assert_eq!(
            ToolServerConfig::playwright(&pw, false).describe(),
            "npx @playwright/mcp@latest"
        );

        let headless = ToolServerConfig::playwright(&pw, true);
        assert_eq!(headless.describe(), "npx @playwright/mcp@latest --headless");
        match headless.transport {
            ToolServerTransport::Stdio { env, .. } => {
                assert_eq!(env["PLAYWRIGHT_HEADLESS"], "true");
                assert_eq!(env["PLAYWRIGHT_BROWSERS_PATH"], "0");
            }
            other => panic!("unexpected transport: {:?}", other),
        }
    }

    #[test]
    fn test_http_ignores_process_options() {
        let config = ToolServerConfig::http("remote", "http://localhost:8005/mcp")
            .with_arg("--ignored")
            .with_env("A", "B");
        assert_eq!(
            config.transport,
            ToolServerTransport::Http {
                uri: "http://localhost:8005/mcp".into()
            }
        );
    }

    #[test]
    fn test_set_config_from_json() {
        let json = r#"{
            "servers": [
                {"id": "fetch", "transport": {"type": "stdio", "command": "python", "args": ["-m", "mcp_server_fetch"]}},
                {"id": "remote", "transport": {"type": "http", "uri": "http://localhost:8005/mcp"}, "enabled": false}
            ]
        }"#;
        let config: ToolServerSetConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.servers.len(), 2);
        assert_eq!(config.servers[0], ToolServerConfig::fetch());
        assert_eq!(config.enabled().count(), 1);
    }
}
