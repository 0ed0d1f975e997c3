//! Environment-driven configuration
//!
//! Every profile reads its credentials from the process environment (after
//! loading an optional `.env` file) and fails before doing any work when a
//! required variable is missing. All missing names are reported at once.

use crate::core::{AgentError, AgentResult};

pub const ANTHROPIC_API_KEY: &str = "ANTHROPIC_API_KEY";
pub const ANTHROPIC_MODEL: &str = "ANTHROPIC_MODEL";
pub const ANTHROPIC_BASE_URL: &str = "ANTHROPIC_BASE_URL";
pub const ANTHROPIC_MAX_TOKENS: &str = "ANTHROPIC_MAX_TOKENS";
pub const SHOPIFY_STORE_URL: &str = "SHOPIFY_STORE_URL";
pub const SHOPIFY_ACCESS_TOKEN: &str = "SHOPIFY_ACCESS_TOKEN";
pub const SHOPIFY_API_VERSION: &str = "SHOPIFY_API_VERSION";
pub const PLAYWRIGHT_BROWSERS_PATH: &str = "PLAYWRIGHT_BROWSERS_PATH";
pub const RESEARCH_SSE_URL: &str = "RESEARCH_SSE_URL";

pub const DEFAULT_MODEL: &str = "claude-3-5-sonnet-latest";
pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Load `.env` from the working directory (or a parent) if one exists
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => tracing::info!("Loaded environment from {:?}", path),
        Err(e) if e.not_found() => tracing::debug!("No .env file found"),
        Err(e) => tracing::warn!("Failed to load .env file: {}", e),
    }
}

/// Read a variable, treating empty values as absent
fn lookup_non_empty<F>(lookup: &F, name: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name).filter(|v| !v.trim().is_empty())
}

/// Fail with every missing name when any of `names` is unset or empty
pub fn require_vars<F>(lookup: &F, names: &[&str]) -> AgentResult<()>
where
    F: Fn(&str) -> Option<String>,
{
    let missing: Vec<String> = names
        .iter()
        .filter(|name| lookup_non_empty(lookup, name).is_none())
        .map(|name| name.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(AgentError::MissingConfig(missing))
    }
}

fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// Show only the first 8 characters of a credential
pub fn mask_secret(secret: &str) -> String {
    let prefix: String = secret.chars().take(8).collect();
    format!("{}...", prefix)
}

/// Model API settings
#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub max_tokens: u32,
}

impl AnthropicConfig {
    /// Load from the process environment
    pub fn from_env() -> AgentResult<Self> {
        Self::from_lookup(&env_lookup)
    }

    /// Load using an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: &F) -> AgentResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        require_vars(lookup, &[ANTHROPIC_API_KEY])?;

        let max_tokens = match lookup_non_empty(lookup, ANTHROPIC_MAX_TOKENS) {
            Some(raw) => match raw.trim().parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(AgentError::InvalidConfig(format!(
                        "{} must be a positive integer, got '{}'",
                        ANTHROPIC_MAX_TOKENS, raw
                    )))
                }
            },
            None => DEFAULT_MAX_TOKENS,
        };

        Ok(Self {
            api_key: lookup_non_empty(lookup, ANTHROPIC_API_KEY).unwrap_or_default(),
            model: lookup_non_empty(lookup, ANTHROPIC_MODEL).unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: lookup_non_empty(lookup, ANTHROPIC_BASE_URL)
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            max_tokens,
        })
    }
}

/// Shopify store credentials
#[derive(Debug, Clone)]
pub struct ShopifyConfig {
    pub store_url: String,
    pub access_token: String,
    pub api_version: String,
    /// `<shop>.myshopify.com`, derived from `store_url`
    pub domain: String,
}

impl ShopifyConfig {
    /// Load from the process environment
    pub fn from_env() -> AgentResult<Self> {
        Self::from_lookup(&env_lookup)
    }

    /// Load using an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: &F) -> AgentResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        require_vars(lookup, &[SHOPIFY_STORE_URL, SHOPIFY_ACCESS_TOKEN, SHOPIFY_API_VERSION])?;

        let store_url = lookup_non_empty(lookup, SHOPIFY_STORE_URL).unwrap_or_default();
        Ok(Self {
            domain: normalize_shop_domain(&store_url),
            store_url,
            access_token: lookup_non_empty(lookup, SHOPIFY_ACCESS_TOKEN).unwrap_or_default(),
            api_version: lookup_non_empty(lookup, SHOPIFY_API_VERSION).unwrap_or_default(),
        })
    }
}

/// Strip the scheme and make sure the host ends in `myshopify.com`
pub fn normalize_shop_domain(store_url: &str) -> String {
    let domain = store_url
        .trim()
        .replace("https://", "")
        .replace("http://", "");
    let domain = domain.trim_end_matches('/');

    if domain.ends_with("myshopify.com") {
        domain.to_string()
    } else {
        format!("{}.myshopify.com", domain)
    }
}

/// Browser automation settings for the Playwright tool server
#[derive(Debug, Clone)]
pub struct PlaywrightConfig {
    pub browsers_path: String,
}

impl PlaywrightConfig {
    /// Load from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(&env_lookup)
    }

    /// Load using an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: &F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            browsers_path: lookup_non_empty(lookup, PLAYWRIGHT_BROWSERS_PATH).unwrap_or_else(|| "0".to_string()),
        }
    }
}

/// Settings for one agent session
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub anthropic: AnthropicConfig,
    /// Present only when the session talks to a store
    pub shopify: Option<ShopifyConfig>,
    pub playwright: PlaywrightConfig,
    /// SSE endpoint of the market-research tool server
    pub research_sse_url: Option<String>,
}

impl AppConfig {
    /// Load from the process environment
    pub fn from_env(with_shopify: bool) -> AgentResult<Self> {
        Self::from_lookup(&env_lookup, with_shopify)
    }

    /// Load using an arbitrary variable lookup
    ///
    /// Every required variable is checked before anything is parsed, so one
    /// error names all that are missing.
    pub fn from_lookup<F>(lookup: &F, with_shopify: bool) -> AgentResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut required = vec![ANTHROPIC_API_KEY];
        if with_shopify {
            required.extend([SHOPIFY_STORE_URL, SHOPIFY_ACCESS_TOKEN, SHOPIFY_API_VERSION]);
        }
        require_vars(lookup, &required)?;

        Ok(Self {
            anthropic: AnthropicConfig::from_lookup(lookup)?,
            shopify: if with_shopify {
                Some(ShopifyConfig::from_lookup(lookup)?)
            } else {
                None
            },
            playwright: PlaywrightConfig::from_lookup(lookup),
            research_sse_url: lookup_non_empty(lookup, RESEARCH_SSE_URL),
        })
    }
}
