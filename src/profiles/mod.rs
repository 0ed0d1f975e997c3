//! Agent profiles
//!
//! Each profile is one console assistant: a system prompt, a set of tool
//! servers and a few REPL tweaks on top of the shared agent and loop.

pub mod gmail;
pub mod realestate;

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::agent::{Agent, AgentConfig, ChatBackend};
use crate::cli::{Console, InputSource, Repl, ReplOptions, StdinInput};
use crate::config::{mask_secret, AppConfig};
use crate::conversation::History;
use crate::llm::{AnthropicProvider, LlmProvider};
use crate::mcp::{registry_for, ToolServerConfig, ToolServerSet, ToolServerSetConfig};

use self::gmail::{AuthServer, InstallStatus};
use self::realestate::ResearchPlanner;

/// Opening message of the profiles that have no capabilities text
const GREETING: &str = "hello!";

const CHAT_SYSTEM_PROMPT: &str = "You are a friendly and helpful AI assistant. \
Maintain a conversational tone while being informative and concise. \
If you don't know something, be honest about it.";

/// Turns of history the chat profile sends with each message
const CHAT_HISTORY_TURNS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Profile {
    /// Bare model, no tools
    Plain,
    /// Friendly chat over a short history window
    Chat,
    /// Web fetching
    Fetch,
    /// Gmail inbox management
    Gmail,
    /// Shopify store assistant
    Shopify,
    /// Property search with a visible browser
    #[value(name = "realestate")]
    RealEstate,
    /// Property search plus market research with a headless browser
    Research,
}

impl Profile {
    pub fn name(&self) -> &'static str {
        match self {
            Profile::Plain => "plain",
            Profile::Chat => "chat",
            Profile::Fetch => "fetch",
            Profile::Gmail => "gmail",
            Profile::Shopify => "shopify",
            Profile::RealEstate => "realestate",
            Profile::Research => "research",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Profile::Plain => "Claude Assistant",
            Profile::Chat => "Welcome to the Chat Agent!",
            Profile::Fetch => "Web Fetch Assistant",
            Profile::Gmail => "Gmail Assistant",
            Profile::Shopify => "Shopify Store Assistant",
            Profile::RealEstate => "Real Estate Property Search Assistant",
            Profile::Research => "Enhanced Real Estate Property Search & Research Assistant",
        }
    }

    /// Empty for profiles that run without one
    pub fn system_prompt(&self) -> &'static str {
        match self {
            Profile::Plain | Profile::Fetch | Profile::Shopify => "",
            Profile::Chat => CHAT_SYSTEM_PROMPT,
            Profile::Gmail => gmail::SYSTEM_PROMPT,
            Profile::RealEstate => realestate::SYSTEM_PROMPT,
            Profile::Research => realestate::RESEARCH_SYSTEM_PROMPT,
        }
    }

    pub fn uses_shopify(&self) -> bool {
        matches!(self, Profile::Shopify)
    }

    pub fn history_window(&self) -> Option<usize> {
        match self {
            Profile::Chat => Some(CHAT_HISTORY_TURNS),
            _ => None,
        }
    }

    /// Tool servers to start for this profile
    pub fn tool_servers(&self, config: &AppConfig) -> ToolServerSetConfig {
        let servers = ToolServerSetConfig::new();
        match self {
            Profile::Plain | Profile::Chat => servers,
            Profile::Fetch => servers.add_server(ToolServerConfig::fetch()),
            Profile::Gmail => servers
                .add_server(ToolServerConfig::fetch())
                .add_server(ToolServerConfig::gmail()),
            Profile::Shopify => {
                let servers = servers.add_server(ToolServerConfig::fetch());
                match &config.shopify {
                    Some(shopify) => servers.add_server(ToolServerConfig::shopify(shopify)),
                    None => servers,
                }
            }
            Profile::RealEstate => servers
                .add_server(ToolServerConfig::fetch())
                .add_server(ToolServerConfig::playwright(&config.playwright, false)),
            Profile::Research => {
                let servers = servers
                    .add_server(ToolServerConfig::fetch())
                    .add_server(ToolServerConfig::playwright(&config.playwright, true));
                match &config.research_sse_url {
                    Some(url) => servers.add_server(ToolServerConfig::research_gateway(url)),
                    None => {
                        tracing::warn!("[Profile] RESEARCH_SSE_URL is not set, research tools are unavailable");
                        servers
                    }
                }
            }
        }
    }

    pub fn repl_options(&self) -> ReplOptions {
        let options = ReplOptions::new(self.title());
        match self {
            Profile::Plain | Profile::Fetch | Profile::Shopify => options.with_initial_prompt(GREETING),
            Profile::Chat => options
                .with_intro(["Type 'exit' to end the conversation."])
                .with_tool_calls_shown(false),
            Profile::Gmail => gmail::repl_options(),
            Profile::RealEstate => options
                .with_initial_prompt(realestate::INITIAL_PROMPT)
                .with_error_followup(realestate::CLOSE_BROWSER_PROMPT)
                .with_farewell("Thank you for using the real estate browsing assistant!"),
            Profile::Research => options
                .with_initial_prompt(realestate::RESEARCH_INITIAL_PROMPT)
                .with_error_followup(realestate::CLOSE_BROWSER_PROMPT)
                .with_farewell("Thank you for using the real estate browsing and research assistant!"),
        }
    }

    /// One-off prompt sent before the conversation starts
    fn warm_up_prompt(&self) -> Option<String> {
        match self {
            Profile::RealEstate => Some(realestate::INSTALL_PROMPT.to_string()),
            Profile::Research => Some(realestate::browser_setup_prompt()),
            _ => None,
        }
    }
}

/// Load configuration, start the tool servers and run the profile on stdin
pub async fn run(profile: Profile) -> Result<()> {
    tracing::info!("[Profile] Starting profile {}", profile.name());

    let config = AppConfig::from_env(profile.uses_shopify())?;
    let console = Console::new();
    console.print_system(&format!("Starting {}...", profile.title()));

    if let Some(shopify) = &config.shopify {
        console.print_system(&format!("Using Shopify domain: {}", shopify.domain));
        console.print_system(&format!("Using API key: {}", mask_secret(&config.anthropic.api_key)));
    }
    if profile == Profile::Research && config.research_sse_url.is_none() {
        console.print_system("RESEARCH_SSE_URL is not set; continuing without the research tool.");
    }

    let mut auth_server = match profile {
        Profile::Gmail => Some(prepare_gmail(&console).await?),
        _ => None,
    };

    let servers = profile.tool_servers(&config);
    if !servers.is_empty() {
        console.print_system("Initializing MCP servers...");
    }

    let llm: Arc<dyn LlmProvider> = Arc::new(AnthropicProvider::new(&config.anthropic));
    let auth = auth_server.as_mut();

    let result = ToolServerSet::scoped(&servers, |set| async move {
        if !set.is_empty() {
            Console::new().print_system("MCP servers initialized");
        }
        let agent = build_agent(profile, llm, set).await?;
        let mut input = StdinInput::new();
        session(profile, Arc::new(agent), auth, &mut input).await
    })
    .await;

    if let Some(server) = auth_server.as_mut() {
        server.stop().await;
    }

    if let Err(e) = &result {
        tracing::error!("[Profile] {} ended with error: {:#}", profile.name(), e);
    }
    result
}

/// Install the Gmail package and start its auth server
async fn prepare_gmail(console: &Console) -> Result<AuthServer> {
    console.print_system("Installing Gmail MCP server...");
    match gmail::ensure_installed().await {
        Ok(InstallStatus::AlreadyInstalled) => console.print_system("Gmail MCP server is already installed"),
        Ok(InstallStatus::Installed) => console.print_system("Gmail MCP server installed successfully"),
        Err(e) => {
            console.print_error(&format!("{:#}", e));
            console.print_plain("Failed to install Gmail MCP server. Please try again.");
            return Err(e);
        }
    }

    console.print_system("Starting Gmail MCP server...");
    gmail::AuthServer::start().await.map_err(|e| {
        console.print_error(&format!("{:#}", e));
        console.print_plain("Failed to start Gmail server. Please try again.");
        e
    })
}

async fn build_agent(profile: Profile, llm: Arc<dyn LlmProvider>, servers: Arc<ToolServerSet>) -> Result<Agent> {
    let mut config = AgentConfig::new(profile.system_prompt());

    if !servers.is_empty() {
        let registry = registry_for(servers).await?;
        tracing::info!("[Profile] {} tools available: {:?}", registry.len(), registry.tool_names());
        config = config.with_tools(Arc::new(registry));
    }
    if let Some(turns) = profile.history_window() {
        config = config.with_history_window(turns);
    }

    Ok(Agent::new(llm, config))
}

/// Drive one profile's conversation against any backend
pub async fn session<I: InputSource>(
    profile: Profile,
    backend: Arc<dyn ChatBackend>,
    auth: Option<&mut AuthServer>,
    input: &mut I,
) -> Result<()> {
    if profile == Profile::Gmail {
        let server = auth.context("Gmail auth server is not running")?;
        return gmail::run_session(backend, server, input).await;
    }

    if let Some(prompt) = profile.warm_up_prompt() {
        warm_up(backend.as_ref(), &prompt).await;
    }

    let mut repl = Repl::new(backend, profile.repl_options());
    if profile == Profile::Research {
        repl = repl.with_planner(Arc::new(ResearchPlanner::new()?));
    }

    let reason = repl.run(input).await?;
    tracing::info!(
        "[Profile] {} session ended ({:?}, {} turns)",
        profile.name(),
        reason,
        repl.history().turn_count()
    );
    Ok(())
}

/// Send a setup prompt outside the conversation; failure is reported, not fatal
async fn warm_up(backend: &dyn ChatBackend, prompt: &str) {
    let console = Console::new();
    console.print_system("Installing browser components...");

    match backend.respond(prompt, &History::new()).await {
        Ok(result) => {
            tracing::info!("[Profile] Browser installation: {}", result.output);
            console.print_system("Browser setup complete");
        }
        Err(e) => {
            let message = format!("Browser installation failed: {:#}", e);
            tracing::error!("[Profile] {}", message);
            console.print_error(&message);
            console.print_plain("Continuing anyway, but browsing might not work correctly.");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::RunResult;
    use crate::cli::ScriptedInput;
    use crate::config::{AnthropicConfig, PlaywrightConfig, ShopifyConfig};
    use crate::llm::Message;
    use crate::mcp::{FETCH_SERVER_ID, PLAYWRIGHT_SERVER_ID, RESEARCH_SERVER_ID, SHOPIFY_SERVER_ID};
    use async_trait::async_trait;
    use std::sync::Mutex;

    fn app_config() -> AppConfig {
        AppConfig {
            anthropic: AnthropicConfig {
                api_key: "sk-ant-test".into(),
                model: "claude-3-5-sonnet-latest".into(),
                base_url: "https://api.anthropic.com".into(),
                max_tokens: 4096,
            },
            shopify: None,
            playwright: PlaywrightConfig {
                browsers_path: "0".into(),
            },
            research_sse_url: None,
        }
    }

    fn server_ids(config: &ToolServerSetConfig) -> Vec<String> {
        config.enabled().map(|s| s.id.clone()).collect()
    }

    #[derive(Default)]
    struct RecordingBackend {
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ChatBackend for RecordingBackend {
        async fn respond(&self, prompt: &str, _history: &History) -> Result<RunResult> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok(RunResult {
                output: "ok".to_string(),
                new_messages: vec![Message::user(prompt), Message::assistant("ok")],
                tool_calls: Vec::new(),
            })
        }
    }

    #[test]
    fn test_tool_servers_per_profile() {
        let config = app_config();
        assert!(Profile::Plain.tool_servers(&config).is_empty());
        assert!(Profile::Chat.tool_servers(&config).is_empty());
        assert_eq!(server_ids(&Profile::Fetch.tool_servers(&config)), vec![FETCH_SERVER_ID]);
        assert_eq!(
            server_ids(&Profile::RealEstate.tool_servers(&config)),
            vec![FETCH_SERVER_ID, PLAYWRIGHT_SERVER_ID]
        );
    }

    #[test]
    fn test_research_gateway_only_when_configured() {
        let mut config = app_config();
        assert!(!server_ids(&Profile::Research.tool_servers(&config)).contains(&RESEARCH_SERVER_ID.to_string()));

        config.research_sse_url = Some("https://example.com/sse".into());
        let servers = Profile::Research.tool_servers(&config);
        assert_eq!(
            server_ids(&servers),
            vec![FETCH_SERVER_ID, PLAYWRIGHT_SERVER_ID, RESEARCH_SERVER_ID]
        );
        assert!(servers.servers[1].describe().contains("--headless"));
    }

    #[test]
    fn test_shopify_server_gets_store_env() {
        let mut config = app_config();
        config.shopify = Some(ShopifyConfig {
            store_url: "https://acme".into(),
            access_token: "shpat_x".into(),
            api_version: "2024-01".into(),
            domain: "acme.myshopify.com".into(),
        });
        let servers = Profile::Shopify.tool_servers(&config);
        assert_eq!(server_ids(&servers), vec![FETCH_SERVER_ID, SHOPIFY_SERVER_ID]);
        assert!(Profile::Shopify.uses_shopify());
    }

    #[test]
    fn test_chat_profile_settings() {
        assert_eq!(Profile::Chat.history_window(), Some(5));
        assert!(Profile::Chat.system_prompt().starts_with("You are a friendly"));
        assert!(Profile::Chat.repl_options().initial_prompt.is_none());
        assert_eq!(Profile::Plain.system_prompt(), "");
        assert_eq!(Profile::Fetch.repl_options().initial_prompt.as_deref(), Some("hello!"));
    }

    #[tokio::test]
    async fn test_plain_session_greets_then_relays() {
        let backend = Arc::new(RecordingBackend::default());
        let mut input = ScriptedInput::new(["what's new?", "bye"]);

        session(Profile::Plain, backend.clone(), None, &mut input).await.unwrap();

        assert_eq!(*backend.prompts.lock().unwrap(), vec!["hello!", "what's new?"]);
    }

    #[tokio::test]
    async fn test_research_session_warms_up_and_plans() {
        let backend = Arc::new(RecordingBackend::default());
        let mut input = ScriptedInput::new(["Any market outlook report for pune?", "exit"]);

        session(Profile::Research, backend.clone(), None, &mut input).await.unwrap();

        let prompts = backend.prompts.lock().unwrap().clone();
        assert_eq!(prompts.len(), 3);
        assert!(prompts[0].contains("browser_install"));
        assert_eq!(prompts[1], realestate::RESEARCH_INITIAL_PROMPT);
        assert!(prompts[2].contains("claude_research"));
        assert!(prompts[2].contains("real estate trends in pune"));
    }

    #[tokio::test]
    async fn test_gmail_session_needs_auth_server() {
        let backend = Arc::new(RecordingBackend::default());
        let mut input = ScriptedInput::new(["exit"]);
        let err = session(Profile::Gmail, backend, None, &mut input).await.unwrap_err();
        assert!(err.to_string().contains("auth server"));
    }
}
