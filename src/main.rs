use std::net::SocketAddr;

use clap::{Parser, Subcommand};
use mcp_agents::config;
use mcp_agents::logging;
use mcp_agents::profiles::{self, Profile};
use mcp_agents::shopify;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Chat with an assistant on the console
    Agent {
        #[arg(value_enum, default_value = "plain")]
        profile: Profile,
    },
    /// Browse Shopify customers from a numbered menu
    Menu,
    /// Serve the Shopify customer dashboard
    Dashboard {
        /// Address to listen on
        #[arg(long, default_value = "127.0.0.1:8050")]
        addr: SocketAddr,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging system; the guard flushes the log file on exit
    let _guard = logging::init_logging()?;
    config::load_dotenv();

    tracing::info!("=== mcp-agents starting ===");

    let result = match cli.command {
        Command::Agent { profile } => profiles::run(profile).await,
        Command::Menu => shopify::menu_command().await,
        Command::Dashboard { addr } => shopify::dashboard_command(addr).await,
    };

    if let Err(e) = &result {
        tracing::error!("Exiting with error: {:#}", e);
    }

    tracing::info!("=== mcp-agents shutting down ===");
    result
}
