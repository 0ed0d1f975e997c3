//! Shopify store tooling that talks to the tool server directly
//!
//! - `menu`: numbered console menu over customers, tools and shop details
//! - `dashboard`: local web page with the customer list

pub mod admin;
pub mod customers;
pub mod dashboard;
pub mod menu;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;

pub use admin::{customer_params, CustomerSource, ShopifyAdmin, GET_CUSTOMERS, GET_SHOP_DETAILS, PAGE_SIZE};
pub use customers::{Customer, CustomerPage};
pub use dashboard::{router, DashboardState};
pub use menu::{run_menu, MenuChoice};

use crate::cli::{Console, StdinInput};
use crate::config::ShopifyConfig;

async fn connect(console: &Console) -> Result<ShopifyAdmin> {
    let config = ShopifyConfig::from_env()?;
    console.print_system(&format!("Using Shopify domain: {}", config.domain));
    console.print_system(&format!("Using Shopify API version: {}", config.api_version));
    ShopifyAdmin::start(&config).await
}

/// The `menu` subcommand
pub async fn menu_command() -> Result<()> {
    let console = Console::new();
    let admin = connect(&console).await?;
    let result = run_menu(&admin, &mut StdinInput::new()).await;
    admin.shutdown().await;
    result
}

/// The `dashboard` subcommand
pub async fn dashboard_command(addr: SocketAddr) -> Result<()> {
    let console = Console::new();
    let admin = Arc::new(connect(&console).await?);
    console.print_system(&format!("Dashboard at http://{} (Ctrl-C to stop)", addr));

    let state = Arc::new(DashboardState::new(admin.clone()));
    let result = dashboard::serve(state, addr).await;
    admin.shutdown().await;
    result
}
