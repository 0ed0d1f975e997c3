//! Numbered console menu for browsing a store's customers

use anyhow::Result;

use super::admin::{CustomerSource, ShopifyAdmin};
use super::customers::Customer;
use crate::cli::{Console, InputSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Fetch,
    LoadMore,
    ListTools,
    ShopDetails,
    Exit,
    Invalid,
}

impl MenuChoice {
    /// `2` only loads more when there is a cursor; otherwise it lists tools
    pub fn parse(line: &str, has_cursor: bool) -> Self {
        match line.trim() {
            "1" => MenuChoice::Fetch,
            "2" if has_cursor => MenuChoice::LoadMore,
            "2" | "3" => MenuChoice::ListTools,
            "4" => MenuChoice::ShopDetails,
            "0" => MenuChoice::Exit,
            _ => MenuChoice::Invalid,
        }
    }
}

pub fn menu_options(has_cursor: bool) -> Vec<(&'static str, &'static str)> {
    let mut options = vec![("1", "Fetch and display customers")];
    if has_cursor {
        options.push(("2", "Load more customers"));
    }
    options.extend([
        ("3", "List available MCP tools"),
        ("4", "View shop details"),
        ("0", "Exit"),
    ]);
    options
}

/// ID, email and tags per customer
pub fn customer_rows(customers: &[Customer]) -> Vec<Vec<String>> {
    customers
        .iter()
        .map(|c| {
            vec![
                c.display_id(),
                c.email.clone().unwrap_or_default(),
                c.tags.clone().unwrap_or_default(),
            ]
        })
        .collect()
}

fn display_customers(console: &Console, customers: &[Customer]) {
    if customers.is_empty() {
        console.print_system("No customers found");
        return;
    }
    console.println();
    console.print_plain("Shopify Customers");
    console.print_table(&["ID", "Email", "Tags"], &customer_rows(customers));
    console.print_system(&format!("Loaded {} customers", customers.len()));
}

/// Fetch a page and print it; returns the cursor for the following page
async fn show_page(console: &Console, admin: &ShopifyAdmin, cursor: Option<&str>) -> Option<String> {
    console.print_system("Fetching customer data from Shopify...");
    match admin.fetch_customers(cursor).await {
        Ok(page) => {
            display_customers(console, &page.customers);
            page.next
        }
        Err(e) => {
            let message = format!("Error fetching customers: {:#}", e);
            tracing::error!("[ShopifyMenu] {}", message);
            console.print_error(&message);
            None
        }
    }
}

async fn list_tools(console: &Console, admin: &ShopifyAdmin) {
    console.print_system("Listing available MCP tools...");
    match admin.tool_names().await {
        Ok(names) if names.is_empty() => console.print_plain("  No tools available"),
        Ok(names) => {
            console.print_plain("Available tools:");
            for name in names {
                console.print_plain(&format!("  • {}", name));
            }
        }
        Err(e) => {
            tracing::error!("[ShopifyMenu] Error listing tools: {:#}", e);
            console.print_error(&format!("Error listing tools: {:#}", e));
        }
    }
}

async fn show_shop_details(console: &Console, admin: &ShopifyAdmin) {
    console.print_system("Fetching shop details...");
    match admin.shop_details().await {
        Ok(details) => {
            console.print_plain("Shop Details:");
            let pretty = serde_json::to_string_pretty(&details).unwrap_or_else(|_| details.to_string());
            console.print_plain(&pretty);
        }
        Err(e) => {
            tracing::error!("[ShopifyMenu] Error fetching shop details: {:#}", e);
            console.print_error(&format!("Error fetching shop details: {:#}", e));
        }
    }
}

/// Run the menu until `0` or end of input
///
/// Failed actions are reported and the menu is shown again.
pub async fn run_menu<I: InputSource>(admin: &ShopifyAdmin, input: &mut I) -> Result<()> {
    let console = Console::new();
    console.print_banner("Welcome to the Shopify MCP Command Line Interface", &[]);

    let mut cursor: Option<String> = None;

    loop {
        console.print_menu("Shopify MCP CLI", &menu_options(cursor.is_some()));
        console.print_plain("");
        console.print_plain("Enter choice:");

        let Some(line) = input.read_line().await? else {
            return Ok(());
        };

        match MenuChoice::parse(&line, cursor.is_some()) {
            MenuChoice::Fetch => cursor = show_page(&console, admin, None).await,
            MenuChoice::LoadMore => cursor = show_page(&console, admin, cursor.as_deref()).await,
            MenuChoice::ListTools => list_tools(&console, admin).await,
            MenuChoice::ShopDetails => show_shop_details(&console, admin).await,
            MenuChoice::Exit => {
                console.print_system("Exiting...");
                return Ok(());
            }
            MenuChoice::Invalid => console.print_error("Invalid choice. Please try again."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::ScriptedInput;
    use crate::mcp::ToolServer;
    use std::sync::Arc;

    #[test]
    fn test_choice_two_depends_on_cursor() {
        assert_eq!(MenuChoice::parse("2", true), MenuChoice::LoadMore);
        assert_eq!(MenuChoice::parse("2", false), MenuChoice::ListTools);
        assert_eq!(MenuChoice::parse(" 1 ", false), MenuChoice::Fetch);
        assert_eq!(MenuChoice::parse("0", false), MenuChoice::Exit);
        assert_eq!(MenuChoice::parse("9", true), MenuChoice::Invalid);
    }

    #[test]
    fn test_menu_options_hide_load_more_without_cursor() {
        let keys: Vec<&str> = menu_options(false).iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec!["1", "3", "4", "0"]);
        assert_eq!(menu_options(true).len(), 5);
    }

    #[test]
    fn test_customer_rows() {
        let customer = Customer {
            id: Some("gid://shopify/Customer/9".into()),
            email: None,
            tags: Some("vip".into()),
            ..Default::default()
        };
        assert_eq!(customer_rows(&[customer]), vec![vec!["9".to_string(), String::new(), "vip".to_string()]]);
    }

    #[tokio::test]
    async fn test_menu_survives_failures_until_exit() {
        let admin = ShopifyAdmin::new(Arc::new(ToolServer::closed_for_test("shopify")));
        let mut input = ScriptedInput::new(["1", "2", "4", "x", "0", "1"]);

        run_menu(&admin, &mut input).await.unwrap();

        assert_eq!(input.remaining(), 1);
    }
}
