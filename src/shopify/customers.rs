//! Customer records returned by the Shopify tool server

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::tools::ToolOutcome;

/// One customer, tolerant of the REST and GraphQL field spellings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: Option<String>,
    #[serde(default, alias = "firstName", deserialize_with = "lenient_string")]
    pub first_name: Option<String>,
    #[serde(default, alias = "lastName", deserialize_with = "lenient_string")]
    pub last_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub tags: Option<String>,
    #[serde(default, alias = "ordersCount", deserialize_with = "lenient_string")]
    pub orders_count: Option<String>,
    #[serde(default, alias = "totalSpent", deserialize_with = "lenient_string")]
    pub total_spent: Option<String>,
}

/// Accept strings, numbers and string lists; anything else reads as absent
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        Some(Value::Array(items)) => Some(
            items
                .iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s.clone()),
                    Value::Null => None,
                    other => Some(other.to_string()),
                })
                .collect::<Vec<_>>()
                .join(", "),
        ),
        _ => None,
    })
}

impl Customer {
    /// Numeric part of the ID (`gid://shopify/Customer/42` shows as `42`)
    pub fn display_id(&self) -> String {
        self.id
            .as_deref()
            .and_then(|id| id.rsplit('/').next())
            .unwrap_or_default()
            .to_string()
    }

    /// Total spent as dollars with two decimals; raw text if it is not a number
    pub fn total_spent_display(&self) -> String {
        match self.total_spent.as_deref() {
            Some(raw) => match raw.trim().parse::<f64>() {
                Ok(amount) => format!("${:.2}", amount),
                Err(_) => raw.to_string(),
            },
            None => "$0.00".to_string(),
        }
    }
}

/// One page of `get-customers` results
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CustomerPage {
    pub customers: Vec<Customer>,
    /// Cursor for the following page
    pub next: Option<String>,
}

impl CustomerPage {
    /// Read a page from the tool's outcome
    ///
    /// The tool answers with `{"customers": [...], "next": "..."}`, either as
    /// structured content or as JSON text. A bare array is read as a single
    /// page with no cursor.
    pub fn parse(outcome: &ToolOutcome) -> Result<Self> {
        let value = match outcome {
            ToolOutcome::Error(message) => return Err(anyhow!("get-customers failed: {}", message)),
            ToolOutcome::Structured(value) => value.clone(),
            ToolOutcome::Text(text) => serde_json::from_str(text)
                .with_context(|| format!("Error parsing JSON: {}", text))?,
        };
        Self::from_value(value)
    }

    fn from_value(value: Value) -> Result<Self> {
        let (customers, next) = match value {
            Value::Array(items) => (Value::Array(items), None),
            Value::Object(mut map) => {
                let customers = map.remove("customers").unwrap_or(Value::Array(Vec::new()));
                let next = match map.remove("next") {
                    Some(Value::String(cursor)) if !cursor.is_empty() => Some(cursor),
                    _ => None,
                };
                (customers, next)
            }
            other => return Err(anyhow!("Unexpected customer payload: {}", other)),
        };

        let customers: Vec<Customer> =
            serde_json::from_value(customers).context("Customer list has an unexpected shape")?;
        Ok(Self { customers, next })
    }

    pub fn has_more(&self) -> bool {
        self.next.is_some()
    }
}
