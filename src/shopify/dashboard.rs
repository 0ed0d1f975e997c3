//! Local customer dashboard
//!
//! A small axum server: one HTML page that polls the JSON endpoints, plus
//! actions to reload the first page of customers or append the next one.
//! All handlers share one [`DashboardState`].

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;

use super::admin::CustomerSource;
use super::customers::Customer;

/// What the dashboard currently shows
#[derive(Debug, Clone, Default)]
struct DashboardData {
    customers: Vec<Customer>,
    cursor: Option<String>,
    loading: bool,
    last_error: Option<String>,
    updated_at: Option<DateTime<Utc>>,
}

/// Shared state behind every handler
pub struct DashboardState {
    source: Arc<dyn CustomerSource>,
    data: RwLock<DashboardData>,
}

/// Row shape served to the page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerRow {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub orders_count: String,
    pub total_spent: String,
}

impl From<&Customer> for CustomerRow {
    fn from(customer: &Customer) -> Self {
        Self {
            id: customer.display_id(),
            first_name: customer.first_name.clone().unwrap_or_default(),
            last_name: customer.last_name.clone().unwrap_or_default(),
            email: customer.email.clone().unwrap_or_default(),
            orders_count: customer.orders_count.clone().unwrap_or_else(|| "0".to_string()),
            total_spent: customer.total_spent_display(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CustomersResponse {
    pub customers: Vec<CustomerRow>,
    pub count: usize,
    pub has_more: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub status: String,
    pub loading: bool,
    pub count: usize,
    pub has_more: bool,
    pub last_error: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

/// Why a load was refused before it started
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadRejection {
    Busy,
    NoMorePages,
}

impl IntoResponse for LoadRejection {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            LoadRejection::Busy => (StatusCode::CONFLICT, "A load is already in progress"),
            LoadRejection::NoMorePages => (StatusCode::BAD_REQUEST, "No more customers to load"),
        };
        (status, Json(ErrorResponse { error: error.to_string() })).into_response()
    }
}

impl DashboardState {
    pub fn new(source: Arc<dyn CustomerSource>) -> Self {
        Self {
            source,
            data: RwLock::new(DashboardData::default()),
        }
    }

    pub async fn customers(&self) -> CustomersResponse {
        let data = self.data.read().await;
        CustomersResponse {
            customers: data.customers.iter().map(CustomerRow::from).collect(),
            count: data.customers.len(),
            has_more: data.cursor.is_some(),
        }
    }

    pub async fn status(&self) -> StatusResponse {
        let data = self.data.read().await;
        let status = if data.loading {
            "Fetching data...".to_string()
        } else if let Some(error) = &data.last_error {
            format!("Error fetching customers: {}", error)
        } else if data.updated_at.is_some() {
            format!("Loaded {} customers", data.customers.len())
        } else {
            "Ready".to_string()
        };

        StatusResponse {
            status,
            loading: data.loading,
            count: data.customers.len(),
            has_more: data.cursor.is_some(),
            last_error: data.last_error.clone(),
            updated_at: data.updated_at,
        }
    }

    /// Replace the list with the first page
    pub async fn refresh(self: &Arc<Self>) -> Result<StatusResponse, LoadRejection> {
        self.load(false).await
    }

    /// Append the page after the current cursor
    pub async fn load_more(self: &Arc<Self>) -> Result<StatusResponse, LoadRejection> {
        self.load(true).await
    }

    async fn load(self: &Arc<Self>, append: bool) -> Result<StatusResponse, LoadRejection> {
        // Claim the loading flag first so concurrent requests are turned away
        let cursor = {
            let mut data = self.data.write().await;
            if data.loading {
                return Err(LoadRejection::Busy);
            }
            let cursor = if append {
                Some(data.cursor.clone().ok_or(LoadRejection::NoMorePages)?)
            } else {
                None
            };
            data.loading = true;
            cursor
        };

        // The fetch runs as its own task so a dropped request cannot leave
        // the flag claimed
        let state = Arc::clone(self);
        let task = tokio::spawn(async move { state.fetch_page(cursor, append).await });
        if let Err(e) = task.await {
            tracing::error!("[Dashboard] Load task failed: {}", e);
            let mut data = self.data.write().await;
            data.loading = false;
            data.last_error = Some(e.to_string());
        }

        Ok(self.status().await)
    }

    async fn fetch_page(&self, cursor: Option<String>, append: bool) {
        let result = self.source.fetch_customers(cursor.as_deref()).await;

        let mut data = self.data.write().await;
        data.loading = false;
        match result {
            Ok(page) => {
                if append {
                    data.customers.extend(page.customers);
                } else {
                    data.customers = page.customers;
                }
                data.cursor = page.next;
                data.last_error = None;
                data.updated_at = Some(Utc::now());
            }
            Err(e) => {
                tracing::error!("[Dashboard] Error fetching customers: {:#}", e);
                data.last_error = Some(format!("{:#}", e));
            }
        }
    }
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <title>Shopify Customers</title>
  <style>
    body { font-family: Helvetica, Arial, sans-serif; margin: 24px; }
    table { border-collapse: collapse; width: 100%; }
    th, td { border-bottom: 1px solid #ddd; padding: 6px 10px; text-align: left; }
    #status { margin-top: 12px; color: #555; }
  </style>
</head>
<body>
  <h1>Shopify Customers</h1>
  <button onclick="post('/api/refresh')">Refresh Data</button>
  <button id="more" onclick="post('/api/more')" disabled>Load More</button>
  <table>
    <thead>
      <tr><th>ID</th><th>First Name</th><th>Last Name</th><th>Email</th><th>Orders Count</th><th>Total Spent</th></tr>
    </thead>
    <tbody id="rows"></tbody>
  </table>
  <div id="status">Ready</div>
  <script>
    async function load() {
      const [customers, status] = await Promise.all([
        fetch('/api/customers').then(r => r.json()),
        fetch('/api/status').then(r => r.json())
      ]);
      const rows = document.getElementById('rows');
      rows.innerHTML = '';
      for (const c of customers.customers) {
        const tr = document.createElement('tr');
        for (const value of [c.id, c.first_name, c.last_name, c.email, c.orders_count, c.total_spent]) {
          const td = document.createElement('td');
          td.textContent = value;
          tr.appendChild(td);
        }
        rows.appendChild(tr);
      }
      document.getElementById('more').disabled = !customers.has_more;
      document.getElementById('status').textContent = status.status;
    }
    async function post(path) {
      document.getElementById('status').textContent = 'Fetching data...';
      await fetch(path, { method: 'POST' });
      await load();
    }
    load();
    setInterval(load, 5000);
  </script>
</body>
</html>
"#;

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn get_customers(State(state): State<Arc<DashboardState>>) -> Json<CustomersResponse> {
    Json(state.customers().await)
}

async fn get_status(State(state): State<Arc<DashboardState>>) -> Json<StatusResponse> {
    Json(state.status().await)
}

async fn post_refresh(State(state): State<Arc<DashboardState>>) -> Result<Json<StatusResponse>, LoadRejection> {
    state.refresh().await.map(Json)
}

async fn post_more(State(state): State<Arc<DashboardState>>) -> Result<Json<StatusResponse>, LoadRejection> {
    state.load_more().await.map(Json)
}

pub fn router(state: Arc<DashboardState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/customers", get(get_customers))
        .route("/api/status", get(get_status))
        .route("/api/refresh", post(post_refresh))
        .route("/api/more", post(post_more))
        .with_state(state)
}

/// Load the first page, then serve until the process is stopped
pub async fn serve(state: Arc<DashboardState>, addr: SocketAddr) -> Result<()> {
    if state.refresh().await.is_ok() {
        tracing::info!("[Dashboard] Initial load: {}", state.status().await.status);
    }

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind dashboard to {}", addr))?;
    tracing::info!("[Dashboard] Listening on http://{}", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("Dashboard server failed")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shopify::customers::CustomerPage;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Hands out canned pages and records the cursors it was asked for
    struct PagedSource {
        pages: Mutex<VecDeque<anyhow::Result<CustomerPage>>>,
        cursors: Mutex<Vec<Option<String>>>,
    }

    impl PagedSource {
        fn new(pages: Vec<anyhow::Result<CustomerPage>>) -> Arc<Self> {
            Arc::new(Self {
                pages: Mutex::new(pages.into()),
                cursors: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl CustomerSource for PagedSource {
        async fn fetch_customers(&self, cursor: Option<&str>) -> anyhow::Result<CustomerPage> {
            self.cursors.lock().unwrap().push(cursor.map(str::to_string));
            self.pages
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(anyhow::anyhow!("no more pages")))
        }
    }

    fn customer(id: u32, email: &str) -> Customer {
        Customer {
            id: Some(id.to_string()),
            email: Some(email.to_string()),
            total_spent: Some("10".to_string()),
            ..Default::default()
        }
    }

    fn page(customers: Vec<Customer>, next: Option<&str>) -> anyhow::Result<CustomerPage> {
        Ok(CustomerPage {
            customers,
            next: next.map(str::to_string),
        })
    }

    #[tokio::test]
    async fn test_initial_status_is_ready() {
        let state = Arc::new(DashboardState::new(PagedSource::new(vec![])));
        let Json(status) = get_status(State(state.clone())).await;
        assert_eq!(status.status, "Ready");
        assert_eq!(status.count, 0);
        assert!(status.updated_at.is_none());
    }

    #[tokio::test]
    async fn test_refresh_then_more_appends() {
        let source = PagedSource::new(vec![
            page(vec![customer(1, "a@example.com"), customer(2, "b@example.com")], Some("c2")),
            page(vec![customer(3, "c@example.com")], None),
        ]);
        let state = Arc::new(DashboardState::new(source.clone()));

        let Json(status) = post_refresh(State(state.clone())).await.unwrap();
        assert_eq!(status.status, "Loaded 2 customers");
        assert!(status.has_more);

        let Json(status) = post_more(State(state.clone())).await.unwrap();
        assert_eq!(status.count, 3);
        assert!(!status.has_more);

        let Json(customers) = get_customers(State(state.clone())).await;
        let ids: Vec<&str> = customers.customers.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
        assert_eq!(customers.customers[0].total_spent, "$10.00");

        assert_eq!(*source.cursors.lock().unwrap(), vec![None, Some("c2".to_string())]);
    }

    #[tokio::test]
    async fn test_more_without_cursor_is_rejected() {
        let state = Arc::new(DashboardState::new(PagedSource::new(vec![])));
        let err = post_more(State(state)).await.unwrap_err();
        assert_eq!(err, LoadRejection::NoMorePages);
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_customers() {
        let source = PagedSource::new(vec![
            page(vec![customer(1, "a@example.com")], None),
            Err(anyhow::anyhow!("401 Unauthorized")),
        ]);
        let state = Arc::new(DashboardState::new(source));

        state.refresh().await.unwrap();
        let status = state.refresh().await.unwrap();

        assert_eq!(status.count, 1);
        assert!(!status.loading);
        assert_eq!(status.last_error.as_deref(), Some("401 Unauthorized"));
        assert!(status.status.starts_with("Error fetching customers"));
    }

    /// Answers after a delay, one customer per call
    struct SlowSource {
        delay: Duration,
    }

    #[async_trait]
    impl CustomerSource for SlowSource {
        async fn fetch_customers(&self, _cursor: Option<&str>) -> anyhow::Result<CustomerPage> {
            tokio::time::sleep(self.delay).await;
            page(vec![customer(1, "a@example.com")], None)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_refresh_still_clears_loading() {
        let source = Arc::new(SlowSource {
            delay: Duration::from_millis(200),
        });
        let state = Arc::new(DashboardState::new(source));

        let abandoned = tokio::time::timeout(Duration::from_millis(10), state.refresh()).await;
        assert!(abandoned.is_err());
        assert!(state.status().await.loading);

        tokio::time::sleep(Duration::from_millis(300)).await;
        let status = state.status().await;
        assert!(!status.loading);
        assert_eq!(status.count, 1);

        let status = state.refresh().await.unwrap();
        assert_eq!(status.status, "Loaded 1 customers");
    }

    #[tokio::test]
    async fn test_index_page_polls() {
        let Html(page) = index().await;
        assert!(page.contains("setInterval(load, 5000)"));
        assert!(page.contains("/api/customers"));
    }
}
