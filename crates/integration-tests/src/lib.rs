//! Integration test support for Shopbot.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p shopbot-integration-tests
//! ```
//!
//! No database or network access is needed. The helpers here stand in for the
//! external collaborators:
//!
//! - [`MemoryCatalog`] - an in-memory `CatalogStore` with status and stock
//! - [`CannedCompletion`] - a `CompletionService` that replays canned replies
//! - [`CompletionStub`] - a local HTTP server speaking the chat-completions
//!   wire format, for exercising the real `OpenAiClient`

use std::collections::{HashSet, VecDeque};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{Value, json};
use url::Url;

use shopbot_core::{CategoryId, CurrencyCode, DiscountPercent, Price, ProductId, ProductStatus};
use shopbot_storefront::completion::{CompletionError, CompletionRequest, CompletionService};
use shopbot_storefront::db::{CatalogStore, RepositoryError};
use shopbot_storefront::models::{CatalogProduct, Category};

// =============================================================================
// Catalog
// =============================================================================

/// Build a catalog product with the given stock.
///
/// # Panics
///
/// Panics if `discount` is outside 0..=100.
#[must_use]
pub fn item(
    id: i32,
    category_id: i32,
    name: &str,
    brand: &str,
    price: i32,
    discount: i32,
    in_stock: i32,
) -> CatalogProduct {
    CatalogProduct {
        id: ProductId::new(id),
        category_id: CategoryId::new(category_id),
        name: name.to_string(),
        description: format!("{name}. Great value."),
        brand_name: brand.to_string(),
        price: Price::new(price),
        discount: DiscountPercent::new(discount).expect("discount in range"),
        currency: CurrencyCode::default(),
        in_stock,
        image_url: Some(format!("/img/{id}.jpg")),
    }
}

/// In-memory catalog.
///
/// Availability follows the real rule: active status and positive stock.
#[derive(Default)]
pub struct MemoryCatalog {
    categories: Vec<Category>,
    products: Vec<(CatalogProduct, ProductStatus)>,
    broken_categories: HashSet<String>,
    product_queries: AtomicUsize,
}

impl MemoryCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The demo catalog plus one inactive and one sold-out product.
    ///
    /// Electronics (1): 1 headphones, 3 earbuds, 4 mouse, 7 sold-out speaker.
    /// Clothing (2): 2 jacket, 5 socks. Books (3): 6 inactive novel.
    #[must_use]
    pub fn demo() -> Self {
        Self::new()
            .with_category(1, "Electronics")
            .with_category(2, "Clothing")
            .with_category(3, "Books")
            .with_product(item(1, 1, "Noise Cancelling Headphones", "Sony", 250, 10, 1))
            .with_product(item(2, 2, "Winter Puffer Jacket", "Nike", 180, 0, 1))
            .with_product(item(3, 1, "Wireless Noise Cancelling Earbuds", "Sony", 199, 15, 1))
            .with_product(item(4, 1, "Basic USB Mouse", "Apple", 15, 0, 1))
            .with_product(item(5, 2, "Merino Wool Hiking Socks", "Nike", 25, 5, 1))
            .with_inactive_product(item(6, 3, "Paperback Novel", "Apple", 12, 0, 4))
            .with_product(item(7, 1, "Bluetooth Speaker", "Sony", 90, 0, 0))
    }

    #[must_use]
    pub fn with_category(mut self, id: i32, name: &str) -> Self {
        self.categories.push(Category {
            id: CategoryId::new(id),
            name: name.to_string(),
        });
        self
    }

    #[must_use]
    pub fn with_product(mut self, product: CatalogProduct) -> Self {
        self.products.push((product, ProductStatus::Active));
        self
    }

    #[must_use]
    pub fn with_inactive_product(mut self, product: CatalogProduct) -> Self {
        self.products.push((product, ProductStatus::Inactive));
        self
    }

    /// Make lookups of `name` fail with a database error.
    #[must_use]
    pub fn with_broken_category(mut self, name: &str) -> Self {
        self.broken_categories.insert(name.to_string());
        self
    }

    /// Number of product fetches served.
    pub fn product_queries(&self) -> usize {
        self.product_queries.load(Ordering::SeqCst)
    }

    fn available(&self, category_id: CategoryId) -> impl Iterator<Item = &CatalogProduct> {
        self.products
            .iter()
            .filter(move |(p, status)| {
                p.category_id == category_id && status.is_available(p.in_stock)
            })
            .map(|(p, _)| p)
    }
}

impl CatalogStore for MemoryCatalog {
    async fn available_category_names(&self) -> Result<Vec<String>, RepositoryError> {
        let mut categories: Vec<&Category> = self
            .categories
            .iter()
            .filter(|c| self.available(c.id).next().is_some())
            .collect();
        categories.sort_by_key(|c| c.id);
        Ok(categories.into_iter().map(|c| c.name.clone()).collect())
    }

    async fn find_category_by_name(&self, name: &str) -> Result<Option<Category>, RepositoryError> {
        if self.broken_categories.contains(name) {
            return Err(RepositoryError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(self.categories.iter().find(|c| c.name == name).cloned())
    }

    async fn has_available_products(&self, category_id: CategoryId) -> Result<bool, RepositoryError> {
        Ok(self.available(category_id).next().is_some())
    }

    async fn available_products(
        &self,
        category_id: CategoryId,
        limit: usize,
    ) -> Result<Vec<CatalogProduct>, RepositoryError> {
        self.product_queries.fetch_add(1, Ordering::SeqCst);
        let mut products: Vec<CatalogProduct> = self.available(category_id).cloned().collect();
        products.sort_by_key(|p| p.id);
        products.truncate(limit);
        Ok(products)
    }
}

// =============================================================================
// Completion fakes
// =============================================================================

/// Completion service that replays canned replies in order.
///
/// Runs out of replies with `CompletionError::EmptyResponse`.
pub struct CannedCompletion {
    replies: Mutex<VecDeque<Result<String, CompletionError>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl CannedCompletion {
    pub fn new(replies: impl IntoIterator<Item = Result<String, CompletionError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Reply with these JSON values, serialized, in order.
    pub fn json(replies: impl IntoIterator<Item = Value>) -> Self {
        Self::new(replies.into_iter().map(|v| Ok(v.to_string())))
    }

    /// Requests received so far.
    ///
    /// # Panics
    ///
    /// Panics if the request log mutex is poisoned.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().expect("request log").clone()
    }
}

impl CompletionService for CannedCompletion {
    async fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError> {
        self.requests.lock().expect("request log").push(request);
        self.replies
            .lock()
            .expect("reply queue")
            .pop_front()
            .unwrap_or(Err(CompletionError::EmptyResponse))
    }
}

// =============================================================================
// HTTP stub
// =============================================================================

/// One canned HTTP reply from [`CompletionStub`].
#[derive(Clone)]
pub struct StubReply {
    status: StatusCode,
    headers: Vec<(&'static str, String)>,
    body: Value,
    delay: Option<Duration>,
}

impl StubReply {
    /// A successful completion whose first choice has `content`.
    #[must_use]
    pub fn content(content: &str) -> Self {
        Self::raw(
            StatusCode::OK,
            json!({
                "id": "chatcmpl-stub",
                "object": "chat.completion",
                "choices": [{
                    "index": 0,
                    "message": {"role": "assistant", "content": content},
                    "finish_reason": "stop"
                }],
                "usage": {"prompt_tokens": 42, "completion_tokens": 7, "total_tokens": 49}
            }),
        )
    }

    /// An arbitrary status and JSON body.
    #[must_use]
    pub fn raw(status: StatusCode, body: Value) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body,
            delay: None,
        }
    }

    #[must_use]
    pub fn with_header(mut self, name: &'static str, value: &str) -> Self {
        self.headers.push((name, value.to_string()));
        self
    }

    /// Wait before answering.
    #[must_use]
    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

/// A request received by [`CompletionStub`].
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub authorization: Option<String>,
    pub body: Value,
}

#[derive(Default)]
struct StubState {
    replies: Mutex<VecDeque<StubReply>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

/// Local chat-completions server on an ephemeral port.
pub struct CompletionStub {
    base_url: Url,
    state: Arc<StubState>,
}

impl CompletionStub {
    /// Start serving `replies` in order under `/v1/chat/completions`.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    pub async fn start(replies: impl IntoIterator<Item = StubReply>) -> Self {
        let state = Arc::new(StubState {
            replies: Mutex::new(replies.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/v1/chat/completions", post(handle))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind stub listener");
        let addr: SocketAddr = listener.local_addr().expect("stub address");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        let base_url = Url::parse(&format!("http://{addr}/v1/")).expect("stub url");
        Self { base_url, state }
    }

    /// Base URL to configure the client with (ends in `/v1/`).
    #[must_use]
    pub fn base_url(&self) -> Url {
        self.base_url.clone()
    }

    /// Requests received so far.
    ///
    /// # Panics
    ///
    /// Panics if the request log mutex is poisoned.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().expect("request log").clone()
    }
}

async fn handle(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state
        .requests
        .lock()
        .expect("request log")
        .push(RecordedRequest {
            authorization: headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned),
            body,
        });

    let reply = state.replies.lock().expect("reply queue").pop_front();
    let Some(reply) = reply else {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": {"message": "stub has no reply left", "type": "stub"}})),
        )
            .into_response();
    };

    if let Some(delay) = reply.delay {
        tokio::time::sleep(delay).await;
    }

    let mut response = (reply.status, Json(reply.body)).into_response();
    for (name, value) in reply.headers {
        if let Ok(value) = HeaderValue::from_str(&value) {
            response
                .headers_mut()
                .insert(HeaderName::from_static(name), value);
        }
    }
    response
}
