//! In-memory collaborators for assistant unit tests.

use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use shopbot_core::{CategoryId, CurrencyCode, DiscountPercent, Price, ProductId};

use crate::completion::{CompletionError, CompletionRequest, CompletionService};
use crate::db::{CatalogStore, RepositoryError};
use crate::models::{CatalogProduct, Category};

/// Build an available product.
pub fn product(
    id: i32,
    category_id: i32,
    name: &str,
    brand: &str,
    price: i32,
    discount: i32,
) -> CatalogProduct {
    CatalogProduct {
        id: ProductId::new(id),
        category_id: CategoryId::new(category_id),
        name: name.to_string(),
        description: format!("{name} description"),
        brand_name: brand.to_string(),
        price: Price::new(price),
        discount: DiscountPercent::new(discount).expect("valid discount"),
        currency: CurrencyCode::default(),
        in_stock: 1,
        image_url: Some(format!("/img/{id}.jpg")),
    }
}

/// Catalog held in memory. Every product it holds counts as available.
pub struct FakeCatalog {
    categories: Vec<Category>,
    products: Vec<CatalogProduct>,
    failing_lookups: HashSet<String>,
    failing_fetches: HashSet<CategoryId>,
    fail_category_list: bool,
    category_list_loads: AtomicUsize,
    fetches: Mutex<Vec<(CategoryId, usize)>>,
}

impl FakeCatalog {
    pub fn new(categories: &[(i32, &str)], products: Vec<CatalogProduct>) -> Self {
        Self {
            categories: categories
                .iter()
                .map(|(id, name)| Category {
                    id: CategoryId::new(*id),
                    name: (*name).to_string(),
                })
                .collect(),
            products,
            failing_lookups: HashSet::new(),
            failing_fetches: HashSet::new(),
            fail_category_list: false,
            category_list_loads: AtomicUsize::new(0),
            fetches: Mutex::new(Vec::new()),
        }
    }

    /// Electronics (3 products), Clothing (2 products), Books (none).
    pub fn demo() -> Self {
        Self::new(
            &[(1, "Electronics"), (2, "Clothing"), (3, "Books")],
            vec![
                product(1, 1, "Noise Cancelling Headphones", "Sony", 250, 10),
                product(2, 2, "Winter Puffer Jacket", "Nike", 180, 0),
                product(3, 1, "Wireless Noise Cancelling Earbuds", "Sony", 199, 15),
                product(4, 1, "Basic USB Mouse", "Apple", 15, 0),
                product(5, 2, "Merino Wool Hiking Socks", "Nike", 25, 5),
            ],
        )
    }

    pub fn failing_lookup(mut self, name: &str) -> Self {
        self.failing_lookups.insert(name.to_string());
        self
    }

    pub fn failing_fetch(mut self, category_id: i32) -> Self {
        self.failing_fetches.insert(CategoryId::new(category_id));
        self
    }

    pub fn failing_category_list(mut self) -> Self {
        self.fail_category_list = true;
        self
    }

    pub fn category_list_loads(&self) -> usize {
        self.category_list_loads.load(Ordering::SeqCst)
    }

    /// `(category, limit)` of every product fetch, in call order.
    pub fn fetches(&self) -> Vec<(CategoryId, usize)> {
        self.fetches.lock().expect("fetch log").clone()
    }

    fn has_products(&self, category_id: CategoryId) -> bool {
        self.products.iter().any(|p| p.category_id == category_id)
    }
}

fn unavailable() -> RepositoryError {
    RepositoryError::Database(sqlx::Error::PoolTimedOut)
}

impl CatalogStore for FakeCatalog {
    async fn available_category_names(&self) -> Result<Vec<String>, RepositoryError> {
        self.category_list_loads.fetch_add(1, Ordering::SeqCst);
        if self.fail_category_list {
            return Err(unavailable());
        }
        Ok(self
            .categories
            .iter()
            .filter(|c| self.has_products(c.id))
            .map(|c| c.name.clone())
            .collect())
    }

    async fn find_category_by_name(&self, name: &str) -> Result<Option<Category>, RepositoryError> {
        if self.failing_lookups.contains(name) {
            return Err(unavailable());
        }
        Ok(self.categories.iter().find(|c| c.name == name).cloned())
    }

    async fn has_available_products(&self, category_id: CategoryId) -> Result<bool, RepositoryError> {
        Ok(self.has_products(category_id))
    }

    async fn available_products(
        &self,
        category_id: CategoryId,
        limit: usize,
    ) -> Result<Vec<CatalogProduct>, RepositoryError> {
        self.fetches
            .lock()
            .expect("fetch log")
            .push((category_id, limit));
        if self.failing_fetches.contains(&category_id) {
            return Err(unavailable());
        }
        let mut products: Vec<_> = self
            .products
            .iter()
            .filter(|p| p.category_id == category_id)
            .cloned()
            .collect();
        products.sort_by_key(|p| p.id);
        products.truncate(limit);
        Ok(products)
    }
}

/// Completion service that replays canned replies and records requests.
pub struct ScriptedCompletion {
    replies: Mutex<VecDeque<Result<String, CompletionError>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedCompletion {
    pub fn new(replies: impl IntoIterator<Item = Result<String, CompletionError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn replying(replies: &[&str]) -> Self {
        Self::new(replies.iter().map(|r| Ok((*r).to_string())))
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().expect("request log").clone()
    }
}

impl CompletionService for ScriptedCompletion {
    async fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError> {
        self.requests.lock().expect("request log").push(request);
        self.replies
            .lock()
            .expect("reply queue")
            .pop_front()
            .unwrap_or(Err(CompletionError::EmptyResponse))
    }
}
