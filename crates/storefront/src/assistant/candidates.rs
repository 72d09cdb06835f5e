//! Category verification and candidate sampling.
//!
//! Second pipeline stage. Classified names are checked against the catalog,
//! then up to [`MAX_CANDIDATES`] available products are drawn from the
//! verified categories, spread evenly across them. Store errors are contained
//! per category: the category is skipped and the failure recorded.

use std::collections::HashSet;
use std::fmt;

use tracing::{debug, instrument, warn};

use shopbot_core::ProductId;

use crate::db::{CatalogStore, RepositoryError};
use crate::models::{CatalogProduct, Category};

use super::NO_PRODUCTS_CONTEXT;

/// Upper bound on candidates sent to the recommender.
pub const MAX_CANDIDATES: usize = 10;

/// Candidates to aim for when few categories are verified.
pub const TARGET_MIN_CANDIDATES: usize = 5;

/// Products to fetch per verified category.
///
/// `ceil(5 / k)` for up to five categories, one each beyond that, zero when
/// nothing was verified.
#[must_use]
pub const fn per_category_limit(verified: usize) -> usize {
    match verified {
        0 => 0,
        k if k > TARGET_MIN_CANDIDATES => 1,
        k => TARGET_MIN_CANDIDATES.div_ceil(k),
    }
}

/// Whether the recommender gets targeted candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssistantMode {
    /// At least one candidate product.
    Targeted,
    /// No candidates; the reply is general help.
    General,
}

impl fmt::Display for AssistantMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Targeted => write!(f, "targeted"),
            Self::General => write!(f, "general"),
        }
    }
}

/// Catalog operation that failed for a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupStage {
    /// Finding the category or checking availability.
    Verify,
    /// Fetching its products.
    Fetch,
}

/// A category skipped because the store failed.
#[derive(Debug)]
pub struct CategoryFailure {
    pub category: String,
    pub stage: LookupStage,
    pub error: RepositoryError,
}

/// Products gathered for the recommender, unique by ID, in fetch order.
#[derive(Debug, Default)]
pub struct CandidateSet {
    products: Vec<CatalogProduct>,
    failures: Vec<CategoryFailure>,
}

impl CandidateSet {
    /// Build a set from products, dropping repeated IDs.
    #[must_use]
    pub fn from_products(products: impl IntoIterator<Item = CatalogProduct>) -> Self {
        let mut set = Self::default();
        set.extend(products);
        set
    }

    fn extend(&mut self, products: impl IntoIterator<Item = CatalogProduct>) {
        let mut seen: HashSet<ProductId> = self.products.iter().map(|p| p.id).collect();
        for product in products {
            if seen.insert(product.id) {
                self.products.push(product);
            }
        }
    }

    #[must_use]
    pub fn mode(&self) -> AssistantMode {
        if self.products.is_empty() {
            AssistantMode::General
        } else {
            AssistantMode::Targeted
        }
    }

    #[must_use]
    pub fn products(&self) -> &[CatalogProduct] {
        &self.products
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Look up a candidate by ID.
    #[must_use]
    pub fn get(&self, id: ProductId) -> Option<&CatalogProduct> {
        self.products.iter().find(|p| p.id == id)
    }

    /// Categories skipped because of store errors.
    #[must_use]
    pub fn failures(&self) -> &[CategoryFailure] {
        &self.failures
    }

    /// True if some category was skipped because of a store error.
    #[must_use]
    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }

    pub(crate) fn record_failures(&mut self, failures: impl IntoIterator<Item = CategoryFailure>) {
        self.failures.extend(failures);
    }

    /// Product context for the recommender: one summary line per candidate,
    /// or the no-products sentinel.
    #[must_use]
    pub fn context_block(&self) -> String {
        if self.products.is_empty() {
            return NO_PRODUCTS_CONTEXT.to_string();
        }
        self.products
            .iter()
            .map(CatalogProduct::summary_line)
            .collect::<Vec<_>>()
            .join(";\n")
    }
}

/// Keep the names that exist in the catalog and have an available product.
///
/// Order and duplicates are preserved. Unknown or empty categories are dropped
/// quietly; store errors drop the category and are returned as failures.
#[instrument(skip_all, fields(names = names.len()))]
pub async fn verify_categories<S: CatalogStore>(
    store: &S,
    names: &[String],
) -> (Vec<Category>, Vec<CategoryFailure>) {
    let mut verified = Vec::with_capacity(names.len());
    let mut failures = Vec::new();

    for name in names {
        match verify_one(store, name).await {
            Ok(Some(category)) => verified.push(category),
            Ok(None) => debug!(category = %name, "Category dropped: unknown or no available products"),
            Err(error) => {
                warn!(category = %name, error = %error, "Category verification failed, skipping");
                failures.push(CategoryFailure {
                    category: name.clone(),
                    stage: LookupStage::Verify,
                    error,
                });
            }
        }
    }

    (verified, failures)
}

async fn verify_one<S: CatalogStore>(
    store: &S,
    name: &str,
) -> Result<Option<Category>, RepositoryError> {
    let Some(category) = store.find_category_by_name(name).await? else {
        return Ok(None);
    };
    if store.has_available_products(category.id).await? {
        Ok(Some(category))
    } else {
        Ok(None)
    }
}

/// Sample available products from the verified categories.
///
/// Categories are visited in order; each contributes at most
/// [`per_category_limit`] products and the total never exceeds
/// [`MAX_CANDIDATES`].
#[instrument(skip_all, fields(categories = categories.len()))]
pub async fn collect_candidates<S: CatalogStore>(store: &S, categories: &[Category]) -> CandidateSet {
    let limit = per_category_limit(categories.len());
    let mut set = CandidateSet::default();

    for category in categories {
        let remaining = MAX_CANDIDATES.saturating_sub(set.len());
        let take = limit.min(remaining);
        if take == 0 {
            break;
        }

        match store.available_products(category.id, take).await {
            Ok(products) => set.extend(products.into_iter().take(take)),
            Err(error) => {
                warn!(category = %category.name, error = %error, "Product fetch failed, skipping category");
                set.failures.push(CategoryFailure {
                    category: category.name.clone(),
                    stage: LookupStage::Fetch,
                    error,
                });
            }
        }
    }

    debug!(count = set.len(), mode = %set.mode(), "Candidates collected");
    set
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assistant::test_support::{FakeCatalog, product};
    use shopbot_core::CategoryId;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_per_category_limit() {
        assert_eq!(per_category_limit(0), 0);
        assert_eq!(per_category_limit(1), 5);
        assert_eq!(per_category_limit(2), 3);
        assert_eq!(per_category_limit(3), 2);
        assert_eq!(per_category_limit(4), 2);
        assert_eq!(per_category_limit(5), 1);
        assert_eq!(per_category_limit(6), 1);
        assert_eq!(per_category_limit(10), 1);
        assert_eq!(per_category_limit(25), 1);
    }

    #[test]
    fn test_context_block_sentinel_when_empty() {
        let set = CandidateSet::default();
        assert_eq!(set.mode(), AssistantMode::General);
        assert_eq!(set.context_block(), NO_PRODUCTS_CONTEXT);
    }

    #[test]
    fn test_context_block_joins_lines() {
        let set = CandidateSet::from_products([
            product(1, 1, "Headphones", "Sony", 250, 10),
            product(4, 1, "Mouse", "Apple", 15, 0),
        ]);
        let block = set.context_block();
        assert_eq!(block.lines().count(), 2);
        assert!(block.starts_with("Product ID: 1, Name: Headphones"));
        assert!(block.contains(";\nProduct ID: 4, Name: Mouse"));
        assert_eq!(set.mode(), AssistantMode::Targeted);
    }

    #[test]
    fn test_from_products_dedupes_ids() {
        let set = CandidateSet::from_products([
            product(1, 1, "Headphones", "Sony", 250, 10),
            product(1, 1, "Headphones", "Sony", 250, 10),
        ]);
        assert_eq!(set.len(), 1);
        assert!(set.get(ProductId::new(1)).is_some());
        assert!(set.get(ProductId::new(2)).is_none());
    }

    #[tokio::test]
    async fn test_verify_drops_unknown_and_empty_categories() {
        let catalog = FakeCatalog::demo();
        let (verified, failures) =
            verify_categories(&catalog, &names(&["Books", "Toys", "Clothing"])).await;

        assert_eq!(verified.len(), 1);
        assert_eq!(verified[0].name, "Clothing");
        assert!(failures.is_empty());
    }

    #[tokio::test]
    async fn test_verify_keeps_duplicates() {
        let catalog = FakeCatalog::demo();
        let (verified, _) =
            verify_categories(&catalog, &names(&["Electronics", "Electronics"])).await;
        assert_eq!(verified.len(), 2);
    }

    #[tokio::test]
    async fn test_verify_contains_store_failures() {
        let catalog = FakeCatalog::demo().failing_lookup("Electronics");
        let (verified, failures) =
            verify_categories(&catalog, &names(&["Electronics", "Clothing"])).await;

        assert_eq!(verified.len(), 1);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].category, "Electronics");
        assert_eq!(failures[0].stage, LookupStage::Verify);
    }

    #[tokio::test]
    async fn test_single_category_takes_five() {
        let products = (1..=8).map(|id| product(id, 1, "Item", "Sony", 10, 0)).collect();
        let catalog = FakeCatalog::new(&[(1, "Electronics")], products);
        let (verified, _) = verify_categories(&catalog, &names(&["Electronics"])).await;

        let set = collect_candidates(&catalog, &verified).await;
        assert_eq!(set.len(), 5);
        let ids: Vec<i32> = set.products().iter().map(|p| p.id.as_i32()).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn test_three_categories_take_two_each() {
        let products = (1..=9)
            .map(|id| product(id, (id - 1) / 3 + 1, "Item", "Sony", 10, 0))
            .collect();
        let catalog = FakeCatalog::new(&[(1, "A"), (2, "B"), (3, "C")], products);
        let (verified, _) = verify_categories(&catalog, &names(&["A", "B", "C"])).await;

        let set = collect_candidates(&catalog, &verified).await;
        assert_eq!(set.len(), 6);
        assert!(
            catalog
                .fetches()
                .iter()
                .all(|(_, limit)| *limit == 2)
        );
    }

    #[tokio::test]
    async fn test_many_categories_cap_at_ten() {
        let categories: Vec<(i32, String)> = (1..=12).map(|id| (id, format!("C{id}"))).collect();
        let refs: Vec<(i32, &str)> = categories.iter().map(|(id, n)| (*id, n.as_str())).collect();
        let products = (1..=12)
            .flat_map(|c| (0..3).map(move |i| product(c * 10 + i, c, "Item", "Sony", 10, 0)))
            .collect();
        let catalog = FakeCatalog::new(&refs, products);
        let wanted: Vec<String> = categories.iter().map(|(_, n)| n.clone()).collect();
        let (verified, _) = verify_categories(&catalog, &wanted).await;
        assert_eq!(verified.len(), 12);

        let set = collect_candidates(&catalog, &verified).await;
        assert_eq!(set.len(), MAX_CANDIDATES);
        assert_eq!(catalog.fetches().len(), MAX_CANDIDATES);
    }

    #[tokio::test]
    async fn test_fetch_failure_skips_category() {
        let catalog = FakeCatalog::demo().failing_fetch(1);
        let (verified, _) =
            verify_categories(&catalog, &names(&["Electronics", "Clothing"])).await;

        let set = collect_candidates(&catalog, &verified).await;
        assert!(set.is_partial());
        assert_eq!(set.failures()[0].stage, LookupStage::Fetch);
        assert!(
            set.products()
                .iter()
                .all(|p| p.category_id == CategoryId::new(2))
        );
        assert_eq!(set.len(), 2);
    }

    #[tokio::test]
    async fn test_no_verified_categories_fetches_nothing() {
        let catalog = FakeCatalog::demo();
        let set = collect_candidates(&catalog, &[]).await;
        assert_eq!(set.mode(), AssistantMode::General);
        assert!(catalog.fetches().is_empty());
    }
}
