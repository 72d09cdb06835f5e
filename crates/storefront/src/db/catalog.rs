//! Read-only catalog queries used by the shopping assistant.
//!
//! The assistant talks to the catalog through the [`CatalogStore`] trait so the
//! pipeline can run against an in-memory catalog in tests. [`CatalogRepository`]
//! is the `PostgreSQL` implementation.

use std::future::Future;

use sqlx::PgPool;
use tracing::{debug, instrument};

use shopbot_core::{
    CategoryId, CurrencyCode, DiscountPercent, Price, ProductId, ProductStatus,
};

use super::RepositoryError;
use crate::models::catalog::{CatalogProduct, Category, NOT_AVAILABLE};

/// Read access to the product catalog.
///
/// "Available" always means active status and a positive stock count.
pub trait CatalogStore: Send + Sync {
    /// Names of categories with at least one available product, in catalog order.
    fn available_category_names(
        &self,
    ) -> impl Future<Output = Result<Vec<String>, RepositoryError>> + Send;

    /// Find a category by exact name.
    fn find_category_by_name(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Option<Category>, RepositoryError>> + Send;

    /// Whether the category has at least one available product.
    fn has_available_products(
        &self,
        category_id: CategoryId,
    ) -> impl Future<Output = Result<bool, RepositoryError>> + Send;

    /// Up to `limit` available products of a category, ordered by product ID.
    fn available_products(
        &self,
        category_id: CategoryId,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<CatalogProduct>, RepositoryError>> + Send;
}

/// `PostgreSQL` catalog repository.
pub struct CatalogRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CatalogRepository<'a> {
    /// Create a new catalog repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }
}

impl CatalogStore for CatalogRepository<'_> {
    #[instrument(skip(self))]
    async fn available_category_names(&self) -> Result<Vec<String>, RepositoryError> {
        let names: Vec<String> = sqlx::query_scalar(
            r"
            SELECT c.name
            FROM categories c
            WHERE EXISTS (
                SELECT 1 FROM products p
                WHERE p.category_id = c.id
                AND p.status = $1
                AND p.in_stock > 0
            )
            ORDER BY c.id
            ",
        )
        .bind(ProductStatus::Active.as_i16())
        .fetch_all(self.pool)
        .await?;

        debug!(count = names.len(), "Loaded available category names");
        Ok(names)
    }

    async fn find_category_by_name(&self, name: &str) -> Result<Option<Category>, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r"
            SELECT id, name
            FROM categories
            WHERE name = $1
            ",
        )
        .bind(name)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(|r| Category {
            id: r.id,
            name: r.name,
        }))
    }

    async fn has_available_products(&self, category_id: CategoryId) -> Result<bool, RepositoryError> {
        let exists: bool = sqlx::query_scalar(
            r"
            SELECT EXISTS(
                SELECT 1 FROM products
                WHERE category_id = $1
                AND status = $2
                AND in_stock > 0
            )
            ",
        )
        .bind(category_id)
        .bind(ProductStatus::Active.as_i16())
        .fetch_one(self.pool)
        .await?;

        Ok(exists)
    }

    #[instrument(skip(self), fields(category_id = %category_id))]
    async fn available_products(
        &self,
        category_id: CategoryId,
        limit: usize,
    ) -> Result<Vec<CatalogProduct>, RepositoryError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let rows = sqlx::query_as::<_, CatalogProductRow>(
            r"
            SELECT p.id, p.category_id, p.price, p.discount, p.currency, p.in_stock,
                   t.title, t.description,
                   b.name AS brand_name,
                   i.url AS image_url
            FROM products p
            LEFT JOIN product_texts t ON t.id = p.text_id
            LEFT JOIN brands b ON b.id = p.brand_id
            LEFT JOIN images i ON i.id = p.general_image_id
            WHERE p.category_id = $1
            AND p.status = $2
            AND p.in_stock > 0
            ORDER BY p.id
            LIMIT $3
            ",
        )
        .bind(category_id)
        .bind(ProductStatus::Active.as_i16())
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        let products = rows
            .into_iter()
            .map(CatalogProduct::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        debug!(count = products.len(), "Fetched available products");
        Ok(products)
    }
}

/// Internal row type for category lookups.
#[derive(sqlx::FromRow)]
struct CategoryRow {
    id: CategoryId,
    name: String,
}

/// Internal row type for the joined product query.
#[derive(sqlx::FromRow)]
struct CatalogProductRow {
    id: ProductId,
    category_id: CategoryId,
    price: i32,
    discount: i32,
    currency: Option<String>,
    in_stock: i32,
    title: Option<String>,
    description: Option<String>,
    brand_name: Option<String>,
    image_url: Option<String>,
}

impl TryFrom<CatalogProductRow> for CatalogProduct {
    type Error = RepositoryError;

    fn try_from(row: CatalogProductRow) -> Result<Self, Self::Error> {
        let discount = DiscountPercent::new(row.discount).map_err(|e| {
            RepositoryError::DataCorruption(format!("product {}: {e}", row.id))
        })?;

        Ok(Self {
            id: row.id,
            category_id: row.category_id,
            name: row.title.unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            description: row.description.unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            brand_name: row.brand_name.unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            price: Price::new(row.price),
            discount,
            currency: CurrencyCode::from_stored(row.currency),
            in_stock: row.in_stock,
            image_url: row.image_url,
        })
    }
}
