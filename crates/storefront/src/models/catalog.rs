//! Catalog domain types used by the shopping assistant.
//!
//! These types represent validated domain objects separate from database row
//! types. [`CatalogProduct`] is the one projection of a product the assistant
//! works with; [`RecommendedProduct`] is the wire shape returned to shoppers.

use serde::Serialize;

use shopbot_core::{CategoryId, CurrencyCode, DiscountPercent, Price, ProductId};

/// Placeholder for missing display text.
pub const NOT_AVAILABLE: &str = "N/A";

/// Longest description excerpt included in a product summary line.
pub const FEATURES_SNIPPET_CHARS: usize = 200;

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    /// Unique category ID.
    pub id: CategoryId,
    /// Unique, human-readable name.
    pub name: String,
}

/// An available product with its brand, text and image denormalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogProduct {
    pub id: ProductId,
    pub category_id: CategoryId,
    /// Display title (`N/A` when the product has no text row).
    pub name: String,
    /// Long description (`N/A` when the product has no text row).
    pub description: String,
    /// Brand name (`N/A` when the product has no brand).
    pub brand_name: String,
    pub price: Price,
    pub discount: DiscountPercent,
    pub currency: CurrencyCode,
    pub in_stock: i32,
    pub image_url: Option<String>,
}

impl CatalogProduct {
    /// Product-detail reference used by the storefront front end.
    #[must_use]
    pub fn slug(&self) -> String {
        format!("product-{}", self.id)
    }

    /// One-line summary sent to the recommender.
    ///
    /// Newlines and runs of whitespace in the description are collapsed so
    /// each product occupies exactly one line.
    #[must_use]
    pub fn summary_line(&self) -> String {
        format!(
            "Product ID: {}, Name: {}, Brand: {}, Price: {} {}, Discount: {}%, Features: {}",
            self.id,
            single_line(&self.name),
            single_line(&self.brand_name),
            self.price,
            self.currency,
            self.discount,
            features_snippet(&self.description),
        )
    }
}

/// A product selected by the recommender, as returned to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecommendedProduct {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    pub description: String,
    pub currency: CurrencyCode,
    pub discount: DiscountPercent,
    pub brand_name: String,
    pub slug: String,
    pub image_url: Option<String>,
}

impl From<&CatalogProduct> for RecommendedProduct {
    fn from(product: &CatalogProduct) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            price: product.price,
            description: product.description.clone(),
            currency: product.currency.clone(),
            discount: product.discount,
            brand_name: product.brand_name.clone(),
            slug: product.slug(),
            image_url: product.image_url.clone(),
        }
    }
}

fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Collapse whitespace and cut the description to [`FEATURES_SNIPPET_CHARS`].
fn features_snippet(description: &str) -> String {
    let flat = single_line(description);
    if flat.chars().count() <= FEATURES_SNIPPET_CHARS {
        return flat;
    }
    let mut cut: String = flat.chars().take(FEATURES_SNIPPET_CHARS).collect();
    cut.push_str("...");
    cut
}
