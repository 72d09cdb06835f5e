//! Domain models for storefront.

pub mod catalog;

pub use catalog::{CatalogProduct, Category, RecommendedProduct};
