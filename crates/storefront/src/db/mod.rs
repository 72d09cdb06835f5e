//! Database operations for the storefront catalog.
//!
//! # Database: `shopbot`
//!
//! The chat pipeline is read-only over these tables; they are owned by the
//! catalog administration tooling.
//!
//! ## Tables
//!
//! - `categories` - Named product groupings (unique names)
//! - `brands` - Brand names
//! - `product_texts` - Product titles and descriptions
//! - `images` - Image URLs
//! - `products` - Price, discount, currency, stock and status per product
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p shopbot-cli -- migrate
//! ```

pub mod catalog;
pub mod seed;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use catalog::{CatalogRepository, CatalogStore};
pub use seed::{SeedResult, seed_demo_catalog};

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
