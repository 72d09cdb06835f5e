//! Seed the catalog with demo data.
//!
//! The demo catalog gives the shopping assistant something to classify
//! against: three categories (one without products), three brands and five
//! active, in-stock products.

use tracing::info;

use shopbot_storefront::db::seed_demo_catalog;

use super::{CommandError, connect};

/// Seed the demo catalog.
///
/// # Arguments
///
/// * `reset` - If true, truncate all catalog tables first
///
/// # Errors
///
/// Returns `CommandError` if the database is unreachable or a statement fails.
pub async fn demo(reset: bool) -> Result<(), CommandError> {
    let pool = connect().await?;

    if reset {
        info!("Resetting catalog before seeding");
    }

    let result = seed_demo_catalog(&pool, reset).await?;

    info!(
        categories = result.categories,
        brands = result.brands,
        inserted = result.products_inserted,
        skipped = result.products_skipped,
        "Demo catalog ready"
    );
    Ok(())
}
