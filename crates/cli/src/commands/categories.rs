//! Inspect the category list the assistant classifies against.

use shopbot_storefront::db::{CatalogRepository, CatalogStore};

use super::{CommandError, connect};

/// Print the names of categories with at least one available product.
///
/// # Errors
///
/// Returns `CommandError` if the database is unreachable or the query fails.
#[allow(clippy::print_stdout)]
pub async fn list() -> Result<(), CommandError> {
    let pool = connect().await?;
    let names = CatalogRepository::new(&pool)
        .available_category_names()
        .await?;

    if names.is_empty() {
        println!("No categories have available products. Try `shopbot seed demo`.");
        return Ok(());
    }

    for name in &names {
        println!("{name}");
    }
    Ok(())
}
