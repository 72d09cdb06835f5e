//! Time-bounded cache of available category names.
//!
//! The classifier needs the list on every request, but it only changes when the
//! catalog does. The list is loaded lazily, kept for the configured TTL, and
//! can be dropped early with [`CategoryNameCache::invalidate`].

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tracing::debug;

use crate::db::{CatalogStore, RepositoryError};

/// Shared cache of the available category names, in catalog order.
#[derive(Clone)]
pub struct CategoryNameCache {
    names: Cache<(), Arc<Vec<String>>>,
}

impl CategoryNameCache {
    /// Create an empty cache whose entry expires `ttl` after loading.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            names: Cache::builder().max_capacity(1).time_to_live(ttl).build(),
        }
    }

    /// Return the cached names, loading them from `store` if absent or expired.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the names have to be loaded and the query
    /// fails. Failures are not cached.
    pub async fn get_or_load<S: CatalogStore>(
        &self,
        store: &S,
    ) -> Result<Arc<Vec<String>>, RepositoryError> {
        if let Some(names) = self.names.get(&()).await {
            return Ok(names);
        }

        let names = Arc::new(store.available_category_names().await?);
        debug!(count = names.len(), "Category names cached");
        self.names.insert((), Arc::clone(&names)).await;
        Ok(names)
    }

    /// Drop the cached names; the next request reloads them.
    pub fn invalidate(&self) {
        self.names.invalidate_all();
    }
}
