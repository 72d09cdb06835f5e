//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::assistant::CategoryNameCache;
use crate::completion::{CompletionError, OpenAiClient};
use crate::config::StorefrontConfig;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    completion: OpenAiClient,
    categories: CategoryNameCache,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `pool` - `PostgreSQL` connection pool
    ///
    /// # Errors
    ///
    /// Returns an error if the completion client cannot be built from the
    /// configuration.
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Result<Self, CompletionError> {
        let completion = OpenAiClient::new(&config.openai)?;
        let categories = CategoryNameCache::new(config.assistant.category_cache_ttl);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                completion,
                categories,
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the chat-completion client.
    #[must_use]
    pub fn completion(&self) -> &OpenAiClient {
        &self.inner.completion
    }

    /// Get a reference to the available-category cache.
    #[must_use]
    pub fn categories(&self) -> &CategoryNameCache {
        &self.inner.categories
    }
}
