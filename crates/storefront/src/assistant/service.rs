//! Shopping assistant pipeline orchestration.

use serde::Serialize;
use tracing::{info, instrument};

use crate::completion::CompletionService;
use crate::db::CatalogStore;
use crate::models::RecommendedProduct;

use super::{
    CategoryClassifier, CategoryNameCache, MISSING_REPLY_MESSAGE, ProductRecommender,
    AssistantError, assemble_products, collect_candidates, verify_categories,
};

/// Reply to one chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatReply {
    /// Text shown to the shopper.
    pub message: String,
    /// Recommended products, or `null` when there are none.
    pub products: Option<Vec<RecommendedProduct>>,
    /// Verified category names, in classifier order.
    pub category_searched: Vec<String>,
}

/// Runs classification, catalog lookup and recommendation for a message.
pub struct ShoppingAssistant<'a, C, S> {
    completion: &'a C,
    catalog: &'a S,
    categories: &'a CategoryNameCache,
}

impl<'a, C, S> ShoppingAssistant<'a, C, S>
where
    C: CompletionService,
    S: CatalogStore,
{
    /// Create a new assistant.
    ///
    /// # Arguments
    ///
    /// * `completion` - Chat-completion provider used by both LLM stages
    /// * `catalog` - Product catalog
    /// * `categories` - Shared cache of available category names
    #[must_use]
    pub const fn new(completion: &'a C, catalog: &'a S, categories: &'a CategoryNameCache) -> Self {
        Self {
            completion,
            catalog,
            categories,
        }
    }

    /// Answer one shopper message.
    ///
    /// # Errors
    ///
    /// Returns `AssistantError` if the category list cannot be loaded or either
    /// completion stage fails. Per-category catalog failures do not fail the
    /// request.
    #[instrument(skip_all, fields(message_len = message.len()))]
    pub async fn respond(&self, message: &str) -> Result<ChatReply, AssistantError> {
        info!(message_len = message.len(), "Chat message received");

        let available = self.categories.get_or_load(self.catalog).await?;
        let category_list = available.join(", ");

        let classified = CategoryClassifier::new(self.completion)
            .classify(message, &category_list)
            .await?;
        info!(categories = ?classified, "Message classified");

        let (verified, failures) = verify_categories(self.catalog, &classified).await;
        let category_searched: Vec<String> = verified.iter().map(|c| c.name.clone()).collect();
        info!(categories = ?category_searched, "Categories verified");

        let mut candidates = collect_candidates(self.catalog, &verified).await;
        candidates.record_failures(failures);
        info!(
            count = candidates.len(),
            mode = %candidates.mode(),
            partial = candidates.is_partial(),
            "Candidates fetched"
        );

        let recommendation = ProductRecommender::new(self.completion)
            .recommend(message, &category_list, &candidates)
            .await?;

        let products = assemble_products(recommendation.selected_ids.as_deref(), &candidates);
        info!(
            returned = products.as_ref().map_or(0, Vec::len),
            "Recommendation assembled"
        );

        Ok(ChatReply {
            message: recommendation
                .text_response
                .unwrap_or_else(|| MISSING_REPLY_MESSAGE.to_string()),
            products,
            category_searched,
        })
    }
}
