//! Category-aware shopping assistant.
//!
//! Each chat message runs through three sequential stages:
//!
//! 1. **Classification** - the completion service maps the message onto zero or
//!    more of the currently available category names.
//! 2. **Catalog lookup** - named categories are verified against the catalog
//!    and a bounded, category-balanced sample of available products is taken.
//! 3. **Recommendation** - the completion service sees a one-line summary per
//!    candidate and answers with a reply and the IDs of the products to show.
//!
//! Failures in stage 1 or 3 fail the whole request. Stage 2 is best-effort per
//! category: a failing category is logged and skipped.
//!
//! ## Modes
//!
//! A request with at least one candidate product runs in
//! [`AssistantMode::Targeted`]; everything else is [`AssistantMode::General`]
//! and the recommender is told that no specific products were found.

mod cache;
mod candidates;
mod classifier;
mod error;
mod recommender;
mod service;

#[cfg(test)]
pub(crate) mod test_support;

pub use cache::CategoryNameCache;
pub use candidates::{
    AssistantMode, CandidateSet, CategoryFailure, LookupStage, MAX_CANDIDATES,
    TARGET_MIN_CANDIDATES, collect_candidates, per_category_limit, verify_categories,
};
pub use classifier::{CategoryClassifier, parse_classification};
pub use error::{AssistantError, Stage};
pub use recommender::{ProductRecommender, Recommendation, assemble_products, parse_recommendation};
pub use service::{ChatReply, ShoppingAssistant};

/// Sampling temperature for category classification.
pub const CLASSIFIER_TEMPERATURE: f32 = 0.0;

/// Sampling temperature for the final recommendation.
pub const RECOMMENDER_TEMPERATURE: f32 = 0.7;

/// Product context sent to the recommender when there are no candidates.
pub const NO_PRODUCTS_CONTEXT: &str = "No specific products found.";

/// Reply used when the recommender omits `text_response`.
pub const MISSING_REPLY_MESSAGE: &str = "Error processing AI response.";

/// Client-facing message when classification fails.
pub const CLASSIFICATION_FAILED_MESSAGE: &str =
    "Sorry, I am having trouble connecting to my brain. Please try again later.";

/// Client-facing message when the final recommendation fails.
pub const RECOMMENDATION_FAILED_MESSAGE: &str =
    "An unexpected error occurred during the final response generation.";
