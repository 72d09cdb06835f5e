//! Error types for the shopping assistant.

use std::fmt;

use thiserror::Error;

use crate::completion::CompletionError;
use crate::db::RepositoryError;

use super::{CLASSIFICATION_FAILED_MESSAGE, RECOMMENDATION_FAILED_MESSAGE};

/// Pipeline stage that can fail a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Classification,
    Recommendation,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Classification => write!(f, "classification"),
            Self::Recommendation => write!(f, "recommendation"),
        }
    }
}

/// Errors that fail a chat request.
///
/// Per-category catalog failures are not errors; they are reported in
/// [`CandidateSet::failures`](super::CandidateSet::failures).
#[derive(Debug, Error)]
pub enum AssistantError {
    /// The classifier call failed or returned unusable content.
    #[error("category classification failed: {0}")]
    Classification(#[source] CompletionError),

    /// The recommender call failed or returned unusable content.
    #[error("recommendation failed: {0}")]
    Recommendation(#[source] CompletionError),

    /// A system prompt could not be rendered.
    #[error("{stage} prompt rendering failed: {source}")]
    Prompt {
        stage: Stage,
        #[source]
        source: askama::Error,
    },

    /// The available-category list could not be loaded.
    #[error("category list unavailable: {0}")]
    Catalog(#[from] RepositoryError),
}

impl AssistantError {
    /// The stage this error is reported in.
    ///
    /// The category list is loaded before classification, so a catalog error
    /// counts as a classification failure.
    #[must_use]
    pub const fn stage(&self) -> Stage {
        match self {
            Self::Classification(_) | Self::Catalog(_) => Stage::Classification,
            Self::Recommendation(_) => Stage::Recommendation,
            Self::Prompt { stage, .. } => *stage,
        }
    }

    /// Message safe to show the shopper.
    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        match self.stage() {
            Stage::Classification => CLASSIFICATION_FAILED_MESSAGE,
            Stage::Recommendation => RECOMMENDATION_FAILED_MESSAGE,
        }
    }
}
