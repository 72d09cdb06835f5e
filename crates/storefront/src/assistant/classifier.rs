//! Category classifier.
//!
//! First pipeline stage: asks the completion service which of the available
//! categories the shopper's message is about.

use askama::Template;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::completion::{CompletionError, CompletionRequest, CompletionService, Message};

use super::{AssistantError, CLASSIFIER_TEMPERATURE, Stage};

/// System prompt for classification.
#[derive(Template)]
#[template(path = "assistant/classifier_prompt.txt")]
struct ClassifierPrompt<'a> {
    /// Comma-separated available category names.
    categories: &'a str,
}

/// Maps a shopper message onto catalog category names.
pub struct CategoryClassifier<'a, C> {
    completion: &'a C,
}

impl<'a, C: CompletionService> CategoryClassifier<'a, C> {
    /// Create a new classifier.
    #[must_use]
    pub const fn new(completion: &'a C) -> Self {
        Self { completion }
    }

    /// Classify `message` against the comma-separated `category_list`.
    ///
    /// Names come back in the order the model gave them, duplicates included.
    /// They are not checked against the catalog here.
    ///
    /// # Errors
    ///
    /// Returns `AssistantError::Classification` if the call fails or the
    /// content is not a JSON object, and `AssistantError::Prompt` if the
    /// system prompt cannot be rendered.
    #[instrument(skip_all, fields(message_len = message.len()))]
    pub async fn classify(
        &self,
        message: &str,
        category_list: &str,
    ) -> Result<Vec<String>, AssistantError> {
        let system = ClassifierPrompt {
            categories: category_list,
        }
        .render()
        .map_err(|source| AssistantError::Prompt {
            stage: Stage::Classification,
            source,
        })?;

        let request = CompletionRequest {
            messages: vec![Message::system(system), Message::user(message)],
            temperature: CLASSIFIER_TEMPERATURE,
        };

        let content = self
            .completion
            .complete(request)
            .await
            .map_err(AssistantError::Classification)?;
        debug!(content = %content, "Classifier output");

        parse_classification(&content).map_err(AssistantError::Classification)
    }
}

/// Extract category names from classifier output.
///
/// The content must be a JSON object. A missing or non-array `categories` key
/// means "no categories"; non-string entries are ignored.
///
/// # Errors
///
/// Returns `CompletionError::Parse` if the content is not a JSON object.
pub fn parse_classification(content: &str) -> Result<Vec<String>, CompletionError> {
    let value: Value = serde_json::from_str(content)
        .map_err(|e| CompletionError::Parse(format!("classifier output is not JSON: {e}")))?;

    let Value::Object(fields) = value else {
        return Err(CompletionError::Parse(
            "classifier output is not a JSON object".to_string(),
        ));
    };

    let names = match fields.get("categories") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_owned)
            .collect(),
        _ => Vec::new(),
    };
    Ok(names)
}
