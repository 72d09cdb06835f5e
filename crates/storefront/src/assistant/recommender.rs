//! Product recommender.
//!
//! Final pipeline stage: the completion service sees the shopper's message and
//! the candidate summaries, writes the reply and picks product IDs. Picked IDs
//! are resolved against the candidate set only; anything else is ignored.

use askama::Template;
use serde_json::{Number, Value};
use tracing::{debug, instrument};

use shopbot_core::ProductId;

use crate::completion::{CompletionError, CompletionRequest, CompletionService, Message};
use crate::models::RecommendedProduct;

use super::{AssistantError, CandidateSet, NO_PRODUCTS_CONTEXT, RECOMMENDER_TEMPERATURE, Stage};

/// System prompt for recommendation.
#[derive(Template)]
#[template(path = "assistant/recommender_prompt.txt")]
struct RecommenderPrompt<'a> {
    categories: &'a str,
    no_products: &'a str,
}

/// Parsed recommender output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Recommendation {
    /// Reply for the shopper, if the model supplied one.
    pub text_response: Option<String>,
    /// Picked product IDs in the model's order; `None` if absent or not a list.
    pub selected_ids: Option<Vec<ProductId>>,
}

/// Writes the reply and picks products from the candidate set.
pub struct ProductRecommender<'a, C> {
    completion: &'a C,
}

impl<'a, C: CompletionService> ProductRecommender<'a, C> {
    /// Create a new recommender.
    #[must_use]
    pub const fn new(completion: &'a C) -> Self {
        Self { completion }
    }

    /// Ask for a reply to `message` given the candidates.
    ///
    /// # Errors
    ///
    /// Returns `AssistantError::Recommendation` if the call fails or the
    /// content is not a JSON object, and `AssistantError::Prompt` if the
    /// system prompt cannot be rendered.
    #[instrument(skip_all, fields(message_len = message.len(), candidates = candidates.len()))]
    pub async fn recommend(
        &self,
        message: &str,
        category_list: &str,
        candidates: &CandidateSet,
    ) -> Result<Recommendation, AssistantError> {
        let system = RecommenderPrompt {
            categories: category_list,
            no_products: NO_PRODUCTS_CONTEXT,
        }
        .render()
        .map_err(|source| AssistantError::Prompt {
            stage: Stage::Recommendation,
            source,
        })?;

        let request = CompletionRequest {
            messages: vec![
                Message::system(system),
                Message::system(format!("Available Products:\n{}", candidates.context_block())),
                Message::user(message),
            ],
            temperature: RECOMMENDER_TEMPERATURE,
        };

        let content = self
            .completion
            .complete(request)
            .await
            .map_err(AssistantError::Recommendation)?;
        debug!(content = %content, "Recommender output");

        parse_recommendation(&content).map_err(AssistantError::Recommendation)
    }
}

/// Parse recommender output.
///
/// `selected_ids` entries may be integers, floats (truncated) or numeric
/// strings; other entries are skipped. A non-string `text_response` counts as
/// missing.
///
/// # Errors
///
/// Returns `CompletionError::Parse` if the content is not a JSON object.
pub fn parse_recommendation(content: &str) -> Result<Recommendation, CompletionError> {
    let value: Value = serde_json::from_str(content)
        .map_err(|e| CompletionError::Parse(format!("recommender output is not JSON: {e}")))?;

    let Value::Object(fields) = value else {
        return Err(CompletionError::Parse(
            "recommender output is not a JSON object".to_string(),
        ));
    };

    let text_response = fields
        .get("text_response")
        .and_then(Value::as_str)
        .map(str::to_owned);

    let selected_ids = match fields.get("selected_ids") {
        Some(Value::Array(items)) => Some(items.iter().filter_map(coerce_id).collect()),
        _ => None,
    };

    Ok(Recommendation {
        text_response,
        selected_ids,
    })
}

fn coerce_id(value: &Value) -> Option<ProductId> {
    match value {
        Value::Number(n) => number_to_id(n),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .and_then(|i| i32::try_from(i).ok())
                .or_else(|| s.parse::<f64>().ok().and_then(float_to_i32))
                .map(ProductId::new)
        }
        _ => None,
    }
}

fn number_to_id(n: &Number) -> Option<ProductId> {
    n.as_i64()
        .and_then(|i| i32::try_from(i).ok())
        .or_else(|| n.as_f64().and_then(float_to_i32))
        .map(ProductId::new)
}

#[allow(clippy::cast_possible_truncation)]
fn float_to_i32(f: f64) -> Option<i32> {
    let t = f.trunc();
    (t.is_finite() && t >= f64::from(i32::MIN) && t <= f64::from(i32::MAX)).then(|| t as i32)
}

/// Resolve picked IDs against the candidates.
///
/// Returns `None` when nothing was picked or nothing picked is a candidate,
/// never an empty list.
#[must_use]
pub fn assemble_products(
    selected_ids: Option<&[ProductId]>,
    candidates: &CandidateSet,
) -> Option<Vec<RecommendedProduct>> {
    let products: Vec<RecommendedProduct> = selected_ids?
        .iter()
        .filter_map(|id| candidates.get(*id))
        .map(RecommendedProduct::from)
        .collect();

    (!products.is_empty()).then_some(products)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assistant::test_support::{ScriptedCompletion, product};
    use crate::completion::Role;

    fn ids(list: &[i32]) -> Vec<ProductId> {
        list.iter().copied().map(ProductId::new).collect()
    }

    fn candidates() -> CandidateSet {
        CandidateSet::from_products([
            product(1, 1, "Noise Cancelling Headphones", "Sony", 250, 10),
            product(3, 1, "Wireless Noise Cancelling Earbuds", "Sony", 199, 15),
        ])
    }

    #[test]
    fn test_parse_full_output() {
        let rec = parse_recommendation(
            r#"{"text_response": "Try these.", "selected_ids": [3, 1]}"#,
        )
        .expect("parse");
        assert_eq!(rec.text_response.as_deref(), Some("Try these."));
        assert_eq!(rec.selected_ids, Some(ids(&[3, 1])));
    }

    #[test]
    fn test_parse_coerces_ids() {
        let rec = parse_recommendation(
            r#"{"text_response": "x", "selected_ids": ["4", 5.9, " 6 ", "abc", true, null]}"#,
        )
        .expect("parse");
        assert_eq!(rec.selected_ids, Some(ids(&[4, 5, 6])));
    }

    #[test]
    fn test_parse_null_and_missing_ids() {
        let rec = parse_recommendation(r#"{"text_response": "Hi", "selected_ids": null}"#)
            .expect("parse");
        assert_eq!(rec.selected_ids, None);

        let rec = parse_recommendation(r#"{"selected_ids": 3}"#).expect("parse");
        assert_eq!(rec.selected_ids, None);
        assert_eq!(rec.text_response, None);
    }

    #[test]
    fn test_parse_rejects_non_object() {
        assert!(matches!(
            parse_recommendation("Here are some products"),
            Err(CompletionError::Parse(_))
        ));
    }

    #[test]
    fn test_assemble_skips_unknown_ids() {
        let selected = ids(&[3, 999]);
        let products = assemble_products(Some(selected.as_slice()), &candidates()).expect("one match");
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].id, ProductId::new(3));
        assert_eq!(products[0].slug, "product-3");
    }

    #[test]
    fn test_assemble_is_none_without_matches() {
        let set = candidates();
        assert_eq!(assemble_products(None, &set), None);
        assert_eq!(assemble_products(Some(&[][..]), &set), None);
        assert_eq!(assemble_products(Some(ids(&[42]).as_slice()), &set), None);
    }

    #[test]
    fn test_assemble_keeps_model_order() {
        let selected = ids(&[3, 1]);
        let products = assemble_products(Some(selected.as_slice()), &candidates()).expect("matches");
        let order: Vec<i32> = products.iter().map(|p| p.id.as_i32()).collect();
        assert_eq!(order, vec![3, 1]);
    }

    #[test]
    fn test_prompt_mentions_sentinel_and_categories() {
        let prompt = RecommenderPrompt {
            categories: "Electronics, Clothing",
            no_products: NO_PRODUCTS_CONTEXT,
        }
        .render()
        .expect("render");
        assert!(prompt.contains("'text_response'"));
        assert!(prompt.contains("'selected_ids'"));
        assert!(prompt.contains(NO_PRODUCTS_CONTEXT));
        assert!(prompt.contains("Electronics, Clothing"));
    }

    #[tokio::test]
    async fn test_recommend_request_shape() {
        let completion =
            ScriptedCompletion::replying(&[r#"{"text_response": "ok", "selected_ids": [1]}"#]);
        let recommender = ProductRecommender::new(&completion);

        let rec = recommender
            .recommend("headphones please", "Electronics", &candidates())
            .await
            .expect("recommend");
        assert_eq!(rec.selected_ids, Some(ids(&[1])));

        let requests = completion.requests();
        let request = &requests[0];
        assert!((request.temperature - 0.7).abs() < f32::EPSILON);
        let roles: Vec<Role> = request.messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::System, Role::System, Role::User]);
        assert!(
            request.messages[1]
                .content
                .starts_with("Available Products:\nProduct ID: 1,")
        );
    }

    #[tokio::test]
    async fn test_recommend_general_mode_uses_sentinel() {
        let completion =
            ScriptedCompletion::replying(&[r#"{"text_response": "Hello!", "selected_ids": null}"#]);
        let recommender = ProductRecommender::new(&completion);

        recommender
            .recommend("hello", "Electronics", &CandidateSet::default())
            .await
            .expect("recommend");

        let requests = completion.requests();
        assert_eq!(
            requests[0].messages[1].content,
            format!("Available Products:\n{NO_PRODUCTS_CONTEXT}")
        );
    }
}
