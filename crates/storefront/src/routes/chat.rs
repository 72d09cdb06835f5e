//! Shopping assistant chat endpoint.

use axum::{Json, extract::State};
use serde::Deserialize;
use tracing::instrument;

use crate::assistant::{ChatReply, ShoppingAssistant};
use crate::db::CatalogRepository;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::state::AppState;

/// Request body for `POST /api/ai-chat`.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// The shopper's message. May be empty.
    pub message: String,
}

/// Answer a shopper message with a reply and, when relevant, products.
///
/// # Errors
///
/// Returns `AppError::BadRequest` for messages over the configured length and
/// `AppError::Assistant` when classification or recommendation fails.
#[instrument(skip_all, fields(message_len = request.message.len()))]
pub async fn ai_chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatReply>> {
    let max_chars = state.config().assistant.max_message_chars;
    let chars = request.message.chars().count();
    if chars > max_chars {
        return Err(AppError::BadRequest(format!(
            "Message is too long (maximum {max_chars} characters)."
        )));
    }

    let chars_label = chars.to_string();
    add_breadcrumb("chat", "Message received", Some(&[("chars", chars_label.as_str())]));

    let catalog = CatalogRepository::new(state.pool());
    let reply = ShoppingAssistant::new(state.completion(), &catalog, state.categories())
        .respond(&request.message)
        .await?;

    Ok(Json(reply))
}
