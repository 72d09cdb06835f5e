//! Chat-completion API integration.
//!
//! The assistant only needs one operation from the provider: send a list of
//! messages, get back the text of the first choice. That operation is the
//! [`CompletionService`] trait; [`OpenAiClient`] implements it against an
//! `OpenAI`-compatible `/chat/completions` endpoint with JSON-object output.

mod client;
mod error;
mod types;

use std::future::Future;

pub use client::OpenAiClient;
pub use error::{ApiErrorResponse, CompletionError};
pub use types::{
    ChatCompletionRequest, ChatCompletionResponse, CompletionRequest, Message, ResponseFormat,
    Role, Usage,
};

/// A chat-completion provider that answers with a JSON-object string.
pub trait CompletionService: Send + Sync {
    /// Run one completion and return `choices[0].message.content`.
    ///
    /// The returned string is the raw content; callers parse it themselves.
    fn complete(
        &self,
        request: CompletionRequest,
    ) -> impl Future<Output = Result<String, CompletionError>> + Send;
}
