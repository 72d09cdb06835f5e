//! Types for the chat-completion API.
//!
//! These types match the `OpenAI` chat-completions wire format.

use serde::{Deserialize, Serialize};

/// Role of a message author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A message in a completion request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Author of the message.
    pub role: Role,
    /// Plain-text content.
    pub content: String,
}

impl Message {
    /// A system instruction.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// A user message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Provider-independent completion request.
///
/// The client adds the model and asks for a JSON-object response.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// Conversation, system instructions first.
    pub messages: Vec<Message>,
    /// Sampling temperature (0.0 is deterministic).
    pub temperature: f32,
}

/// Requested output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseFormat {
    /// The model must emit a single JSON object.
    JsonObject,
}

/// Request body for `POST /chat/completions`.
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest<'a> {
    /// Model to use (e.g., "gpt-4o-mini").
    pub model: &'a str,
    /// Conversation messages.
    pub messages: &'a [Message],
    /// Sampling temperature.
    pub temperature: f32,
    /// Output format hint.
    pub response_format: ResponseFormat,
}

/// Response from `POST /chat/completions`.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionResponse {
    /// Generated choices; only the first is used.
    #[serde(default)]
    pub choices: Vec<Choice>,
    /// Token usage information.
    #[serde(default)]
    pub usage: Option<Usage>,
}

/// One generated choice.
#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    pub message: ChoiceMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// The assistant message inside a choice.
#[derive(Debug, Clone, Deserialize)]
pub struct ChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

/// Token usage information.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl ChatCompletionResponse {
    /// Content of the first choice, if any.
    #[must_use]
    pub fn into_first_content(self) -> Option<String> {
        self.choices.into_iter().next()?.message.content
    }

    /// Why generation of the first choice stopped (`stop`, `length`, ...).
    #[must_use]
    pub fn first_finish_reason(&self) -> Option<&str> {
        self.choices.first()?.finish_reason.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization() {
        let messages = vec![Message::system("classify"), Message::user("hello")];
        let request = ChatCompletionRequest {
            model: "gpt-4o-mini",
            messages: &messages,
            temperature: 0.0,
            response_format: ResponseFormat::JsonObject,
        };

        let json = serde_json::to_value(&request).expect("serialize");
        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["messages"][1]["content"], "hello");
        assert_eq!(json["response_format"]["type"], "json_object");
        assert_eq!(json["temperature"], 0.0);
    }

    #[test]
    fn test_response_first_content() {
        let body = r#"{
            "id": "chatcmpl-1",
            "choices": [
                {"index": 0, "message": {"role": "assistant", "content": "{\"categories\":[]}"}, "finish_reason": "stop"}
            ],
            "usage": {"prompt_tokens": 12, "completion_tokens": 5, "total_tokens": 17}
        }"#;
        let response: ChatCompletionResponse = serde_json::from_str(body).expect("deserialize");
        assert_eq!(response.usage.map(|u| u.prompt_tokens), Some(12));
        assert_eq!(response.first_finish_reason(), Some("stop"));
        assert_eq!(
            response.into_first_content().as_deref(),
            Some("{\"categories\":[]}")
        );
    }

    #[test]
    fn test_response_without_choices() {
        let response: ChatCompletionResponse =
            serde_json::from_str(r#"{"choices": []}"#).expect("deserialize");
        assert!(response.first_finish_reason().is_none());
        assert!(response.into_first_content().is_none());
    }
}
