//! `OpenAI`-compatible chat-completion client.
//!
//! Every call asks for a JSON-object response and is bounded by the configured
//! timeout. There are no retries; a failed call is reported to the caller.

use std::sync::Arc;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use tracing::{debug, instrument};
use url::Url;

use crate::config::OpenAiConfig;

use super::CompletionService;
use super::error::{ApiErrorResponse, CompletionError};
use super::types::{ChatCompletionRequest, ChatCompletionResponse, CompletionRequest, ResponseFormat};

/// Chat-completion API client.
///
/// Cheap to clone; the underlying connection pool is shared.
#[derive(Clone)]
pub struct OpenAiClient {
    inner: Arc<OpenAiClientInner>,
}

struct OpenAiClientInner {
    client: reqwest::Client,
    endpoint: Url,
    model: String,
}

impl OpenAiClient {
    /// Create a new client.
    ///
    /// # Arguments
    ///
    /// * `config` - API key, base URL, model and timeout
    ///
    /// # Errors
    ///
    /// Returns `CompletionError::InvalidConfig` if the API key is not a valid
    /// header value or the endpoint URL cannot be built, and
    /// `CompletionError::Http` if the HTTP client cannot be constructed.
    pub fn new(config: &OpenAiConfig) -> Result<Self, CompletionError> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.api_key.expose_secret()))
            .map_err(|_| {
                CompletionError::InvalidConfig("API key contains invalid header characters".into())
            })?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(AUTHORIZATION, auth);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        let endpoint = config
            .base_url
            .join("chat/completions")
            .map_err(|e| CompletionError::InvalidConfig(format!("invalid base URL: {e}")))?;

        Ok(Self {
            inner: Arc::new(OpenAiClientInner {
                client,
                endpoint,
                model: config.model.clone(),
            }),
        })
    }

    /// The model this client requests.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.inner.model
    }

    /// Map a non-success status to an error.
    async fn handle_error_status(
        status: reqwest::StatusCode,
        response: reqwest::Response,
    ) -> CompletionError {
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);
            return CompletionError::RateLimited(retry_after);
        }

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return CompletionError::Unauthorized("Invalid API key".to_string());
        }

        match response.text().await {
            Ok(body) => {
                let message = match serde_json::from_str::<ApiErrorResponse>(&body) {
                    Ok(api_error) => {
                        debug!(
                            status = status.as_u16(),
                            error_type = api_error.error.error_type.as_deref().unwrap_or("unknown"),
                            "Completion API error"
                        );
                        api_error.error.message
                    }
                    Err(_) => body.chars().take(500).collect(),
                };
                CompletionError::Api {
                    status: status.as_u16(),
                    message,
                }
            }
            Err(e) => CompletionError::Http(e),
        }
    }
}

impl CompletionService for OpenAiClient {
    #[instrument(
        skip(self, request),
        fields(model = %self.inner.model, temperature = request.temperature, messages = request.messages.len())
    )]
    async fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError> {
        let body = ChatCompletionRequest {
            model: &self.inner.model,
            messages: &request.messages,
            temperature: request.temperature,
            response_format: ResponseFormat::JsonObject,
        };

        let response = self
            .inner
            .client
            .post(self.inner.endpoint.as_str())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::handle_error_status(status, response).await);
        }

        let text = response.text().await?;
        let parsed: ChatCompletionResponse = serde_json::from_str(&text)
            .map_err(|e| CompletionError::Parse(format!("Failed to parse response: {e}")))?;

        let finish_reason = parsed.first_finish_reason().unwrap_or("none");
        if let Some(usage) = &parsed.usage {
            debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                finish_reason,
                "Completion usage"
            );
        }

        parsed
            .into_first_content()
            .filter(|content| !content.trim().is_empty())
            .ok_or(CompletionError::EmptyResponse)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use secrecy::SecretString;

    use super::*;

    fn config(base_url: &str) -> OpenAiConfig {
        OpenAiConfig {
            api_key: SecretString::from("sk-test-key"),
            base_url: Url::parse(base_url).expect("valid url"),
            model: "gpt-4o-mini".to_string(),
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let client = OpenAiClient::new(&config("https://api.openai.com/v1/")).expect("client");
        assert_eq!(
            client.inner.endpoint.as_str(),
            "https://api.openai.com/v1/chat/completions"
        );
        assert_eq!(client.model(), "gpt-4o-mini");
    }

    #[test]
    fn test_invalid_api_key_is_config_error() {
        let mut cfg = config("https://api.openai.com/v1/");
        cfg.api_key = SecretString::from("bad\nkey");
        let result = OpenAiClient::new(&cfg);
        assert!(matches!(result, Err(CompletionError::InvalidConfig(_))));
    }

    #[test]
    fn test_openai_client_is_clone_send_sync() {
        fn assert_traits<T: Clone + Send + Sync>() {}
        assert_traits::<OpenAiClient>();
    }
}
