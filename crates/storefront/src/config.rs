//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `OPENAI_API_KEY` - Bearer credential for the chat-completion API
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `OPENAI_BASE_URL` - Completion API base URL (default: <https://api.openai.com/v1/>)
//! - `OPENAI_MODEL` - Completion model (default: gpt-4o-mini)
//! - `OPENAI_TIMEOUT_SECS` - Per-call timeout in seconds, 1..=120 (default: 20)
//! - `CATEGORY_CACHE_TTL_SECS` - Lifetime of the cached category list (default: 300)
//! - `CHAT_MAX_MESSAGE_CHARS` - Longest accepted chat message (default: 2000)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error event sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.1)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const MAX_OPENAI_TIMEOUT_SECS: u64 = 120;

const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1/";
const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Chat-completion API configuration
    pub openai: OpenAiConfig,
    /// Shopping assistant tuning
    pub assistant: AssistantConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name (e.g., production)
    pub sentry_environment: Option<String>,
    /// Fraction of error events sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions sent to Sentry
    pub sentry_traces_sample_rate: f32,
}

/// Chat-completion API configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct OpenAiConfig {
    /// Bearer API key
    pub api_key: SecretString,
    /// Base URL, always ending in `/`
    pub base_url: Url,
    /// Model ID (e.g., gpt-4o-mini)
    pub model: String,
    /// Timeout applied to every completion call
    pub timeout: Duration,
}

impl std::fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url.as_str())
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Shopping assistant tuning.
#[derive(Debug, Clone)]
pub struct AssistantConfig {
    /// How long the available-category list is reused before reloading
    pub category_cache_ttl: Duration,
    /// Longest accepted chat message, in characters
    pub max_message_chars: usize,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            category_cache_ttl: Duration::from_secs(300),
            max_message_chars: 2000,
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("STOREFRONT_DATABASE_URL")?;
        let host = parse_env_or_default::<IpAddr>("STOREFRONT_HOST", "127.0.0.1")?;
        let port = parse_env_or_default::<u16>("STOREFRONT_PORT", "3000")?;

        let openai = OpenAiConfig::from_env()?;
        let assistant = AssistantConfig::from_env()?;

        Ok(Self {
            database_url,
            host,
            port,
            openai,
            assistant,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_env_or_default("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: parse_env_or_default("SENTRY_TRACES_SAMPLE_RATE", "0.1")?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl OpenAiConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let key = get_required_env("OPENAI_API_KEY")?;

        let base_url = parse_base_url(
            "OPENAI_BASE_URL",
            &get_env_or_default("OPENAI_BASE_URL", DEFAULT_OPENAI_BASE_URL),
        )?;

        let timeout_secs = parse_env_or_default::<u64>("OPENAI_TIMEOUT_SECS", "20")?;
        if timeout_secs == 0 || timeout_secs > MAX_OPENAI_TIMEOUT_SECS {
            return Err(ConfigError::InvalidEnvVar(
                "OPENAI_TIMEOUT_SECS".to_string(),
                format!("must be between 1 and {MAX_OPENAI_TIMEOUT_SECS}"),
            ));
        }

        Ok(Self {
            api_key: SecretString::from(key),
            base_url,
            model: get_env_or_default("OPENAI_MODEL", DEFAULT_OPENAI_MODEL),
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

impl OpenAiConfig {
    /// Check the API key for placeholder text and low entropy.
    ///
    /// Callers log a weak key as a warning; it never stops start-up.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InsecureSecret` describing the weakness.
    pub fn check_key_strength(&self) -> Result<(), ConfigError> {
        validate_secret_strength(self.api_key.expose_secret(), "OPENAI_API_KEY")
    }
}

impl AssistantConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let ttl_secs = parse_env_or_default::<u64>("CATEGORY_CACHE_TTL_SECS", "300")?;
        let max_message_chars = parse_env_or_default::<usize>("CHAT_MAX_MESSAGE_CHARS", "2000")?;
        if max_message_chars == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "CHAT_MAX_MESSAGE_CHARS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            category_cache_ttl: Duration::from_secs(ttl_secs),
            max_message_chars,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable, using `default` when it is unset.
fn parse_env_or_default<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Parse a base URL, normalizing it to end with `/` so relative joins keep the path.
fn parse_base_url(key: &str, raw: &str) -> Result<Url, ConfigError> {
    let normalized = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{raw}/")
    };
    let url = Url::parse(&normalized)
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if url.cannot_be_a_base() {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must be an absolute http(s) URL".to_string(),
        ));
    }
    Ok(url)
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1})"
            ),
        ));
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-openai-key-here", "OPENAI_API_KEY");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaa", "OPENAI_API_KEY");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        let result = validate_secret_strength("sk-aB3xY9mK2nL5pQ7rT0uW4zC6", "OPENAI_API_KEY");
        assert!(result.is_ok());
    }

    #[test]
    fn test_parse_base_url_adds_trailing_slash() {
        let url = parse_base_url("OPENAI_BASE_URL", "https://api.openai.com/v1").unwrap();
        assert_eq!(url.as_str(), "https://api.openai.com/v1/");
        assert_eq!(
            url.join("chat/completions").unwrap().as_str(),
            "https://api.openai.com/v1/chat/completions"
        );
    }

    #[test]
    fn test_parse_base_url_rejects_garbage() {
        let result = parse_base_url("OPENAI_BASE_URL", "not a url");
        assert!(matches!(result, Err(ConfigError::InvalidEnvVar(_, _))));
    }

    #[test]
    fn test_socket_addr() {
        let config = StorefrontConfig {
            database_url: SecretString::from("postgres://localhost/test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            openai: OpenAiConfig {
                api_key: SecretString::from("sk-test"),
                base_url: Url::parse(DEFAULT_OPENAI_BASE_URL).unwrap(),
                model: DEFAULT_OPENAI_MODEL.to_string(),
                timeout: Duration::from_secs(20),
            },
            assistant: AssistantConfig::default(),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.1,
        };

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
    }

    #[test]
    fn test_openai_config_debug_redacts_key() {
        let config = OpenAiConfig {
            api_key: SecretString::from("sk-super-secret-value"),
            base_url: Url::parse(DEFAULT_OPENAI_BASE_URL).unwrap(),
            model: "gpt-4o-mini".to_string(),
            timeout: Duration::from_secs(20),
        };

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("gpt-4o-mini"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("sk-super-secret-value"));
    }
}
