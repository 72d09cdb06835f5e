//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (database)
//!
//! # Shopping assistant
//! POST /api/ai-chat            - Chat message in, reply and products out (rate limited)
//! ```

pub mod chat;
pub mod health;

use axum::{
    Router,
    routing::{get, post},
};

use crate::middleware::{RateLimitConfigError, chat_rate_limiter};
use crate::state::AppState;

/// Create the assistant API router.
///
/// # Errors
///
/// Returns `RateLimitConfigError` if the chat rate limiter cannot be built.
pub fn api_routes() -> Result<Router<AppState>, RateLimitConfigError> {
    Ok(Router::new()
        .route("/ai-chat", post(chat::ai_chat))
        .layer(chat_rate_limiter()?))
}

/// Create all routes for the storefront.
///
/// # Errors
///
/// Returns `RateLimitConfigError` if a rate limiter cannot be built.
pub fn routes() -> Result<Router<AppState>, RateLimitConfigError> {
    Ok(Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/api", api_routes()?))
}
