//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, HTTP transaction)
//! 2. `TraceLayer` (request span with status and latency)
//! 3. Request ID (reuse or generate `x-request-id`)
//! 4. Rate limiting on `/api/ai-chat` (governor)

pub mod rate_limit;
pub mod request_id;

pub use rate_limit::{ClientIpKeyExtractor, RateLimitConfigError, chat_rate_limiter};
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
