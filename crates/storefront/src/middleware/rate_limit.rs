//! Rate limiting middleware using governor and `tower_governor`.
//!
//! Every chat request costs two completion calls, so the chat endpoint gets
//! its own per-client limiter (~20 requests per minute, burst of 10).

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::extract::ConnectInfo;
use axum::http::{HeaderValue, Request, header::RETRY_AFTER};
use axum::response::{IntoResponse, Response};
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use tower_governor::{GovernorError, GovernorLayer, governor::GovernorConfigBuilder};

use crate::error::AppError;

/// Seconds to replenish one chat request token.
const CHAT_REPLENISH_SECS: u64 = 3;

/// Chat requests allowed in a burst.
const CHAT_BURST: u32 = 10;

/// Key extractor for the client IP.
///
/// Proxy headers are checked first (`CF-Connecting-IP`, the first
/// `X-Forwarded-For` hop, `X-Real-IP`), then the peer address recorded by
/// `into_make_service_with_connect_info`.
#[derive(Clone, Copy)]
pub struct ClientIpKeyExtractor;

impl tower_governor::key_extractor::KeyExtractor for ClientIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        let headers = req.headers();
        let header_ip = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.split(',').next())
                .and_then(|s| s.trim().parse::<IpAddr>().ok())
        };

        header_ip("cf-connecting-ip")
            .or_else(|| header_ip("x-forwarded-for"))
            .or_else(|| header_ip("x-real-ip"))
            .or_else(|| {
                req.extensions()
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|ConnectInfo(addr)| addr.ip())
            })
            .ok_or(GovernorError::UnableToExtractKey)
    }
}

/// Rate limiter layer type for Axum.
pub type RateLimiterLayer =
    GovernorLayer<ClientIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// Error building a rate limiter.
#[derive(Debug, thiserror::Error)]
#[error("invalid rate limiter configuration: {0}")]
pub struct RateLimitConfigError(&'static str);

/// Create rate limiter for the chat endpoint: ~20 requests per minute per IP.
///
/// # Errors
///
/// Returns `RateLimitConfigError` if governor rejects the quota.
pub fn chat_rate_limiter() -> Result<RateLimiterLayer, RateLimitConfigError> {
    let config = GovernorConfigBuilder::default()
        .key_extractor(ClientIpKeyExtractor)
        .per_second(CHAT_REPLENISH_SECS)
        .burst_size(CHAT_BURST)
        .finish()
        .ok_or(RateLimitConfigError("replenish period and burst must be positive"))?;
    Ok(GovernorLayer::new(Arc::new(config)).error_handler(rejection_response))
}

/// Render a limiter rejection with the storefront's JSON error body.
fn rejection_response(err: GovernorError) -> Response {
    match err {
        GovernorError::TooManyRequests { wait_time, .. } => {
            let mut response = AppError::RateLimited.into_response();
            response
                .headers_mut()
                .insert(RETRY_AFTER, HeaderValue::from(wait_time));
            response
        }
        GovernorError::UnableToExtractKey => {
            AppError::Internal("unable to determine client address".to_string()).into_response()
        }
        GovernorError::Other { code, msg, .. } => AppError::Internal(format!(
            "rate limiter failed ({code}): {}",
            msg.unwrap_or_default()
        ))
        .into_response(),
    }
}

#[cfg(test)]
mod tests {
    use tower_governor::key_extractor::KeyExtractor;

    use super::*;

    fn request(headers: &[(&str, &str)]) -> Request<()> {
        let mut builder = Request::builder().uri("/api/ai-chat");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(()).expect("request")
    }

    fn ip(s: &str) -> IpAddr {
        s.parse().expect("ip")
    }

    #[test]
    fn test_cloudflare_header_wins() {
        let req = request(&[
            ("cf-connecting-ip", "203.0.113.7"),
            ("x-forwarded-for", "198.51.100.1"),
        ]);
        assert_eq!(
            ClientIpKeyExtractor.extract(&req).expect("key"),
            ip("203.0.113.7")
        );
    }

    #[test]
    fn test_forwarded_for_uses_first_hop() {
        let req = request(&[("x-forwarded-for", "198.51.100.1, 10.0.0.2")]);
        assert_eq!(
            ClientIpKeyExtractor.extract(&req).expect("key"),
            ip("198.51.100.1")
        );
    }

    #[test]
    fn test_real_ip_header() {
        let req = request(&[("x-real-ip", "2001:db8::1")]);
        assert_eq!(
            ClientIpKeyExtractor.extract(&req).expect("key"),
            ip("2001:db8::1")
        );
    }

    #[test]
    fn test_falls_back_to_peer_address() {
        let mut req = request(&[("x-forwarded-for", "not-an-ip")]);
        req.extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([192, 0, 2, 4], 50123))));
        assert_eq!(
            ClientIpKeyExtractor.extract(&req).expect("key"),
            ip("192.0.2.4")
        );
    }

    #[test]
    fn test_no_source_is_an_error() {
        assert!(ClientIpKeyExtractor.extract(&request(&[])).is_err());
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[tokio::test]
    async fn test_rejection_is_json_with_retry_after() {
        let response = rejection_response(GovernorError::TooManyRequests {
            wait_time: 3,
            headers: None,
        });

        assert_eq!(response.status(), axum::http::StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            response.headers().get(RETRY_AFTER).and_then(|v| v.to_str().ok()),
            Some("3")
        );
        assert_eq!(
            body_json(response).await,
            serde_json::json!({ "message": "Too many requests, please slow down." })
        );
    }

    #[tokio::test]
    async fn test_missing_client_address_hides_details() {
        let response = rejection_response(GovernorError::UnableToExtractKey);

        assert_eq!(
            response.status(),
            axum::http::StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            body_json(response).await,
            serde_json::json!({ "message": "Internal server error" })
        );
    }

    #[test]
    fn test_chat_rate_limiter_builds() {
        assert!(chat_rate_limiter().is_ok());
    }
}
