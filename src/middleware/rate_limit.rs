use std::time::Duration;

use axum::body::Body;
use governor::middleware::NoOpMiddleware;
use http::{HeaderValue, StatusCode};
use tower_governor::governor::{GovernorConfig, GovernorConfigBuilder};
use tower_governor::key_extractor::SmartIpKeyExtractor;
use tower_governor::GovernorError;

use crate::config::RateLimitConfig;

pub type ApiGovernorConfig = GovernorConfig<SmartIpKeyExtractor, NoOpMiddleware>;

/// Time to refill one request slot when `per_second` requests are allowed per second.
fn replenish_period(per_second: u32) -> Option<Duration> {
    (per_second > 0).then(|| Duration::from_secs(1) / per_second)
}

/// Per-client limiter for the saved query API, keyed on the forwarded client IP.
pub fn api_governor_config(config: &RateLimitConfig) -> anyhow::Result<ApiGovernorConfig> {
    let period = replenish_period(config.api_per_second)
        .ok_or_else(|| anyhow::anyhow!("RATE_LIMIT_API_PER_SECOND must be positive"))?;

    // `key_extractor` returns a new builder, so the rest of the chain hangs off it.
    GovernorConfigBuilder::default()
        .key_extractor(SmartIpKeyExtractor)
        .period(period)
        .burst_size(config.api_burst)
        .error_handler(rate_limit_response)
        .finish()
        .ok_or_else(|| anyhow::anyhow!("Failed to build API governor config"))
}

/// JSON response for requests rejected by the rate limiter, in the `AppError` envelope.
fn rate_limit_response(error: GovernorError) -> http::Response<Body> {
    let json_response = |status: StatusCode, body: serde_json::Value| {
        let mut resp = http::Response::new(Body::from(body.to_string()));
        *resp.status_mut() = status;
        resp.headers_mut().insert(
            http::header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        resp
    };

    match error {
        GovernorError::TooManyRequests { wait_time, headers } => {
            let mut resp = json_response(
                StatusCode::TOO_MANY_REQUESTS,
                serde_json::json!({
                    "error": {
                        "code": "RATE_LIMITED",
                        "message": "Rate limit exceeded",
                        "details": { "retry_after_seconds": wait_time }
                    }
                }),
            );

            if let Some(hmap) = headers {
                for (name, value) in hmap.iter() {
                    resp.headers_mut().append(name.clone(), value.clone());
                }
            }
            resp.headers_mut()
                .insert(http::header::RETRY_AFTER, HeaderValue::from(wait_time));

            resp
        }
        GovernorError::UnableToExtractKey => json_response(
            StatusCode::BAD_REQUEST,
            serde_json::json!({
                "error": {
                    "code": "BAD_REQUEST",
                    "message": "Unable to determine client IP for rate limiting"
                }
            }),
        ),
        GovernorError::Other { code, msg, headers } => {
            let status =
                StatusCode::from_u16(code.as_u16()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            let mut resp = json_response(
                status,
                serde_json::json!({
                    "error": {
                        "code": "INTERNAL_ERROR",
                        "message": msg.unwrap_or_else(|| "Rate limiting error".to_string())
                    }
                }),
            );
            if let Some(hmap) = headers {
                for (name, value) in hmap.iter() {
                    resp.headers_mut().append(name.clone(), value.clone());
                }
            }
            resp
        }
    }
}
