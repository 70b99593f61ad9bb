use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::{ConnectInfo, Request, State};
use axum::http::{HeaderMap, HeaderName, HeaderValue};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use super::{Decision, Quota, RateLimiter, client_id};
use crate::error::AppError;
use crate::metrics::REQUEST_TOTAL;

const LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
const REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
const RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

/// Admit or reject every request before it reaches a handler.
pub async fn enforce_rate_limit(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    REQUEST_TOTAL.inc();

    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let client = client_id(request.headers(), peer);

    match limiter.admit(&client, Instant::now()) {
        Decision::Allowed(quota) => {
            let mut response = next.run(request).await;
            set_quota_headers(response.headers_mut(), &quota);
            response
        }
        Decision::Limited { retry_after_secs } => {
            AppError::TooManyRequests { retry_after_secs }.into_response()
        }
    }
}

fn set_quota_headers(headers: &mut HeaderMap, quota: &Quota) {
    headers.insert(LIMIT, HeaderValue::from(quota.limit));
    headers.insert(REMAINING, HeaderValue::from(quota.remaining));
    headers.insert(RESET, HeaderValue::from(quota.reset));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rate_limit::RateLimitConfig;
    use axum::Router;
    use axum::body::Body;
    use axum::http::StatusCode;
    use axum::routing::get;
    use tower::ServiceExt;

    fn app(max_requests: u32) -> Router {
        let limiter = Arc::new(RateLimiter::in_memory(RateLimitConfig {
            max_requests,
            ..RateLimitConfig::default()
        }));
        Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(axum::middleware::from_fn_with_state(limiter, enforce_rate_limit))
    }

    fn request(ip: &str) -> Request {
        axum::http::Request::builder()
            .uri("/")
            .header("x-forwarded-for", ip)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn admitted_response_carries_quota() {
        let response = app(3).oneshot(request("1.2.3.4")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-ratelimit-limit"], "3");
        assert_eq!(response.headers()["x-ratelimit-remaining"], "2");
        assert_eq!(response.headers()["x-ratelimit-reset"], "60000");
    }

    #[tokio::test]
    async fn exhausted_budget_is_429() {
        let app = app(1);

        let first = app.clone().oneshot(request("1.2.3.4")).await.unwrap();
        assert_eq!(first.status(), StatusCode::OK);

        let second = app.clone().oneshot(request("1.2.3.4")).await.unwrap();
        assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(second.headers().contains_key("retry-after"));
        assert!(!second.headers().contains_key("x-ratelimit-limit"));

        let other = app.oneshot(request("5.6.7.8")).await.unwrap();
        assert_eq!(other.status(), StatusCode::OK);
    }
}
