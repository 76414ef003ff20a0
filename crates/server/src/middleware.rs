//! Tower middleware enforcing the two rate limit gates.
//!
//! The global layer sits outermost and draws from one shared budget; the
//! keyed layer partitions per client IP. Both populate the rate limit
//! response headers on success and produce the 429 rejection themselves,
//! so handlers never see a limited request.

use std::net::SocketAddr;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{Request, StatusCode, header};
use axum::response::{IntoResponse, Response};
use tower::{Layer, Service};

use tribune_ratelimit::{GlobalRateLimiter, RateLimitDecision, RateLimiter};

/// Bucket for requests whose client address cannot be determined.
const UNKNOWN_CLIENT: &str = "unknown";

/// Resolve the client identity a keyed limit is partitioned by.
///
/// Prefers the first entry of `X-Forwarded-For` (the gateway is expected
/// to run behind a trusted proxy), falling back to the peer address.
fn client_key(req: &Request<Body>) -> String {
    if let Some(first) = req
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
    {
        return first.to_owned();
    }

    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map_or_else(|| UNKNOWN_CLIENT.to_owned(), |info| info.0.ip().to_string())
}

/// Add rate limit metadata headers to a response.
fn apply_decision_headers(response: &mut Response, decision: &RateLimitDecision, global: bool) {
    let headers = response.headers_mut();
    if global {
        headers.insert("X-RateLimit-Global-Limit", decision.limit.into());
        headers.insert("X-RateLimit-Global-Remaining", decision.remaining.into());
        headers.insert("X-RateLimit-Global-Reset", (decision.reset_at / 1000).into());
    } else {
        headers.insert("X-RateLimit-Limit", decision.limit.into());
        headers.insert("X-RateLimit-Remaining", decision.remaining.into());
        headers.insert("X-RateLimit-Reset", (decision.reset_at / 1000).into());
    }
}

/// Build the 429 Too Many Requests response.
fn rejected_response(decision: &RateLimitDecision, message: &str, global: bool) -> Response {
    let mut body = serde_json::json!({
        "error": message,
        "retryAfter": decision.retry_after_seconds,
    });
    if global {
        body["global"] = serde_json::Value::Bool(true);
    }

    let mut response = (StatusCode::TOO_MANY_REQUESTS, axum::Json(body)).into_response();
    response
        .headers_mut()
        .insert(header::RETRY_AFTER, decision.retry_after_seconds.into());
    apply_decision_headers(&mut response, decision, global);
    response
}

/// Tower layer enforcing the keyed, per-client rate limit.
#[derive(Clone)]
pub struct RateLimitLayer {
    limiter: Option<Arc<RateLimiter>>,
}

impl RateLimitLayer {
    pub fn new(limiter: Option<Arc<RateLimiter>>) -> Self {
        Self { limiter }
    }
}

impl<S> Layer<S> for RateLimitLayer {
    type Service = RateLimitMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RateLimitMiddleware {
            inner,
            limiter: self.limiter.clone(),
        }
    }
}

/// Tower service enforcing the keyed rate limit.
#[derive(Clone)]
pub struct RateLimitMiddleware<S> {
    inner: S,
    limiter: Option<Arc<RateLimiter>>,
}

impl<S> Service<Request<Body>> for RateLimitMiddleware<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let limiter = self.limiter.clone();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let Some(limiter) = limiter else {
                // Rate limiting disabled: pass through.
                return inner.call(req).await;
            };

            let key = client_key(&req);
            let decision = limiter.check(&key);
            if !decision.allowed {
                return Ok(rejected_response(
                    &decision,
                    &limiter.config().message,
                    false,
                ));
            }

            let mut response = inner.call(req).await?;
            apply_decision_headers(&mut response, &decision, false);
            Ok(response)
        })
    }
}

/// Tower layer enforcing the global rate limit shared across all clients.
#[derive(Clone)]
pub struct GlobalRateLimitLayer {
    limiter: Option<Arc<GlobalRateLimiter>>,
}

impl GlobalRateLimitLayer {
    pub fn new(limiter: Option<Arc<GlobalRateLimiter>>) -> Self {
        Self { limiter }
    }
}

impl<S> Layer<S> for GlobalRateLimitLayer {
    type Service = GlobalRateLimitMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        GlobalRateLimitMiddleware {
            inner,
            limiter: self.limiter.clone(),
        }
    }
}

/// Tower service enforcing the global rate limit.
#[derive(Clone)]
pub struct GlobalRateLimitMiddleware<S> {
    inner: S,
    limiter: Option<Arc<GlobalRateLimiter>>,
}

impl<S> Service<Request<Body>> for GlobalRateLimitMiddleware<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let limiter = self.limiter.clone();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let Some(limiter) = limiter else {
                return inner.call(req).await;
            };

            let decision = limiter.check();
            if !decision.allowed {
                return Ok(rejected_response(
                    &decision,
                    &limiter.config().message,
                    true,
                ));
            }

            let mut response = inner.call(req).await?;
            apply_decision_headers(&mut response, &decision, true);
            Ok(response)
        })
    }
}
