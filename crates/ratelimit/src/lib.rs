//! In-memory fixed-window rate limiting.
//!
//! Two variants of the same counting scheme: a keyed limiter partitioned
//! per client identity, and a global limiter with one shared counter. A
//! check never fails; rejection is an ordinary return value carrying the
//! metadata an HTTP layer needs for `X-RateLimit-*` headers.

pub mod config;
pub mod limiter;

pub use config::RateLimiterConfig;
pub use limiter::{GlobalRateLimiter, RateLimitDecision, RateLimiter};
