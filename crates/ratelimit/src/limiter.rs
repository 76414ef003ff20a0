use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;

use tracing::debug;

use tribune_core::{Clock, SystemClock};

use crate::config::RateLimiterConfig;

/// Result of a rate limit check.
///
/// Rejection is not an error: rate limiting is an expected, frequent
/// path, so a blocked request is reported through `allowed == false`
/// rather than a failure value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitDecision {
    /// Whether the request is admitted.
    pub allowed: bool,
    /// The configured ceiling per window.
    pub limit: u64,
    /// Requests remaining in the current window.
    pub remaining: u64,
    /// Epoch milliseconds at which the current window resets.
    pub reset_at: u64,
    /// Seconds until retry makes sense; zero when allowed.
    pub retry_after_seconds: u64,
}

/// One window's worth of counting state for a key.
#[derive(Debug, Clone, Copy)]
struct WindowEntry {
    count: u64,
    window_reset_at: u64,
}

/// Count a request against an entry and produce the decision.
///
/// An entry whose reset instant has passed is logically expired and is
/// treated as empty regardless of its stored count; freshness is always
/// re-derived here, never from whether the sweep happened to run.
fn count_request(
    entry: &mut WindowEntry,
    now: u64,
    config: &RateLimiterConfig,
) -> RateLimitDecision {
    if now >= entry.window_reset_at {
        entry.count = 1;
        entry.window_reset_at = now + config.window_ms;
    } else {
        entry.count += 1;
    }

    if entry.count > config.max_requests {
        // now < window_reset_at here, so the ceiling division is >= 1.
        let retry_after = (entry.window_reset_at - now).div_ceil(1000);
        return RateLimitDecision {
            allowed: false,
            limit: config.max_requests,
            remaining: 0,
            reset_at: entry.window_reset_at,
            retry_after_seconds: retry_after,
        };
    }

    RateLimitDecision {
        allowed: true,
        limit: config.max_requests,
        remaining: config.max_requests - entry.count,
        reset_at: entry.window_reset_at,
        retry_after_seconds: 0,
    }
}

/// Fixed-window rate limiter partitioned per client identity.
///
/// Entries are created lazily on first sight of a key and expire lazily
/// on next access; a periodic sweep bounds memory by deleting entries
/// whose window has long passed. The whole read-modify-write sequence of
/// [`check`](Self::check) runs under one lock, so concurrent checks for
/// the same key can never jointly admit more than `max_requests` per
/// window.
pub struct RateLimiter {
    config: RateLimiterConfig,
    clock: Arc<dyn Clock>,
    entries: Mutex<HashMap<String, WindowEntry>>,
}

impl RateLimiter {
    /// Create a limiter backed by the system clock.
    pub fn new(config: RateLimiterConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a limiter with an injected clock (deterministic tests).
    pub fn with_clock(config: RateLimiterConfig, clock: Arc<dyn Clock>) -> Self {
        debug_assert!(config.window_ms > 0 && config.max_requests > 0);
        Self {
            config,
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &RateLimiterConfig {
        &self.config
    }

    /// Count one request for `key` and decide whether it is admitted.
    ///
    /// Exactly one call corresponds to exactly one logical request;
    /// callers must not invoke this twice for the same request.
    pub fn check(&self, key: &str) -> RateLimitDecision {
        let now = self.clock.now_millis();
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let entry = entries.entry(key.to_owned()).or_insert(WindowEntry {
            count: 0,
            // An entry born expired: count_request resets it immediately.
            window_reset_at: now,
        });
        count_request(entry, now, &self.config)
    }

    /// Delete entries whose window has already passed. Returns the number
    /// of entries removed.
    ///
    /// Purely a memory bound: correctness of [`check`](Self::check) never
    /// depends on the sweep having run. Each deletion takes the lock
    /// separately so concurrent checks are not stalled behind a long pass.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now_millis();
        let expired: Vec<String> = {
            let entries = self
                .entries
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            entries
                .iter()
                .filter(|(_, e)| e.window_reset_at <= now)
                .map(|(k, _)| k.clone())
                .collect()
        };

        let mut removed = 0;
        for key in expired {
            let mut entries = self
                .entries
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            // The entry may have been refreshed by a check in the meantime.
            if entries.get(&key).is_some_and(|e| e.window_reset_at <= now) {
                entries.remove(&key);
                removed += 1;
            }
        }
        removed
    }

    /// Number of keys currently tracked (expired or not).
    pub fn tracked_keys(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Spawn a background task sweeping expired entries on a fixed
    /// interval, independent of the window length.
    ///
    /// The task holds only a weak reference and exits once the limiter is
    /// dropped.
    pub fn spawn_sweeper(self: &Arc<Self>, interval: Duration) -> tokio::task::JoinHandle<()> {
        let limiter: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut timer = tokio::time::interval(interval);
            // The first tick completes immediately; skip it.
            timer.tick().await;
            loop {
                timer.tick().await;
                let Some(limiter) = limiter.upgrade() else {
                    break;
                };
                let removed = limiter.sweep();
                if removed > 0 {
                    debug!(removed, "rate limit sweep removed expired entries");
                }
            }
        })
    }
}

/// Fixed-window rate limiter with a single counter shared across all
/// callers.
///
/// Same counting contract as [`RateLimiter`], but any caller's traffic
/// draws down the same budget. The window resets lazily on next check,
/// which is an equivalent implementation of the fixed-window contract and
/// needs no timer of its own.
pub struct GlobalRateLimiter {
    config: RateLimiterConfig,
    clock: Arc<dyn Clock>,
    window: Mutex<WindowEntry>,
}

impl GlobalRateLimiter {
    /// Create a global limiter backed by the system clock.
    pub fn new(config: RateLimiterConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a global limiter with an injected clock.
    pub fn with_clock(config: RateLimiterConfig, clock: Arc<dyn Clock>) -> Self {
        debug_assert!(config.window_ms > 0 && config.max_requests > 0);
        Self {
            config,
            clock,
            window: Mutex::new(WindowEntry {
                count: 0,
                window_reset_at: 0,
            }),
        }
    }

    pub fn config(&self) -> &RateLimiterConfig {
        &self.config
    }

    /// Count one request against the shared window.
    pub fn check(&self) -> RateLimitDecision {
        let now = self.clock.now_millis();
        let mut window = self
            .window
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        count_request(&mut window, now, &self.config)
    }
}

#[cfg(test)]
mod tests {
    use tribune_core::ManualClock;

    use super::*;

    fn config(window_ms: u64, max_requests: u64) -> RateLimiterConfig {
        RateLimiterConfig {
            window_ms,
            max_requests,
            message: "slow down".to_owned(),
        }
    }

    #[test]
    fn first_request_is_allowed_with_full_window() {
        let clock = ManualClock::at(1_000);
        let limiter = RateLimiter::with_clock(config(60_000, 5), clock);

        let decision = limiter.check("10.0.0.1");
        assert!(decision.allowed);
        assert_eq!(decision.limit, 5);
        assert_eq!(decision.remaining, 4);
        assert_eq!(decision.reset_at, 61_000);
        assert_eq!(decision.retry_after_seconds, 0);
    }

    #[test]
    fn boundary_is_inclusive() {
        let clock = ManualClock::at(0);
        let limiter = RateLimiter::with_clock(config(60_000, 3), clock);

        // Exactly max_requests calls are all allowed.
        for expected_remaining in [2, 1, 0] {
            let decision = limiter.check("k");
            assert!(decision.allowed);
            assert_eq!(decision.remaining, expected_remaining);
        }

        // Only the (max_requests + 1)-th is rejected.
        let rejected = limiter.check("k");
        assert!(!rejected.allowed);
        assert_eq!(rejected.remaining, 0);
        assert!(rejected.retry_after_seconds > 0);
    }

    #[test]
    fn fourth_call_in_a_minute_window_retries_after_a_minute() {
        let clock = ManualClock::at(0);
        let limiter = RateLimiter::with_clock(config(60_000, 3), clock);

        for _ in 0..3 {
            assert!(limiter.check("127.0.0.1").allowed);
        }
        let rejected = limiter.check("127.0.0.1");
        assert!(!rejected.allowed);
        assert_eq!(rejected.retry_after_seconds, 60);
    }

    #[test]
    fn retry_after_rounds_up_to_whole_seconds() {
        let clock = ManualClock::at(0);
        let limiter = RateLimiter::with_clock(config(60_000, 1), clock.clone());

        limiter.check("k");
        clock.advance(Duration::from_millis(500));
        let rejected = limiter.check("k");
        assert!(!rejected.allowed);
        // 59_500 ms remaining rounds up to 60 seconds.
        assert_eq!(rejected.retry_after_seconds, 60);
    }

    #[test]
    fn window_reset_restores_the_budget() {
        let clock = ManualClock::at(0);
        let limiter = RateLimiter::with_clock(config(60_000, 2), clock.clone());

        limiter.check("k");
        limiter.check("k");
        assert!(!limiter.check("k").allowed);

        clock.advance(Duration::from_millis(60_000));
        let decision = limiter.check("k");
        assert!(decision.allowed);
        assert_eq!(decision.remaining, 1);
        assert_eq!(decision.reset_at, 120_000);
    }

    #[test]
    fn keys_are_independent() {
        let clock = ManualClock::at(0);
        let limiter = RateLimiter::with_clock(config(60_000, 1), clock);

        assert!(limiter.check("a").allowed);
        assert!(!limiter.check("a").allowed);

        // Exhausting key A never affects key B.
        assert!(limiter.check("b").allowed);
    }

    #[test]
    fn global_limiter_is_shared_across_callers_by_design() {
        let clock = ManualClock::at(0);
        let limiter = GlobalRateLimiter::with_clock(config(60_000, 2), clock);

        // Traffic attributed to one client exhausts the budget for all.
        assert!(limiter.check().allowed);
        assert!(limiter.check().allowed);
        let rejected = limiter.check();
        assert!(!rejected.allowed);
        assert!(rejected.retry_after_seconds > 0);
    }

    #[test]
    fn global_limiter_resets_after_the_window() {
        let clock = ManualClock::at(0);
        let limiter = GlobalRateLimiter::with_clock(config(1_000, 1), clock.clone());

        assert!(limiter.check().allowed);
        assert!(!limiter.check().allowed);

        clock.advance(Duration::from_millis(1_000));
        let decision = limiter.check();
        assert!(decision.allowed);
        assert_eq!(decision.remaining, 0);
    }

    #[test]
    fn sweep_removes_only_expired_entries() {
        let clock = ManualClock::at(0);
        let limiter = RateLimiter::with_clock(config(1_000, 5), clock.clone());

        limiter.check("old");
        clock.advance(Duration::from_millis(500));
        limiter.check("fresh");
        clock.advance(Duration::from_millis(600));

        // "old" reset at 1_000 <= now (1_100); "fresh" resets at 1_500.
        assert_eq!(limiter.sweep(), 1);
        assert_eq!(limiter.tracked_keys(), 1);
    }

    #[test]
    fn check_expiry_does_not_depend_on_the_sweep() {
        let clock = ManualClock::at(0);
        let limiter = RateLimiter::with_clock(config(1_000, 1), clock.clone());

        limiter.check("k");
        assert!(!limiter.check("k").allowed);

        // No sweep ran, the stored entry is stale, yet the check
        // re-derives freshness from window_reset_at alone.
        clock.advance(Duration::from_millis(1_000));
        assert!(limiter.check("k").allowed);
    }

    #[tokio::test(start_paused = true)]
    async fn sweeper_prunes_in_the_background() {
        let clock = ManualClock::at(0);
        let limiter = Arc::new(RateLimiter::with_clock(
            config(1_000, 5),
            clock.clone(),
        ));

        limiter.check("a");
        limiter.check("b");
        assert_eq!(limiter.tracked_keys(), 2);

        clock.advance(Duration::from_millis(10_000));
        let handle = limiter.spawn_sweeper(Duration::from_secs(300));

        tokio::time::sleep(Duration::from_secs(301)).await;
        tokio::task::yield_now().await;

        assert_eq!(limiter.tracked_keys(), 0);
        handle.abort();
    }
}
