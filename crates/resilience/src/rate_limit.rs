//! Token-bucket admission control for outbound upstream calls.
//!
//! One [`RateLimiter`] exists per upstream origin. The budgets are self-imposed: neither upstream
//! documents its limits, but both start refusing requests when hammered.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Budget for one origin: `capacity` requests per `refill_interval_ms`, refilled continuously.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimit {
    pub capacity: u32,
    pub refill_interval_ms: u64,
}

impl RateLimit {
    #[must_use]
    pub const fn per_minute(capacity: u32) -> Self {
        Self {
            capacity,
            refill_interval_ms: 60_000,
        }
    }
}

#[derive(Debug)]
struct TokenBucketState {
    tokens: f64,
    last_refill: Instant,
}

#[derive(Debug)]
pub struct RateLimiter {
    name: String,
    capacity: f64,
    refill_per_ms: f64,
    state: Mutex<TokenBucketState>,
}

impl RateLimiter {
    /// Create a limiter that starts with a full bucket.
    ///
    /// A zero capacity or interval is bumped to 1 so that the limiter can always admit.
    #[must_use]
    pub fn new(name: impl Into<String>, limit: RateLimit) -> Self {
        let capacity = f64::from(limit.capacity.max(1));
        #[allow(clippy::cast_precision_loss)]
        let interval_ms = limit.refill_interval_ms.max(1) as f64;
        Self {
            name: name.into(),
            capacity,
            refill_per_ms: capacity / interval_ms,
            state: Mutex::new(TokenBucketState {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    /// Wait until a token is available, then consume it.
    ///
    /// Never fails. Under sustained overload a caller may wait several rounds; there is no
    /// fairness between concurrent callers beyond scheduling order.
    pub async fn admit(&self) {
        loop {
            let wait_ms = {
                let mut state = self.state.lock();
                self.refill(&mut state, Instant::now());
                if state.tokens >= 1.0 {
                    state.tokens -= 1.0;
                    return;
                }
                (1.0 - state.tokens) / self.refill_per_ms
            };

            // Whole milliseconds, at least one: a sub-millisecond sleep would not move the clock.
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let wait = Duration::from_millis((wait_ms.ceil() as u64).max(1));
            debug!(
                limiter = %self.name,
                wait_ms = wait.as_millis() as u64,
                "rate limit budget exhausted; waiting for a token"
            );
            tokio::time::sleep(wait).await;
        }
    }

    /// Non-consuming peek, for diagnostics only.
    #[must_use]
    pub fn has_token(&self) -> bool {
        let mut state = self.state.lock();
        self.refill(&mut state, Instant::now());
        state.tokens >= 1.0
    }

    /// Current token count after refilling.
    #[must_use]
    pub fn available_tokens(&self) -> f64 {
        let mut state = self.state.lock();
        self.refill(&mut state, Instant::now());
        state.tokens
    }

    /// Restore full capacity. Test isolation only.
    pub fn reset(&self) {
        let mut state = self.state.lock();
        state.tokens = self.capacity;
        state.last_refill = Instant::now();
    }

    fn refill(&self, state: &mut TokenBucketState, now: Instant) {
        let elapsed_ms = now.saturating_duration_since(state.last_refill).as_secs_f64() * 1000.0;
        state.tokens = (state.tokens + elapsed_ms * self.refill_per_ms).min(self.capacity);
        state.last_refill = now;
    }
}
