use std::time::{Duration, Instant};

/// Outcome of one throttle check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrottleDecision {
    /// Whether the request may proceed
    pub allowed: bool,

    /// Requests left in the current window after this one
    pub remaining: u32,

    /// Time until the window resets
    pub reset_in: Duration,
}

/// Fixed-window token bucket for one client identity
///
/// Time is always passed in explicitly so callers (and tests) control the clock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThrottleBucket {
    /// Tokens left in the current window
    pub tokens: u32,

    /// When the current window started
    pub window_start: Instant,
}

impl ThrottleBucket {
    /// Creates a bucket for a request arriving at `now`
    ///
    /// That request consumes one token immediately.
    pub fn fresh(capacity: u32, now: Instant) -> Self {
        Self {
            tokens: capacity.saturating_sub(1),
            window_start: now,
        }
    }

    /// Time elapsed since the window started
    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.window_start)
    }

    /// Whether the window is over and the bucket should be reset
    ///
    /// A window that has lasted exactly `window` is over, so a denied request
    /// always has a strictly positive wait.
    pub fn is_expired(&self, window: Duration, now: Instant) -> bool {
        self.age(now) >= window
    }

    /// Whether the bucket has been idle long enough to be swept
    pub fn is_stale(&self, window: Duration, now: Instant) -> bool {
        self.age(now) > window.saturating_mul(2)
    }

    /// Time until the window resets
    pub fn reset_in(&self, window: Duration, now: Instant) -> Duration {
        window.saturating_sub(self.age(now))
    }

    /// Takes a token if one is left in the current window
    ///
    /// Callers must reset expired buckets first.
    pub fn try_take(&mut self, window: Duration, now: Instant) -> ThrottleDecision {
        let reset_in = self.reset_in(window, now);

        if self.tokens == 0 {
            return ThrottleDecision {
                allowed: false,
                remaining: 0,
                reset_in,
            };
        }

        self.tokens -= 1;
        ThrottleDecision {
            allowed: true,
            remaining: self.tokens,
            reset_in,
        }
    }
}
