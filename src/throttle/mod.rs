//! Per-client request throttling
//!
//! A fixed-window token bucket keyed by client identity guards the
//! enrichment endpoint. Buckets live behind the [`ThrottleStore`] trait so
//! tests can build isolated instances and a deployment running several
//! instances can swap in a shared store. [`MemoryThrottleStore`] is
//! process-local and best-effort.

mod bucket;

pub use bucket::{ThrottleBucket, ThrottleDecision};

use crate::config::ThrottleConfig;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Storage backend for throttle buckets
///
/// Implementations must make `check` atomic per client identity: two
/// simultaneous requests from the same client must not both spend the last
/// token.
pub trait ThrottleStore: Send + Sync {
    /// Records a request from `client_id` at `now` and decides whether it may proceed
    fn check(&self, client_id: &str, now: Instant) -> ThrottleDecision;

    /// Removes buckets idle for more than two windows, returning how many were removed
    fn sweep(&self, now: Instant) -> usize;

    /// Number of client identities currently tracked
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory [`ThrottleStore`] guarded by a mutex
#[derive(Debug)]
pub struct MemoryThrottleStore {
    capacity: u32,
    window: Duration,
    buckets: Mutex<HashMap<String, ThrottleBucket>>,
}

impl MemoryThrottleStore {
    pub fn new(capacity: u32, window: Duration) -> Self {
        Self {
            capacity,
            window,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(config: &ThrottleConfig) -> Self {
        Self::new(config.capacity, config.window())
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    fn buckets(&self) -> std::sync::MutexGuard<'_, HashMap<String, ThrottleBucket>> {
        // A panic while holding the lock cannot leave a bucket half-updated
        self.buckets.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ThrottleStore for MemoryThrottleStore {
    fn check(&self, client_id: &str, now: Instant) -> ThrottleDecision {
        let mut buckets = self.buckets();

        if let Some(bucket) = buckets.get_mut(client_id) {
            if !bucket.is_expired(self.window, now) {
                return bucket.try_take(self.window, now);
            }
        }

        let bucket = ThrottleBucket::fresh(self.capacity, now);
        let remaining = bucket.tokens;
        buckets.insert(client_id.to_string(), bucket);

        ThrottleDecision {
            allowed: true,
            remaining,
            reset_in: self.window,
        }
    }

    fn sweep(&self, now: Instant) -> usize {
        let mut buckets = self.buckets();
        let before = buckets.len();
        buckets.retain(|_, bucket| !bucket.is_stale(self.window, now));
        let removed = before - buckets.len();

        if removed > 0 {
            tracing::debug!(removed, remaining = buckets.len(), "Swept stale throttle buckets");
        }
        removed
    }

    fn len(&self) -> usize {
        self.buckets().len()
    }
}
