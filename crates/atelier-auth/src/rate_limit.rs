//! Fixed-window request rate limiting.
//!
//! Counting is delegated to a [`CounterStore`] so deployments can back it
//! with a shared store; [`MemoryCounterStore`] serves a single process.
//! When the store fails the limiter lets the request through.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use atelier_core::error::{AtelierError, AtelierResult};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Requests allowed per key within one window.
    pub max_requests: u64,
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 100,
            window_secs: 60,
        }
    }
}

#[derive(Debug, Error)]
#[error("counter store unavailable: {0}")]
pub struct CounterStoreError(pub String);

/// Atomic increment-with-expiry.
pub trait CounterStore: Send + Sync {
    /// Increment the counter for `key` and return the count within the
    /// current window. A new window starts once `window` has elapsed
    /// since the first hit.
    fn increment(
        &self,
        key: &str,
        window: Duration,
    ) -> impl Future<Output = Result<u64, CounterStoreError>> + Send;
}

#[derive(Debug)]
struct Window {
    started: Instant,
    count: u64,
}

#[derive(Debug, Default)]
pub struct MemoryCounterStore {
    windows: RwLock<HashMap<String, Window>>,
}

impl MemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CounterStore for MemoryCounterStore {
    async fn increment(&self, key: &str, window: Duration) -> Result<u64, CounterStoreError> {
        let now = Instant::now();
        let mut windows = self
            .windows
            .write()
            .map_err(|e| CounterStoreError(e.to_string()))?;

        let entry = windows.entry(key.to_string()).or_insert(Window {
            started: now,
            count: 0,
        });
        if now.duration_since(entry.started) >= window {
            entry.started = now;
            entry.count = 0;
        }
        entry.count += 1;
        Ok(entry.count)
    }
}

pub struct RateLimiter<S: CounterStore> {
    store: S,
    config: RateLimitConfig,
}

impl<S: CounterStore> RateLimiter<S> {
    pub fn new(store: S, config: RateLimitConfig) -> Self {
        Self { store, config }
    }

    /// Count a request against `key`. Returns `RateLimited` once the key
    /// exceeds `max_requests` in the current window.
    pub async fn check(&self, key: &str) -> AtelierResult<()> {
        let window = Duration::from_secs(self.config.window_secs);
        match self.store.increment(key, window).await {
            Ok(count) if count > self.config.max_requests => {
                debug!(key, count, "rate limit exceeded");
                Err(AtelierError::RateLimited)
            }
            Ok(_) => Ok(()),
            Err(e) => {
                warn!(key, error = %e, "rate limit store failed, allowing request");
                Ok(())
            }
        }
    }
}
