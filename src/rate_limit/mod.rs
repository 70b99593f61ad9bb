//! Per-client sliding-window rate limiting.
//!
//! Every inbound request is counted against its client identity. A client
//! gets `max_requests` within a window of `window` length that starts at its
//! first request; the window restarts on the first request after it closes.

mod client;
mod middleware;
mod store;
mod sweeper;

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::metrics::{RATE_LIMIT_CLIENTS, RATE_LIMITED_TOTAL};

pub use client::{UNKNOWN_CLIENT, client_id};
pub use middleware::enforce_rate_limit;
pub use store::{MemoryStore, RateRecord, RateStore};
pub use sweeper::spawn_sweeper;

/// Limiter settings. The defaults are 100 requests per minute with a
/// five-minute sweep.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window: Duration,
    pub cleanup_interval: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 100,
            window: Duration::from_millis(60_000),
            cleanup_interval: Duration::from_millis(300_000),
        }
    }
}

// Values for the X-RateLimit-* headers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quota {
    pub limit: u32,
    pub remaining: u32,
    /// Milliseconds for the first request of a window, seconds afterwards.
    pub reset: u64,
}

// Outcome of a single admit call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed(Quota),
    Limited { retry_after_secs: u64 },
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allowed(_))
    }
}

pub struct RateLimiter {
    store: Arc<dyn RateStore>,
    config: RateLimitConfig,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn RateStore>, config: RateLimitConfig) -> Self {
        Self { store, config }
    }

    pub fn in_memory(config: RateLimitConfig) -> Self {
        Self::new(Arc::new(MemoryStore::new()), config)
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn RateStore> {
        &self.store
    }

    /// Count one request from `client` at `now` and decide whether it may
    /// proceed. The read-check-increment runs under the store's key lock.
    pub fn admit(&self, client: &str, now: Instant) -> Decision {
        let max = self.config.max_requests;
        let window = self.config.window;
        let mut created = false;
        let mut decision = Decision::Limited { retry_after_secs: 0 };

        self.store.update(client, &mut |slot| {
            if let Some(record) = slot.as_mut().filter(|r| !r.is_expired(now)) {
                decision = if record.count >= max {
                    Decision::Limited {
                        retry_after_secs: ceil_secs(record.reset_time, now),
                    }
                } else {
                    record.count += 1;
                    Decision::Allowed(Quota {
                        limit: max,
                        remaining: max.saturating_sub(record.count),
                        reset: ceil_secs(record.reset_time, now),
                    })
                };
                return;
            }

            // first request, or the previous window has closed
            created = true;
            *slot = Some(RateRecord {
                count: 1,
                reset_time: now + window,
            });
            decision = Decision::Allowed(Quota {
                limit: max,
                remaining: max.saturating_sub(1),
                reset: window.as_millis() as u64,
            });
        });

        if created {
            RATE_LIMIT_CLIENTS.set(self.store.len() as f64);
        }
        if let Decision::Limited { retry_after_secs } = decision {
            RATE_LIMITED_TOTAL.inc();
            debug!(client, retry_after_secs, limit = max, "rate limit exceeded");
        }

        decision
    }

    /// Remove every record whose window closed before `now`.
    pub fn sweep(&self, now: Instant) -> usize {
        let removed = self.store.sweep(now);
        RATE_LIMIT_CLIENTS.set(self.store.len() as f64);
        removed
    }
}

// ceil((reset - now) / 1000) on millisecond resolution
fn ceil_secs(reset_time: Instant, now: Instant) -> u64 {
    let millis = reset_time.saturating_duration_since(now).as_millis() as u64;
    millis.div_ceil(1000)
}
