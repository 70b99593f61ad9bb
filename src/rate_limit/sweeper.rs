use std::sync::Arc;
use std::time::Instant;

use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::RateLimiter;

/// Spawn the periodic cleanup of expired records.
///
/// The task runs every `cleanup_interval` until `shutdown` is cancelled. It
/// only touches the store through `sweep`, which takes the same per-key locks
/// as `admit`.
pub fn spawn_sweeper(limiter: Arc<RateLimiter>, shutdown: CancellationToken) -> JoinHandle<()> {
    let period = limiter.config().cleanup_interval;

    tokio::spawn(async move {
        // first tick one full period out, not immediately
        let mut ticker = interval_at(tokio::time::Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(interval = ?period, "rate limit sweeper started");

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    let removed = limiter.sweep(Instant::now());
                    debug!(removed, remaining = limiter.store().len(), "rate limit sweep");
                }
            }
        }

        info!("rate limit sweeper stopped");
    })
}
