//! Background sweep evicting rooms idle beyond the TTL.

use std::sync::Arc;

use rand::Rng;
use tokio::task::JoinHandle;
use tokio::time::{self, Duration};

use crate::Registry;

/// Reaper cadence and eviction threshold.
#[derive(Debug, Clone)]
pub struct ReaperConfig {
    /// How often the sweep runs.
    pub interval: Duration,
    /// Rooms idle at least this long are evicted.
    pub ttl: Duration,
    /// Random extra delay (0..max) before the first sweep, so several
    /// coordinators started at the same instant don't sweep in
    /// lockstep.
    pub startup_jitter: Duration,
}

impl Default for ReaperConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10 * 60),
            ttl: Duration::from_secs(60 * 60),
            startup_jitter: Duration::from_secs(30),
        }
    }
}

/// Spawns the reaper task.
///
/// Runs forever on its own schedule; each pass works from a snapshot of
/// room ids, so registry operations never wait on a sweep in progress.
pub fn spawn_reaper(registry: Arc<Registry>, config: ReaperConfig) -> JoinHandle<()> {
    tokio::spawn(async move {
        let jitter = if config.startup_jitter.is_zero() {
            Duration::ZERO
        } else {
            config
                .startup_jitter
                .mul_f64(rand::rng().random_range(0.0..1.0))
        };
        tracing::debug!(
            interval = ?config.interval,
            ttl = ?config.ttl,
            "reaper started"
        );
        time::sleep(config.interval + jitter).await;

        loop {
            let reaped = registry.sweep(config.ttl).await;
            if reaped.is_empty() {
                tracing::trace!("reaper pass found nothing to evict");
            } else {
                tracing::info!(count = reaped.len(), "reaper evicted idle rooms");
            }
            time::sleep(config.interval).await;
        }
    })
}
