//! Background removal of expired conversation threads and seen ids.
//!
//! Expired entries are already invisible to readers; the sweeper only
//! reclaims their memory. It runs on the tokio runtime and never blocks
//! on I/O while holding a store lock.

use context_relay_core::expiring::Sweep;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// Sweep every target once. Returns the total number of entries removed.
pub fn sweep_once(targets: &[Arc<dyn Sweep>]) -> usize {
    let mut total = 0;
    for target in targets {
        let removed = target.sweep_expired();
        if removed > 0 {
            info!(store = target.label(), removed, "swept expired entries");
        } else {
            debug!(store = target.label(), "nothing to sweep");
        }
        total += removed;
    }
    total
}

/// Sweep `targets` every `every`, starting one interval from now.
///
/// The task runs until the returned handle is aborted or the runtime
/// shuts down.
pub fn spawn_sweeper(targets: Vec<Arc<dyn Sweep>>, every: Duration) -> JoinHandle<()> {
    info!(
        interval_secs = every.as_secs(),
        targets = targets.len(),
        "sweeper started"
    );
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        interval.tick().await;

        loop {
            interval.tick().await;
            sweep_once(&targets);
        }
    })
}
