//! Cache Sweeper
//!
//! Background task that periodically drops expired retired orders. Lookups
//! already treat expired entries as absent, so sweeping only bounds how long
//! expired orders keep their memory.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::InFlightOrderTracker;

/// Spawn the sweeper on the current tokio runtime.
///
/// The task runs until `shutdown` is cancelled.
pub fn spawn_cache_sweeper(
    tracker: Arc<InFlightOrderTracker>,
    interval: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let purged = tracker.purge_expired();
                    if purged > 0 {
                        tracing::debug!(purged, "Swept expired orders from cache");
                    }
                }
                () = shutdown.cancelled() => {
                    tracing::info!("Cache sweeper shutting down");
                    break;
                }
            }
        }
    })
}
