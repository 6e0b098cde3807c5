//! Periodic cache sweep

use homebuilder_cache::CacheStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// Run [`CacheStore::cleanup`] every `period` until the task is aborted
pub fn spawn_cleanup_task(cache: Arc<CacheStore>, period: Duration) -> JoinHandle<()> {
    info!(period_secs = period.as_secs(), "Starting cache cleanup task");
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately
        interval.tick().await;

        loop {
            interval.tick().await;
            let report = cache.cleanup();
            debug!(
                general = report.general_removed,
                metadata = report.metadata_removed,
                "Cache cleanup tick"
            );
        }
    })
}
