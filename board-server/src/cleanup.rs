//! Background eviction of expired cache entries.
//!
//! Expired entries are already treated as misses on read; the sweeper exists
//! so entries nobody reads again don't accumulate.

use crate::cache::BoardCache;
use crate::config::CacheConfig;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Spawn the periodic cache sweep task. Returns `None` when sweeping is
/// disabled in the configuration.
pub fn spawn_cache_sweeper(
    cache: Arc<BoardCache>,
    config: &CacheConfig,
) -> Option<JoinHandle<()>> {
    if !config.sweep_enabled {
        info!("cache sweeper disabled");
        return None;
    }

    let interval = Duration::from_secs(config.sweep_interval_secs);
    info!(interval_secs = config.sweep_interval_secs, "cache sweeper started");
    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let evicted = cache.sweep();
            if evicted > 0 {
                debug!(evicted, remaining = cache.len(), "swept expired cache entries");
            }
        }
    }))
}
