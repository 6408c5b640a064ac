//! Retention service for time-based data purge.
//!
//! Expired entries already read as absent; this background task reclaims
//! their rows from the database once an hour.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use super::kv::KeyValueStore;

const PURGE_INTERVAL: Duration = Duration::from_secs(3600);

/// Spawn the retention purge background task.
#[must_use]
pub fn spawn_retention_task(
    store: Arc<dyn KeyValueStore>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(PURGE_INTERVAL);
        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    info!("retention task shutting down");
                    break;
                }
                _ = interval.tick() => {
                    match store.purge_expired().await {
                        Ok(purged) => info!(purged, "retention purge completed"),
                        Err(err) => error!(?err, "retention purge failed"),
                    }
                }
            }
        }
    })
}
