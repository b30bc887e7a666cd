//! Housekeeping Task
//!
//! Background task that periodically drops expired recipes, expired cached
//! responses and stale admission records. All three are also handled lazily
//! on access; this only bounds memory.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::api::AppState;

/// Spawns a background task that sweeps the caches and admission records of
/// `state` every `cleanup_interval_secs` seconds.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
///
/// # Example
/// ```ignore
/// let handle = spawn_cleanup_task(state.clone(), 60);
/// // Later, during shutdown:
/// handle.abort();
/// ```
pub fn spawn_cleanup_task(state: AppState, cleanup_interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(cleanup_interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting housekeeping task with interval of {} seconds",
            interval.as_secs()
        );

        loop {
            tokio::time::sleep(interval).await;

            let expired = state.cache.cleanup_expired().await;
            let responses = state.responses.cleanup_expired().await;
            let stale = state.admission.sweep_expired();

            if expired > 0 || responses > 0 || stale > 0 {
                info!(
                    "Housekeeping: removed {} expired entries, {} cached responses, {} stale admission records",
                    expired, responses, stale
                );
            } else {
                debug!("Housekeeping: nothing to remove");
            }
        }
    })
}
