use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tg_store::{CredentialStore, with_timeout};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Periodically reclaim expired store entries.
///
/// Expired entries already read as absent; this only bounds storage. Failures
/// are logged and retried on the next tick.
pub fn spawn(store: Arc<dyn CredentialStore>, interval: Duration, timeout: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;

            match with_timeout(timeout, "sweep.purge_expired", store.purge_expired(Utc::now())).await {
                Ok(0) => log::debug!("Store sweep: nothing expired"),
                Ok(purged) => log::info!("Store sweep purged {} expired entries", purged),
                Err(e) => log::warn!("Store sweep failed: {}", e),
            }
        }
    })
}
