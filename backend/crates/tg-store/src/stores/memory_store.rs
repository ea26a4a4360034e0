use crate::{CasOutcome, CredentialStore, Result as StoreResult, StoredEntry};

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::debug;
use tokio::sync::RwLock;

/// Process-local credential store.
///
/// Compare-and-swap is atomic under the write lock, which is sufficient for a
/// single process. Deployments running several processes must use `SqliteStore`
/// (or another shared backend) so the atomicity lives in the store.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<MemoryState>>,
}

#[derive(Default)]
struct MemoryState {
    entries: HashMap<String, StoredEntry>,
    /// Last version handed out by any swap. Never reset, so a key that is
    /// purged and re-created cannot repeat a version an old reader holds.
    last_version: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries held, including expired ones not yet purged.
    pub async fn len(&self) -> usize {
        self.inner.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.entries.is_empty()
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn get(&self, key: &str) -> StoreResult<Option<StoredEntry>> {
        let now = Utc::now();
        let inner = self.inner.read().await;

        Ok(inner
            .entries
            .get(key)
            .filter(|entry| entry.is_live_at(now))
            .cloned())
    }

    async fn compare_and_swap(
        &self,
        key: &str,
        expected_version: Option<u64>,
        value: String,
        expires_at: Option<DateTime<Utc>>,
    ) -> StoreResult<CasOutcome> {
        let now = Utc::now();
        let mut inner = self.inner.write().await;

        let live_version = inner
            .entries
            .get(key)
            .filter(|entry| entry.is_live_at(now))
            .map(|entry| entry.version);

        if live_version != expected_version {
            return Ok(CasOutcome::Conflict);
        }

        inner.last_version += 1;
        let version = inner.last_version;
        inner.entries.insert(
            key.to_string(),
            StoredEntry {
                value,
                version,
                expires_at,
            },
        );

        Ok(CasOutcome::Swapped { version })
    }

    async fn delete(&self, key: &str) -> StoreResult<bool> {
        Ok(self.inner.write().await.entries.remove(key).is_some())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> StoreResult<u64> {
        let mut inner = self.inner.write().await;
        let before = inner.entries.len();
        inner.entries.retain(|_, entry| entry.is_live_at(now));
        let removed = (before - inner.entries.len()) as u64;

        if removed > 0 {
            debug!("Purged {removed} expired entries from memory store");
        }

        Ok(removed)
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
