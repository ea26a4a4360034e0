use crate::Result as StoreResult;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// A live (unexpired) value together with its optimistic-concurrency version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredEntry {
    pub value: String,
    pub version: u64,
    pub expires_at: Option<DateTime<Utc>>,
}

impl StoredEntry {
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_none_or(|expires_at| expires_at > now)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CasOutcome {
    /// The write landed; `version` is the entry's new version.
    Swapped { version: u64 },
    /// Another writer got there first, or the expected version no longer exists.
    Conflict,
}

impl CasOutcome {
    pub fn is_swapped(&self) -> bool {
        matches!(self, Self::Swapped { .. })
    }
}

/// Durable home of refresh-token lineages and rate windows.
///
/// Every mutation goes through `compare_and_swap`, which must be atomic at the
/// store itself: an in-process lock is not enough once several processes share
/// the backing database. Expired entries behave exactly like absent ones.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn get(&self, key: &str) -> StoreResult<Option<StoredEntry>>;

    /// Write `value` under `key` if the live entry's version equals `expected_version`.
    ///
    /// `None` means "only if no live entry exists". Versions come from a
    /// store-wide counter: a key that is deleted or purged and then written
    /// again never gets back a version it held before.
    async fn compare_and_swap(
        &self,
        key: &str,
        expected_version: Option<u64>,
        value: String,
        expires_at: Option<DateTime<Utc>>,
    ) -> StoreResult<CasOutcome>;

    async fn delete(&self, key: &str) -> StoreResult<bool>;

    /// Reclaim every entry whose expiry is at or before `now`.
    async fn purge_expired(&self, now: DateTime<Utc>) -> StoreResult<u64>;

    async fn ping(&self) -> StoreResult<()>;

    fn backend_name(&self) -> &'static str;
}
