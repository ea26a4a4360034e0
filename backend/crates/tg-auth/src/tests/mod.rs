mod codec;

use crate::{AuthorityConfig, SessionAuthority, TokenCodec};

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tg_core::{IdentityClaims, Role};
use tg_store::{
    CasOutcome, CredentialStore, MemoryStore, Result as StoreResult, StoreError, StoredEntry,
};

pub(crate) const TEST_SECRET: &[u8] = b"test-secret-key-at-least-32-bytes";

pub(crate) fn cliente(id: &str) -> IdentityClaims {
    IdentityClaims::new(id, format!("{id}@example.com"), Role::Cliente, "Test User")
}

pub(crate) fn authority_with(
    store: Arc<dyn CredentialStore>,
    config: AuthorityConfig,
) -> SessionAuthority {
    let codec = TokenCodec::new(TEST_SECRET, 0).unwrap();
    SessionAuthority::new(store, codec, config).unwrap()
}

pub(crate) fn authority() -> (SessionAuthority, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let authority = authority_with(store.clone(), AuthorityConfig::default());
    (authority, store)
}

pub(crate) fn short_refresh_config(refresh_ttl: Duration) -> AuthorityConfig {
    AuthorityConfig {
        refresh_ttl,
        ..AuthorityConfig::default()
    }
}

/// Memory store that can be switched into an outage: every call fails with
/// `StoreError::Unavailable`, or hangs when `stalled` is set.
#[derive(Default)]
pub(crate) struct OutageStore {
    inner: MemoryStore,
    down: AtomicBool,
    stalled: AtomicBool,
    calls: AtomicU32,
}

impl OutageStore {
    pub(crate) fn go_down(&self) {
        self.down.store(true, Ordering::SeqCst);
    }

    pub(crate) fn stall(&self) {
        self.stalled.store(true, Ordering::SeqCst);
    }

    pub(crate) fn recover(&self) {
        self.down.store(false, Ordering::SeqCst);
        self.stalled.store(false, Ordering::SeqCst);
    }

    /// Store calls seen so far, failed ones included.
    pub(crate) fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    async fn gate(&self) -> StoreResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.stalled.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_secs(60)).await;
        }
        if self.down.load(Ordering::SeqCst) {
            return Err(StoreError::unavailable("connection refused"));
        }
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for OutageStore {
    async fn get(&self, key: &str) -> StoreResult<Option<StoredEntry>> {
        self.gate().await?;
        self.inner.get(key).await
    }

    async fn compare_and_swap(
        &self,
        key: &str,
        expected_version: Option<u64>,
        value: String,
        expires_at: Option<DateTime<Utc>>,
    ) -> StoreResult<CasOutcome> {
        self.gate().await?;
        self.inner
            .compare_and_swap(key, expected_version, value, expires_at)
            .await
    }

    async fn delete(&self, key: &str) -> StoreResult<bool> {
        self.gate().await?;
        self.inner.delete(key).await
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> StoreResult<u64> {
        self.gate().await?;
        self.inner.purge_expired(now).await
    }

    async fn ping(&self) -> StoreResult<()> {
        self.gate().await
    }

    fn backend_name(&self) -> &'static str {
        "outage"
    }
}
