#![allow(dead_code)]

//! Behaviour every `CredentialStore` adapter must share.

use tg_store::{CasOutcome, CredentialStore};

use chrono::{Duration, Utc};
use googletest::prelude::*;

pub async fn get_missing_key_returns_none(store: &dyn CredentialStore) {
    let entry = store.get("nope").await.unwrap();

    assert_that!(entry, none());
}

pub async fn insert_then_get_returns_value_and_version(store: &dyn CredentialStore) {
    let outcome = store
        .compare_and_swap("k", None, "v1".to_string(), None)
        .await
        .unwrap();

    assert_that!(outcome, eq(CasOutcome::Swapped { version: 1 }));
    let entry = store.get("k").await.unwrap().unwrap();
    assert_that!(entry.value, eq("v1"));
    assert_that!(entry.version, eq(1));
}

pub async fn insert_over_live_entry_conflicts(store: &dyn CredentialStore) {
    store
        .compare_and_swap("k", None, "v1".to_string(), None)
        .await
        .unwrap();

    let outcome = store
        .compare_and_swap("k", None, "v2".to_string(), None)
        .await
        .unwrap();

    assert_that!(outcome, eq(CasOutcome::Conflict));
    assert_that!(store.get("k").await.unwrap().unwrap().value, eq("v1"));
}

pub async fn swap_with_matching_version_bumps_version(store: &dyn CredentialStore) {
    store
        .compare_and_swap("k", None, "v1".to_string(), None)
        .await
        .unwrap();

    let outcome = store
        .compare_and_swap("k", Some(1), "v2".to_string(), None)
        .await
        .unwrap();

    assert_that!(outcome, eq(CasOutcome::Swapped { version: 2 }));
    assert_that!(store.get("k").await.unwrap().unwrap().value, eq("v2"));
}

pub async fn swap_with_stale_version_conflicts(store: &dyn CredentialStore) {
    store
        .compare_and_swap("k", None, "v1".to_string(), None)
        .await
        .unwrap();
    store
        .compare_and_swap("k", Some(1), "v2".to_string(), None)
        .await
        .unwrap();

    let outcome = store
        .compare_and_swap("k", Some(1), "v3".to_string(), None)
        .await
        .unwrap();

    assert_that!(outcome, eq(CasOutcome::Conflict));
    assert_that!(store.get("k").await.unwrap().unwrap().value, eq("v2"));
}

pub async fn swap_on_missing_key_conflicts(store: &dyn CredentialStore) {
    let outcome = store
        .compare_and_swap("ghost", Some(1), "v".to_string(), None)
        .await
        .unwrap();

    assert_that!(outcome, eq(CasOutcome::Conflict));
}

pub async fn expired_entry_is_absent_and_replaceable(store: &dyn CredentialStore) {
    let past = Utc::now() - Duration::seconds(5);
    store
        .compare_and_swap("k", None, "old".to_string(), Some(past))
        .await
        .unwrap();

    assert_that!(store.get("k").await.unwrap(), none());

    let outcome = store
        .compare_and_swap("k", None, "new".to_string(), None)
        .await
        .unwrap();

    // Version keeps growing past the expired entry
    assert_that!(outcome, eq(CasOutcome::Swapped { version: 2 }));
    assert_that!(store.get("k").await.unwrap().unwrap().value, eq("new"));
}

pub async fn stale_version_cannot_revive_expired_entry(store: &dyn CredentialStore) {
    let past = Utc::now() - Duration::seconds(5);
    store
        .compare_and_swap("k", None, "old".to_string(), Some(past))
        .await
        .unwrap();

    let outcome = store
        .compare_and_swap("k", Some(1), "zombie".to_string(), None)
        .await
        .unwrap();

    assert_that!(outcome, eq(CasOutcome::Conflict));
}

pub async fn purge_removes_only_expired_entries(store: &dyn CredentialStore) {
    let now = Utc::now();
    store
        .compare_and_swap("dead", None, "x".to_string(), Some(now - Duration::seconds(1)))
        .await
        .unwrap();
    store
        .compare_and_swap("alive", None, "y".to_string(), Some(now + Duration::hours(1)))
        .await
        .unwrap();
    store
        .compare_and_swap("forever", None, "z".to_string(), None)
        .await
        .unwrap();

    let removed = store.purge_expired(now).await.unwrap();

    assert_that!(removed, eq(1));
    assert_that!(store.get("alive").await.unwrap(), some(anything()));
    assert_that!(store.get("forever").await.unwrap(), some(anything()));
}

pub async fn delete_removes_entry(store: &dyn CredentialStore) {
    store
        .compare_and_swap("k", None, "v".to_string(), None)
        .await
        .unwrap();

    assert_that!(store.delete("k").await.unwrap(), eq(true));
    assert_that!(store.delete("k").await.unwrap(), eq(false));
    assert_that!(store.get("k").await.unwrap(), none());
}

pub async fn recreated_entry_after_purge_never_repeats_version(store: &dyn CredentialStore) {
    let ttl = Utc::now() + Duration::milliseconds(150);
    store
        .compare_and_swap("k", None, "first".to_string(), Some(ttl))
        .await
        .unwrap();
    let held = store.get("k").await.unwrap().unwrap();

    tokio::time::sleep(std::time::Duration::from_millis(250)).await;
    assert_that!(store.purge_expired(Utc::now()).await.unwrap(), eq(1));

    let recreated = store
        .compare_and_swap("k", None, "second".to_string(), None)
        .await
        .unwrap();
    assert_that!(recreated, not(eq(CasOutcome::Swapped { version: held.version })));

    let outcome = store
        .compare_and_swap("k", Some(held.version), "stale".to_string(), None)
        .await
        .unwrap();

    assert_that!(outcome, eq(CasOutcome::Conflict));
    assert_that!(store.get("k").await.unwrap().unwrap().value, eq("second"));
}

pub async fn recreated_entry_after_delete_never_repeats_version(store: &dyn CredentialStore) {
    store
        .compare_and_swap("k", None, "first".to_string(), None)
        .await
        .unwrap();
    let held = store.get("k").await.unwrap().unwrap();
    store.delete("k").await.unwrap();

    store
        .compare_and_swap("k", None, "second".to_string(), None)
        .await
        .unwrap();

    let outcome = store
        .compare_and_swap("k", Some(held.version), "stale".to_string(), None)
        .await
        .unwrap();

    assert_that!(outcome, eq(CasOutcome::Conflict));
    assert_that!(store.get("k").await.unwrap().unwrap().version, gt(held.version));
}
