mod common;

use tg_store::{CasOutcome, CredentialStore, MemoryStore, StoreError, get_json, with_timeout};

use std::sync::Arc;

use chrono::{Duration, Utc};

#[tokio::test]
async fn test_memory_get_missing_key() {
    common::get_missing_key_returns_none(&MemoryStore::new()).await;
}

#[tokio::test]
async fn test_memory_insert_then_get() {
    common::insert_then_get_returns_value_and_version(&MemoryStore::new()).await;
}

#[tokio::test]
async fn test_memory_insert_over_live_entry() {
    common::insert_over_live_entry_conflicts(&MemoryStore::new()).await;
}

#[tokio::test]
async fn test_memory_swap_matching_version() {
    common::swap_with_matching_version_bumps_version(&MemoryStore::new()).await;
}

#[tokio::test]
async fn test_memory_swap_stale_version() {
    common::swap_with_stale_version_conflicts(&MemoryStore::new()).await;
}

#[tokio::test]
async fn test_memory_swap_missing_key() {
    common::swap_on_missing_key_conflicts(&MemoryStore::new()).await;
}

#[tokio::test]
async fn test_memory_expired_entry() {
    common::expired_entry_is_absent_and_replaceable(&MemoryStore::new()).await;
}

#[tokio::test]
async fn test_memory_stale_version_after_expiry() {
    common::stale_version_cannot_revive_expired_entry(&MemoryStore::new()).await;
}

#[tokio::test]
async fn test_memory_purge() {
    let store = MemoryStore::new();
    common::purge_removes_only_expired_entries(&store).await;

    assert_eq!(store.len().await, 2);
}

#[tokio::test]
async fn test_memory_delete() {
    common::delete_removes_entry(&MemoryStore::new()).await;
}

#[tokio::test]
async fn test_memory_recreate_after_purge_gets_fresh_version() {
    common::recreated_entry_after_purge_never_repeats_version(&MemoryStore::new()).await;
}

#[tokio::test]
async fn test_memory_recreate_after_delete_gets_fresh_version() {
    common::recreated_entry_after_delete_never_repeats_version(&MemoryStore::new()).await;
}

#[tokio::test]
async fn test_memory_concurrent_swaps_have_single_winner() {
    let store = Arc::new(MemoryStore::new());
    store
        .compare_and_swap("k", None, "v0".to_string(), None)
        .await
        .unwrap();

    let mut handles = Vec::new();
    for i in 0..16 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store
                .compare_and_swap("k", Some(1), format!("v{i}"), None)
                .await
                .unwrap()
        }));
    }

    let outcomes = futures::future::join_all(handles).await;
    let winners = outcomes
        .into_iter()
        .map(|outcome| outcome.unwrap())
        .filter(CasOutcome::is_swapped)
        .count();

    assert_eq!(winners, 1);
}

#[tokio::test]
async fn test_memory_len_counts_unpurged_expired_entries() {
    let store = MemoryStore::new();
    store
        .compare_and_swap("k", None, "v".to_string(), Some(Utc::now() - Duration::seconds(1)))
        .await
        .unwrap();

    assert_eq!(store.len().await, 1);
    store.purge_expired(Utc::now()).await.unwrap();
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_with_timeout_passes_fast_calls_through() {
    let store = MemoryStore::new();

    let entry = with_timeout(
        std::time::Duration::from_secs(1),
        "get",
        store.get("missing"),
    )
    .await
    .unwrap();

    assert!(entry.is_none());
}

#[tokio::test]
async fn test_with_timeout_turns_slow_calls_into_retryable_error() {
    let slow = async {
        tokio::time::sleep(std::time::Duration::from_millis(200)).await;
        Ok::<_, StoreError>(())
    };

    let error = with_timeout(std::time::Duration::from_millis(20), "slow_op", slow)
        .await
        .unwrap_err();

    assert!(matches!(error, StoreError::Timeout { operation: "slow_op", .. }));
    assert!(error.is_retryable());
}

#[tokio::test]
async fn test_with_timeout_reports_the_calling_line() {
    let slow = async {
        tokio::time::sleep(std::time::Duration::from_millis(200)).await;
        Ok::<_, StoreError>(())
    };

    let expected_line = line!() + 1;
    let pending = with_timeout(std::time::Duration::from_millis(20), "slow_op", slow);
    let error = pending.await.unwrap_err();

    match error {
        StoreError::Timeout { location, .. } => {
            assert_eq!(location.file, file!());
            assert_eq!(location.line, expected_line);
        }
        other => panic!("Expected Timeout, got {other:?}"),
    }
}

#[tokio::test]
async fn test_undecodable_entry_reports_the_reading_line() {
    let store = MemoryStore::new();
    store
        .compare_and_swap("k", None, "not json".to_string(), None)
        .await
        .unwrap();

    let error = get_json::<u32>(&store, "k").await.unwrap_err();

    match error {
        StoreError::Serialization { key, location, .. } => {
            assert_eq!(key, "k");
            assert_eq!(location.file, file!());
        }
        other => panic!("Expected Serialization, got {other:?}"),
    }
}
