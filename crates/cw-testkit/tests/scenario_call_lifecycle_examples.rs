//! Scenario: the reference walk-through of one call's life
//!
//! 1. Start on an empty store creates an open record.
//! 2. A matching end closes it with durationMs = 300000.
//! 3. A repeated start is a conflict; the store is unchanged after the first.
//! 4. An end for an unknown call is not-found.
//! 5. An end before the start is rejected and the record stays open.
//! 6. Open calls 90 and 30 minutes old: the stale window counts only the first.

use cw_calls::SubmitError;
use cw_reconcile::{ErrorKind, Rejection};
use cw_testkit::{fixed_now, minutes_before, Harness};

#[tokio::test]
async fn start_on_empty_store_creates_open_record() {
    let h = Harness::new();

    let rec = h.start("c1", "2024-01-01T10:00:00Z").await.unwrap();

    assert_eq!(rec.external_id, "c1");
    assert!(rec.ended_at.is_none());
    assert_eq!(h.store.len().await, 1);
}

#[tokio::test]
async fn end_closes_with_five_minutes() {
    let h = Harness::new();
    h.start("c1", "2024-01-01T10:00:00Z").await.unwrap();

    let rec = h.end("c1", "2024-01-01T10:05:00Z").await.unwrap();

    assert_eq!(rec.duration_ms, Some(300_000));
    assert_eq!(h.record("c1").await, Some(rec));
}

#[tokio::test]
async fn repeated_start_is_conflict_and_store_unchanged() {
    let h = Harness::new();
    h.start("c1", "2024-01-01T10:00:00Z").await.unwrap();
    let after_first = h.store.snapshot().await;

    let err = h.start("c1", "2024-01-01T10:00:00Z").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(h.store.snapshot().await, after_first);
}

#[tokio::test]
async fn end_without_record_is_not_found() {
    let h = Harness::new();

    let err = h.end("c2", "2024-01-01T10:00:00Z").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(err.to_string(), "Cannot end call c2 - not found");
    assert!(h.store.is_empty().await);
}

#[tokio::test]
async fn end_before_start_rejected_record_open() {
    let h = Harness::new();
    h.start("c3", "2024-01-01T10:00:00Z").await.unwrap();

    let err = h.end("c3", "2024-01-01T09:59:00Z").await.unwrap_err();

    assert!(matches!(
        err,
        SubmitError::Rejected(Rejection::EndBeforeStart { .. })
    ));
    let rec = h.record("c3").await.unwrap();
    assert!(rec.is_open());
    assert!(rec.duration_ms.is_none());
}

#[tokio::test]
async fn stale_window_counts_only_the_older_call() {
    let h = Harness::new();
    let now = fixed_now();
    h.start("old", &minutes_before(now, 90)).await.unwrap();
    h.start("young", &minutes_before(now, 30)).await.unwrap();

    assert_eq!(h.calls.stale_count(now).await.unwrap(), 1);
    assert_eq!(h.calls.unfinished_count(now).await.unwrap(), 2);
}
