//! Scenario: at-least-once delivery with concurrent duplicates
//!
//! Providers retry webhooks, so the same event can arrive several times at
//! once. Exactly one delivery may win; the rest are conflicts; exactly one
//! write happens per transition.

use cw_calls::SubmitError;
use cw_reconcile::{RawCallEvent, Rejection};
use cw_testkit::Harness;
use futures_util::future::join_all;

#[tokio::test]
async fn duplicate_starts_create_exactly_one_record() {
    let h = Harness::new();
    let ev = RawCallEvent::started("dup", "A", "B", "2024-01-01T10:00:00Z");

    let results = join_all((0..16).map(|_| h.calls.submit_event(&ev))).await;

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results.iter().filter(|r| r.is_err()).all(|r| matches!(
        r,
        Err(SubmitError::Rejected(Rejection::AlreadyStarted { .. }))
    )));
    assert_eq!(h.store.len().await, 1);
    assert_eq!(h.store.write_count().await, 1);
}

#[tokio::test]
async fn duplicate_ends_close_exactly_once() {
    let h = Harness::new();
    h.start("dup", "2024-01-01T10:00:00Z").await.unwrap();

    // Different end times: whichever wins, only one duration is ever stored.
    let events: Vec<RawCallEvent> = (1..=8)
        .map(|m| RawCallEvent::ended("dup", "A", "B", format!("2024-01-01T10:0{m}:00Z")))
        .collect();
    let results = join_all(events.iter().map(|ev| h.calls.submit_event(ev))).await;

    let winners: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
    assert_eq!(winners.len(), 1);
    assert!(results.iter().filter(|r| r.is_err()).all(|r| matches!(
        r,
        Err(SubmitError::Rejected(Rejection::AlreadyEnded { .. }))
    )));

    let stored = h.record("dup").await.unwrap();
    assert_eq!(stored.duration_ms, winners[0].duration_ms);
    assert_eq!(h.store.write_count().await, 2);
}

#[tokio::test]
async fn interleaved_calls_do_not_interfere() {
    let h = Harness::new();
    let starts: Vec<RawCallEvent> = (0..10)
        .map(|i| RawCallEvent::started(format!("call-{i}"), "A", "B", "2024-01-01T10:00:00Z"))
        .collect();
    let ends: Vec<RawCallEvent> = (0..10)
        .map(|i| RawCallEvent::ended(format!("call-{i}"), "A", "B", "2024-01-01T10:00:10Z"))
        .collect();

    let started = join_all(starts.iter().map(|ev| h.calls.submit_event(ev))).await;
    assert!(started.iter().all(|r| r.is_ok()));
    let ended = join_all(ends.iter().map(|ev| h.calls.submit_event(ev))).await;
    assert!(ended.iter().all(|r| r.is_ok()));

    for rec in h.store.snapshot().await {
        assert_eq!(rec.duration_ms, Some(10_000), "{}", rec.external_id);
    }
    assert_eq!(h.store.write_count().await, 20);
}
