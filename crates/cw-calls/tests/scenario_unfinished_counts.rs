//! Scenario: Unfinished and stale counts
//!
//! # Invariants under test
//!
//! 1. Two open calls started 90 and 30 minutes before `now`: the stale window
//!    `[now-2h, now-1h)` counts 1, the unfinished window `[now-2h, now)` counts 2.
//! 2. Closed calls never count.
//! 3. Calls outside the lookback never count.
//! 4. Counting is a pure read (no writes).
//! 5. An empty window short-circuits to zero without touching the store.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use cw_calls::{CallService, InMemoryCallStore, MetricsWindows};
use cw_reconcile::{CountWindow, RawCallEvent};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
}

fn minutes_ago(m: i64) -> String {
    (now() - Duration::minutes(m)).to_rfc3339()
}

async fn start(svc: &CallService, id: &str, m: i64) {
    svc.submit_event(&RawCallEvent::started(id, "A", "B", minutes_ago(m)))
        .await
        .expect("start accepted");
}

#[tokio::test]
async fn ninety_and_thirty_minute_calls() {
    let store = Arc::new(InMemoryCallStore::new());
    let svc = CallService::new(store.clone());

    start(&svc, "old", 90).await;
    start(&svc, "young", 30).await;
    let writes = store.write_count().await;

    assert_eq!(svc.stale_count(now()).await.unwrap(), 1);
    assert_eq!(svc.unfinished_count(now()).await.unwrap(), 2);
    assert_eq!(store.write_count().await, writes, "counting must not write");
}

#[tokio::test]
async fn closed_and_out_of_window_calls_excluded() {
    let store = Arc::new(InMemoryCallStore::new());
    let svc = CallService::new(store.clone());

    start(&svc, "closed", 90).await;
    svc.submit_event(&RawCallEvent::ended("closed", "A", "B", minutes_ago(80)))
        .await
        .unwrap();
    start(&svc, "ancient", 60 * 5).await;
    start(&svc, "stuck", 100).await;

    assert_eq!(svc.stale_count(now()).await.unwrap(), 1);
    assert_eq!(svc.unfinished_count(now()).await.unwrap(), 1);
}

#[tokio::test]
async fn configured_windows_are_used() {
    let store = Arc::new(InMemoryCallStore::new());
    let svc = CallService::with_windows(
        store.clone(),
        MetricsWindows {
            unfinished: CountWindow::from_secs(6 * 3600, 0),
            stale: CountWindow::from_secs(6 * 3600, 4 * 3600),
        },
    );

    start(&svc, "five-hours", 5 * 60).await;
    start(&svc, "ninety", 90).await;

    assert_eq!(svc.unfinished_count(now()).await.unwrap(), 2);
    assert_eq!(svc.stale_count(now()).await.unwrap(), 1);
}

#[tokio::test]
async fn empty_window_never_reaches_store() {
    let store = Arc::new(InMemoryCallStore::new());
    let svc = CallService::with_windows(
        store.clone(),
        MetricsWindows {
            unfinished: CountWindow::from_secs(3600, 3600),
            stale: CountWindow::from_secs(60, 3600),
        },
    );
    store.set_unavailable(true).await;

    assert_eq!(svc.unfinished_count(now()).await.unwrap(), 0);
    assert_eq!(svc.stale_count(now()).await.unwrap(), 0);
}

#[tokio::test]
async fn store_outage_propagates_from_counts() {
    let store = Arc::new(InMemoryCallStore::new());
    let svc = CallService::new(store.clone());
    store.set_unavailable(true).await;

    assert!(svc.unfinished_count(now()).await.is_err());
}
