//! Scenario: the stale sweep reports and never mutates.
//!
//! # Invariants under test
//!
//! 1. `sweep_once` returns the stale count for the configured window.
//! 2. Records are unchanged and no write happens.
//! 3. A store outage is returned, not swallowed.
//! 4. `metrics_windows` maps config seconds onto both windows.

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use cw_calls::{CallService, InMemoryCallStore};
use cw_config::MetricsSection;
use cw_daemon::state::{metrics_windows, sweep_once};
use cw_reconcile::{CountWindow, RawCallEvent};

#[tokio::test]
async fn sweep_counts_without_writing() {
    let store = Arc::new(InMemoryCallStore::new());
    let calls = CallService::new(store.clone());
    let now = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();

    for (id, m) in [("a", 90), ("b", 75), ("c", 10)] {
        let ts = (now - Duration::minutes(m)).to_rfc3339();
        calls
            .submit_event(&RawCallEvent::started(id, "A", "B", ts))
            .await
            .unwrap();
    }
    let before = store.snapshot().await;
    let writes = store.write_count().await;

    assert_eq!(sweep_once(&calls, now).await.unwrap(), 2);
    assert_eq!(store.snapshot().await, before);
    assert_eq!(store.write_count().await, writes);
}

#[tokio::test]
async fn sweep_surfaces_store_failure() {
    let store = Arc::new(InMemoryCallStore::new());
    let calls = CallService::new(store.clone());
    store.set_unavailable(true).await;

    assert!(sweep_once(&calls, Utc::now()).await.is_err());
}

#[test]
fn metrics_windows_follow_config() {
    let w = metrics_windows(&MetricsSection {
        unfinished_lookback_secs: 600,
        stale_lookback_secs: 900,
        stale_min_age_secs: 300,
    });
    assert_eq!(w.unfinished, CountWindow::from_secs(600, 0));
    assert_eq!(w.stale, CountWindow::from_secs(900, 300));

    let defaults = metrics_windows(&MetricsSection::default());
    assert_eq!(defaults.unfinished, CountWindow::unfinished_default());
    assert_eq!(defaults.stale, CountWindow::stale_default());
}
