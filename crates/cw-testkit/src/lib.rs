//! Shared fixtures for call-watch scenario tests.
//!
//! Everything runs against [`InMemoryCallStore`]; nothing here touches a
//! database or the wall clock.

use std::fs;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, TimeZone, Utc};
use cw_calls::{CallService, InMemoryCallStore, MetricsWindows, SubmitError};
use cw_reconcile::{CallRecord, RawCallEvent};

/// The instant every scenario treats as "now": 2024-01-01T12:00:00Z.
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0)
        .single()
        .expect("fixed instant is unambiguous in UTC")
}

/// RFC 3339 text for `minutes` before `now`.
pub fn minutes_before(now: DateTime<Utc>, minutes: i64) -> String {
    (now - Duration::minutes(minutes)).to_rfc3339()
}

/// In-memory store + service over it.
pub struct Harness {
    pub store: Arc<InMemoryCallStore>,
    pub calls: CallService,
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

impl Harness {
    pub fn new() -> Self {
        Self::with_windows(MetricsWindows::default())
    }

    pub fn with_windows(windows: MetricsWindows) -> Self {
        let store = Arc::new(InMemoryCallStore::new());
        let calls = CallService::with_windows(store.clone(), windows);
        Self { store, calls }
    }

    pub async fn start(&self, call_id: &str, at: &str) -> Result<CallRecord, SubmitError> {
        self.calls
            .submit_event(&RawCallEvent::started(call_id, "A", "B", at))
            .await
    }

    pub async fn end(&self, call_id: &str, at: &str) -> Result<CallRecord, SubmitError> {
        self.calls
            .submit_event(&RawCallEvent::ended(call_id, "A", "B", at))
            .await
    }

    /// Current record for `call_id`, bypassing the service.
    pub async fn record(&self, call_id: &str) -> Option<CallRecord> {
        self.store
            .snapshot()
            .await
            .into_iter()
            .find(|r| r.external_id == call_id)
    }

    /// Submit events in order; every outcome is kept.
    pub async fn replay(&self, events: &[RawCallEvent]) -> Vec<Result<CallRecord, SubmitError>> {
        let mut out = Vec::with_capacity(events.len());
        for ev in events {
            out.push(self.calls.submit_event(ev).await);
        }
        out
    }
}

/// Load provider events from a JSON-lines file (one event object per line;
/// blank lines and `#` comments skipped).
pub fn load_events_jsonl(path: &str) -> Result<Vec<RawCallEvent>> {
    let raw = fs::read_to_string(path).with_context(|| format!("read events: {path}"))?;
    let mut out = Vec::new();
    for (i, line) in raw.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let ev: RawCallEvent = serde_json::from_str(line)
            .with_context(|| format!("parse event at {path}:{}", i + 1))?;
        out.push(ev);
    }
    Ok(out)
}
