//! In-memory [`CallStore`] for tests and local runs without a database.
//!
//! Every operation runs under one mutex, which makes the conditional writes
//! atomic in the same sense the Postgres store's single statements are.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use cw_reconcile::{CallRecord, CountWindowBounds, NewCall};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::store::{CallStore, CloseOutcome, CreateOutcome, StoreError};

#[derive(Default)]
struct Inner {
    by_external_id: BTreeMap<String, CallRecord>,
    writes: u64,
    unavailable: bool,
}

impl Inner {
    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable {
            return Err(StoreError::new("in-memory store marked unavailable"));
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryCallStore {
    inner: Mutex<Inner>,
}

impl InMemoryCallStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful inserts + updates so far.
    pub async fn write_count(&self) -> u64 {
        self.inner.lock().await.writes
    }

    /// All records, ordered by external id.
    pub async fn snapshot(&self) -> Vec<CallRecord> {
        self.inner
            .lock()
            .await
            .by_external_id
            .values()
            .cloned()
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.by_external_id.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Simulate an outage: every call fails with a [`StoreError`] until cleared.
    pub async fn set_unavailable(&self, unavailable: bool) {
        self.inner.lock().await.unavailable = unavailable;
    }
}

#[async_trait]
impl CallStore for InMemoryCallStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn find_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<CallRecord>, StoreError> {
        let inner = self.inner.lock().await;
        inner.check_available()?;
        Ok(inner.by_external_id.get(external_id).cloned())
    }

    async fn find_by_internal_id(
        &self,
        internal_id: Uuid,
    ) -> Result<Option<CallRecord>, StoreError> {
        let inner = self.inner.lock().await;
        inner.check_available()?;
        Ok(inner
            .by_external_id
            .values()
            .find(|r| r.internal_id == internal_id)
            .cloned())
    }

    async fn create_open(&self, call: NewCall) -> Result<CreateOutcome, StoreError> {
        let mut inner = self.inner.lock().await;
        inner.check_available()?;

        if let Some(existing) = inner.by_external_id.get(&call.external_id) {
            return Ok(CreateOutcome::AlreadyExists(existing.clone()));
        }

        let rec = CallRecord::open(Uuid::new_v4(), call);
        inner
            .by_external_id
            .insert(rec.external_id.clone(), rec.clone());
        inner.writes += 1;
        Ok(CreateOutcome::Created(rec))
    }

    async fn close_open(
        &self,
        external_id: &str,
        ended_at: DateTime<Utc>,
        duration_ms: i64,
    ) -> Result<CloseOutcome, StoreError> {
        let mut inner = self.inner.lock().await;
        inner.check_available()?;

        let Some(current) = inner.by_external_id.get(external_id).cloned() else {
            return Ok(CloseOutcome::NotFound);
        };
        if !current.is_open() {
            return Ok(CloseOutcome::AlreadyClosed(current));
        }

        let closed = current.closed(ended_at, duration_ms);
        inner
            .by_external_id
            .insert(external_id.to_string(), closed.clone());
        inner.writes += 1;
        Ok(CloseOutcome::Closed(closed))
    }

    async fn count_open_in_window(&self, bounds: &CountWindowBounds) -> Result<u64, StoreError> {
        let inner = self.inner.lock().await;
        inner.check_available()?;
        Ok(inner
            .by_external_id
            .values()
            .filter(|r| bounds.counts(r))
            .count() as u64)
    }
}
