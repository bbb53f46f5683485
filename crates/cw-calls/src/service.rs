//! Call event service: validate -> look up -> decide -> one conditional write.
//!
//! Each submission performs at most one lookup and at most one write. No
//! retries happen here; every failure is surfaced to the boundary as-is.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use cw_reconcile::{
    decide, validate_event, CallEvent, CallRecord, CountWindow, Decision, ErrorKind,
    RawCallEvent, Rejection,
};
use tracing::{error, info, warn};

use crate::store::{CallStore, CloseOutcome, CreateOutcome, StoreError};

// ---------------------------------------------------------------------------
// SubmitError
// ---------------------------------------------------------------------------

/// Failure returned by [`CallService::submit_event`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    /// Event refused by validation or by the decision table. Nothing was written.
    Rejected(Rejection),
    /// The store failed; outcome of any attempted write is the store's concern.
    Store(StoreError),
}

impl SubmitError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SubmitError::Rejected(r) => r.kind(),
            SubmitError::Store(_) => ErrorKind::StoreFailure,
        }
    }
}

impl std::fmt::Display for SubmitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubmitError::Rejected(r) => write!(f, "{r}"),
            SubmitError::Store(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for SubmitError {}

impl From<StoreError> for SubmitError {
    fn from(e: StoreError) -> Self {
        SubmitError::Store(e)
    }
}

impl From<Rejection> for SubmitError {
    fn from(r: Rejection) -> Self {
        SubmitError::Rejected(r)
    }
}

// ---------------------------------------------------------------------------
// MetricsWindows
// ---------------------------------------------------------------------------

/// Windows used by the unfinished and stale counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsWindows {
    pub unfinished: CountWindow,
    pub stale: CountWindow,
}

impl MetricsWindows {
    /// Unfinished window `[now - unfinished_lookback, now)`; stale window
    /// `[now - stale_lookback, now - stale_min_age)`.
    pub fn from_secs(
        unfinished_lookback_secs: u64,
        stale_lookback_secs: u64,
        stale_min_age_secs: u64,
    ) -> Self {
        Self {
            unfinished: CountWindow::from_secs(unfinished_lookback_secs, 0),
            stale: CountWindow::from_secs(stale_lookback_secs, stale_min_age_secs),
        }
    }
}

impl Default for MetricsWindows {
    fn default() -> Self {
        Self {
            unfinished: CountWindow::unfinished_default(),
            stale: CountWindow::stale_default(),
        }
    }
}

// ---------------------------------------------------------------------------
// CallService
// ---------------------------------------------------------------------------

/// Cloneable handle over an injected [`CallStore`].
#[derive(Clone)]
pub struct CallService {
    store: Arc<dyn CallStore>,
    windows: MetricsWindows,
}

impl CallService {
    pub fn new(store: Arc<dyn CallStore>) -> Self {
        Self::with_windows(store, MetricsWindows::default())
    }

    pub fn with_windows(store: Arc<dyn CallStore>, windows: MetricsWindows) -> Self {
        Self { store, windows }
    }

    pub fn store(&self) -> &Arc<dyn CallStore> {
        &self.store
    }

    pub fn windows(&self) -> MetricsWindows {
        self.windows
    }

    /// Validate a provider event and apply it.
    pub async fn submit_event(&self, raw: &RawCallEvent) -> Result<CallRecord, SubmitError> {
        let event = match validate_event(raw) {
            Ok(ev) => ev,
            Err(reason) => {
                let rejection = Rejection::Invalid(reason);
                warn!(
                    call_id = raw.call_id.as_deref().unwrap_or(""),
                    code = rejection.code(),
                    "call event rejected: {rejection}"
                );
                return Err(rejection.into());
            }
        };
        self.apply_event(event).await
    }

    /// Apply an already validated event.
    pub async fn apply_event(&self, event: CallEvent) -> Result<CallRecord, SubmitError> {
        let result = self.reconcile(&event).await;
        match &result {
            Ok(rec) => info!(
                call_id = %rec.external_id,
                edge = event.edge.as_str(),
                state = rec.state().as_str(),
                duration_ms = ?rec.duration_ms,
                "call event applied"
            ),
            Err(SubmitError::Rejected(r)) => warn!(
                call_id = %event.external_id,
                edge = event.edge.as_str(),
                code = r.code(),
                "call event rejected: {r}"
            ),
            Err(SubmitError::Store(e)) => error!(
                call_id = %event.external_id,
                edge = event.edge.as_str(),
                backend = self.store.backend_name(),
                "call store failure: {}",
                e.message()
            ),
        }
        result
    }

    async fn reconcile(&self, event: &CallEvent) -> Result<CallRecord, SubmitError> {
        let existing = self.store.find_by_external_id(&event.external_id).await?;

        match decide(event, existing.as_ref()) {
            Decision::Reject(r) => Err(r.into()),

            Decision::Create(call) => match self.store.create_open(call).await? {
                CreateOutcome::Created(rec) => Ok(rec),
                CreateOutcome::AlreadyExists(current) => Err(lost_race(event, Some(current))),
            },

            Decision::Close {
                external_id,
                ended_at,
                duration_ms,
            } => match self
                .store
                .close_open(&external_id, ended_at, duration_ms)
                .await?
            {
                CloseOutcome::Closed(rec) => Ok(rec),
                CloseOutcome::AlreadyClosed(current) => Err(lost_race(event, Some(current))),
                CloseOutcome::NotFound => Err(lost_race(event, None)),
            },
        }
    }

    /// Open calls inside the unfinished window at `now`.
    pub async fn unfinished_count(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        self.count_in(self.windows.unfinished, now).await
    }

    /// Open calls inside the stale window at `now`.
    pub async fn stale_count(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        self.count_in(self.windows.stale, now).await
    }

    async fn count_in(&self, window: CountWindow, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let bounds = window.bounds_at(now);
        if bounds.is_empty() {
            return Ok(0);
        }
        self.store.count_open_in_window(&bounds).await
    }
}

/// The conditional write found a different state than the lookup did.
/// Re-run the table against what the store reported; no further IO.
fn lost_race(event: &CallEvent, current: Option<CallRecord>) -> SubmitError {
    match decide(event, current.as_ref()) {
        Decision::Reject(r) => SubmitError::Rejected(r),
        other => SubmitError::Store(StoreError::new(format!(
            "conditional write refused but reported state permits {other:?} for call {}",
            event.external_id
        ))),
    }
}
