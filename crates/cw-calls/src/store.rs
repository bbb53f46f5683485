//! Store boundary for call records.
//!
//! This module defines **only** the trait and its outcome types. No SQL and
//! no reconciliation rules belong here.
//!
//! # Atomicity
//! Creation and finalisation are conditional writes. A store must make
//! "insert if absent" and "close if open" single atomic operations and report
//! the state it actually found when the condition fails, so that two
//! deliveries racing on the same call cannot both win.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use cw_reconcile::{CallRecord, CountWindowBounds, NewCall};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Opaque store failure (connectivity, unexpected constraint, ...).
///
/// The message is for logs only; callers never branch on its contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreError {
    message: String,
}

impl StoreError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "call store failure: {}", self.message)
    }
}

impl std::error::Error for StoreError {}

// ---------------------------------------------------------------------------
// Conditional write outcomes
// ---------------------------------------------------------------------------

/// Result of an insert-if-absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    /// The row was inserted.
    Created(CallRecord),
    /// A row with the same external id already existed; nothing was written.
    AlreadyExists(CallRecord),
}

/// Result of a close-if-open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseOutcome {
    /// The open row was closed.
    Closed(CallRecord),
    /// The row was already closed; nothing was written.
    AlreadyClosed(CallRecord),
    /// No row exists for the external id.
    NotFound,
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Persistence collaborator consumed by [`crate::CallService`].
///
/// Implementations own their connection lifecycle; the service never
/// constructs or tears one down.
#[async_trait]
pub trait CallStore: Send + Sync {
    /// Short backend label for logs and health output.
    fn backend_name(&self) -> &'static str;

    async fn find_by_external_id(&self, external_id: &str)
        -> Result<Option<CallRecord>, StoreError>;

    async fn find_by_internal_id(&self, internal_id: Uuid)
        -> Result<Option<CallRecord>, StoreError>;

    /// Atomically insert an open record unless one exists for the external id.
    async fn create_open(&self, call: NewCall) -> Result<CreateOutcome, StoreError>;

    /// Atomically close the record if it is still open.
    async fn close_open(
        &self,
        external_id: &str,
        ended_at: DateTime<Utc>,
        duration_ms: i64,
    ) -> Result<CloseOutcome, StoreError>;

    /// Count open records with `bounds.lower <= started_at < bounds.upper`.
    async fn count_open_in_window(&self, bounds: &CountWindowBounds) -> Result<u64, StoreError>;
}
