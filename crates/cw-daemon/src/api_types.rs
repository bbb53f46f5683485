//! Request and response bodies for the cw-daemon HTTP endpoints.
//!
//! Field names are part of the provider-facing contract; no logic lives here.

use cw_reconcile::CallRecord;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// /v1/health
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub service: &'static str,
    pub version: &'static str,
    pub uptime_secs: u64,
}

// ---------------------------------------------------------------------------
// POST /events
// ---------------------------------------------------------------------------

/// Body returned when an event was applied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventAccepted {
    /// Always "ok".
    pub status: String,
    /// The record as stored after the event.
    pub call: CallRecord,
}

// ---------------------------------------------------------------------------
// GET /metrics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsResponse {
    /// Open calls started inside the unfinished window.
    pub latest_unfinished_calls: u64,
    /// Open calls started inside the stale window.
    pub stale_calls: u64,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
