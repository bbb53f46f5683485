use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Stored call
// ---------------------------------------------------------------------------

/// One row per physical call, keyed by the provider's call identifier.
///
/// `ended_at` and `duration_ms` are set together, exactly once, when the call
/// is closed. Everything else is fixed at creation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallRecord {
    /// Opaque handle assigned by the store at creation.
    pub internal_id: Uuid,
    /// Provider-supplied call identifier (unique).
    pub external_id: String,
    pub from: String,
    pub to: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    /// `ended_at - started_at` in milliseconds; never negative.
    pub duration_ms: Option<i64>,
}

/// Lifecycle position of a stored call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallState {
    Open,
    Closed,
}

impl CallState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallState::Open => "open",
            CallState::Closed => "closed",
        }
    }
}

impl CallRecord {
    /// Build the open record a store persists for `call`.
    pub fn open(internal_id: Uuid, call: NewCall) -> Self {
        Self {
            internal_id,
            external_id: call.external_id,
            from: call.from,
            to: call.to,
            started_at: call.started_at,
            ended_at: None,
            duration_ms: None,
        }
    }

    pub fn state(&self) -> CallState {
        if self.ended_at.is_some() {
            CallState::Closed
        } else {
            CallState::Open
        }
    }

    pub fn is_open(&self) -> bool {
        self.state() == CallState::Open
    }

    /// Return the closed form of this record. Callers must only close open records.
    pub fn closed(mut self, ended_at: DateTime<Utc>, duration_ms: i64) -> Self {
        self.ended_at = Some(ended_at);
        self.duration_ms = Some(duration_ms);
        self
    }
}

/// Fields copied verbatim from a "started" event into a new open record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewCall {
    pub external_id: String,
    pub from: String,
    pub to: String,
    pub started_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Event exactly as delivered by the telephony provider's webhook.
///
/// Every field is optional here so the validator, not the decoder, decides
/// what is missing and reports it with a specific reason.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawCallEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended: Option<String>,
}

impl RawCallEvent {
    pub fn started(
        call_id: impl Into<String>,
        from: impl Into<String>,
        to: impl Into<String>,
        started: impl Into<String>,
    ) -> Self {
        Self {
            call_id: Some(call_id.into()),
            from: Some(from.into()),
            to: Some(to.into()),
            started: Some(started.into()),
            ended: None,
        }
    }

    pub fn ended(
        call_id: impl Into<String>,
        from: impl Into<String>,
        to: impl Into<String>,
        ended: impl Into<String>,
    ) -> Self {
        Self {
            call_id: Some(call_id.into()),
            from: Some(from.into()),
            to: Some(to.into()),
            started: None,
            ended: Some(ended.into()),
        }
    }
}

/// Which lifecycle edge a validated event reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallEdge {
    Started(DateTime<Utc>),
    Ended(DateTime<Utc>),
}

impl CallEdge {
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            CallEdge::Started(ts) | CallEdge::Ended(ts) => *ts,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CallEdge::Started(_) => "started",
            CallEdge::Ended(_) => "ended",
        }
    }
}

/// A structurally valid event. Carries exactly one lifecycle edge.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallEvent {
    pub external_id: String,
    pub from: String,
    pub to: String,
    pub edge: CallEdge,
}
