use chrono::{DateTime, Utc};

use crate::InvalidEvent;

/// Failure taxonomy shared by the core and every boundary that maps it.
///
/// Boundaries translate the kind into their own vocabulary (HTTP status,
/// exit code, ...); the core never does.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed or missing event fields. Caller fixes and resends.
    InvalidInput,
    /// Event contradicts the stored state of the call.
    Conflict,
    /// End event for a call that was never started.
    NotFound,
    /// The store could not complete a read or write.
    StoreFailure,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::Conflict => "conflict",
            ErrorKind::NotFound => "not_found",
            ErrorKind::StoreFailure => "store_failure",
        }
    }
}

/// Why an event was refused. Every variant leaves the store untouched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Rejection {
    Invalid(InvalidEvent),
    /// A record already exists (open or closed) for a "started" event.
    AlreadyStarted { external_id: String },
    /// The record is already closed.
    AlreadyEnded { external_id: String },
    /// The end timestamp precedes the stored start timestamp.
    EndBeforeStart {
        external_id: String,
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
    },
    /// No record exists for an "ended" event.
    NotFound { external_id: String },
}

impl Rejection {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Rejection::Invalid(_) => ErrorKind::InvalidInput,
            Rejection::AlreadyStarted { .. }
            | Rejection::AlreadyEnded { .. }
            | Rejection::EndBeforeStart { .. } => ErrorKind::Conflict,
            Rejection::NotFound { .. } => ErrorKind::NotFound,
        }
    }

    /// Short stable tag for logs.
    pub fn code(&self) -> &'static str {
        match self {
            Rejection::Invalid(_) => "invalid_event",
            Rejection::AlreadyStarted { .. } => "already_started",
            Rejection::AlreadyEnded { .. } => "already_ended",
            Rejection::EndBeforeStart { .. } => "end_before_start",
            Rejection::NotFound { .. } => "not_found",
        }
    }
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rejection::Invalid(reason) => write!(f, "{reason}"),
            Rejection::AlreadyStarted { external_id } => {
                write!(f, "Call {external_id} was already started")
            }
            Rejection::AlreadyEnded { external_id } => {
                write!(f, "Call {external_id} was already ended")
            }
            Rejection::EndBeforeStart {
                started_at,
                ended_at,
                ..
            } => write!(
                f,
                "Invalid event: End time cannot be before start time \
                 (started={}, ended={})",
                started_at.to_rfc3339(),
                ended_at.to_rfc3339()
            ),
            Rejection::NotFound { external_id } => {
                write!(f, "Cannot end call {external_id} - not found")
            }
        }
    }
}

impl std::error::Error for Rejection {}

impl From<InvalidEvent> for Rejection {
    fn from(reason: InvalidEvent) -> Self {
        Rejection::Invalid(reason)
    }
}
