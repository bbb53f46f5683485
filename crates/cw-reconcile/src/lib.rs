//! cw-reconcile
//!
//! Call lifecycle reconciliation: decides, given an incoming provider event
//! and the stored view of the matching call, which single transition is legal.
//!
//! Rules:
//! - Structurally invalid events are rejected before any state lookup
//! - A "started" event creates an open call when none exists
//! - An "ended" event closes an open call exactly once
//! - Duration is measured against the *stored* start time, never the event's
//! - End-before-start is rejected, not clamped
//!
//! Deterministic, pure logic. No IO. No clock.

mod engine;
mod error;
mod types;
mod validate;
mod window;

pub use engine::{decide, duration_ms, Decision};
pub use error::{ErrorKind, Rejection};
pub use types::{CallEdge, CallEvent, CallRecord, CallState, NewCall, RawCallEvent};
pub use validate::{parse_timestamp, validate_event, InvalidEvent};
pub use window::{CountWindow, CountWindowBounds};
