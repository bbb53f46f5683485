//! Event shape validation.
//!
//! Runs before any store lookup. Rules are checked in a fixed order and the
//! first failure wins:
//!
//! 1. `call_id` present and non-blank
//! 2. exactly one of `started` / `ended` (only `None` or `""` is absent)
//! 3. the present timestamp parses
//! 4. `from` present and non-blank
//! 5. `to` present and non-blank

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::{CallEdge, CallEvent, RawCallEvent};

/// ISO 8601 layouts with an explicit offset that RFC 3339 refuses
/// (basic `+hhmm` offsets, minute precision).
const OFFSET_LAYOUTS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M%z",
    "%Y-%m-%dT%H:%M%:z",
];

/// Offset-less layouts. Interpreted as UTC.
const NAIVE_LAYOUTS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Why an event was rejected before reaching the decision table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvalidEvent {
    MissingCallId,
    BothTimestamps,
    NoTimestamp,
    InvalidStarted { value: String },
    InvalidEnded { value: String },
    MissingFrom,
    MissingTo,
}

impl std::fmt::Display for InvalidEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvalidEvent::MissingCallId => write!(f, "Invalid event: Missing call_id"),
            InvalidEvent::BothTimestamps => write!(
                f,
                "Invalid event: Cannot have both started and ended timestamps"
            ),
            InvalidEvent::NoTimestamp => write!(
                f,
                "Invalid event: Must have either started or ended timestamp"
            ),
            InvalidEvent::InvalidStarted { value } => write!(
                f,
                "Invalid event: Invalid started timestamp format '{value}'"
            ),
            InvalidEvent::InvalidEnded { value } => {
                write!(f, "Invalid event: Invalid ended timestamp format '{value}'")
            }
            InvalidEvent::MissingFrom => write!(f, "Invalid event: Missing from number"),
            InvalidEvent::MissingTo => write!(f, "Invalid event: Missing to number"),
        }
    }
}

impl std::error::Error for InvalidEvent {}

/// Validate a provider event. Pure; no side effects.
///
/// Identifiers are kept verbatim; blank (whitespace-only) identifiers count
/// as absent. A whitespace-only timestamp is present and fails to parse.
pub fn validate_event(raw: &RawCallEvent) -> Result<CallEvent, InvalidEvent> {
    let external_id = non_blank(&raw.call_id).ok_or(InvalidEvent::MissingCallId)?;

    let edge = match (non_empty(&raw.started), non_empty(&raw.ended)) {
        (Some(_), Some(_)) => return Err(InvalidEvent::BothTimestamps),
        (None, None) => return Err(InvalidEvent::NoTimestamp),
        (Some(s), None) => CallEdge::Started(parse_timestamp(s).ok_or_else(|| {
            InvalidEvent::InvalidStarted {
                value: s.to_string(),
            }
        })?),
        (None, Some(e)) => CallEdge::Ended(parse_timestamp(e).ok_or_else(|| {
            InvalidEvent::InvalidEnded {
                value: e.to_string(),
            }
        })?),
    };

    let from = non_blank(&raw.from).ok_or(InvalidEvent::MissingFrom)?;
    let to = non_blank(&raw.to).ok_or(InvalidEvent::MissingTo)?;

    Ok(CallEvent {
        external_id: external_id.to_string(),
        from: from.to_string(),
        to: to.to_string(),
        edge,
    })
}

/// Parse a provider timestamp into UTC.
///
/// RFC 3339 and ISO 8601 offsets are normalised to UTC. Offset-less
/// date-times, `Z`-suffixed minute-precision times and bare dates (midnight)
/// are taken as UTC. Returns `None` for anything else.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Some(dt) = OFFSET_LAYOUTS
        .iter()
        .find_map(|layout| DateTime::parse_from_str(s, layout).ok())
    {
        return Some(dt.with_timezone(&Utc));
    }

    let naive = s.strip_suffix(|c: char| c == 'Z' || c == 'z').unwrap_or(s);
    if let Some(dt) = NAIVE_LAYOUTS
        .iter()
        .find_map(|layout| NaiveDateTime::parse_from_str(naive, layout).ok())
    {
        return Some(dt.and_utc());
    }
    NaiveDate::parse_from_str(naive, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

fn non_blank(v: &Option<String>) -> Option<&str> {
    v.as_deref().filter(|s| !s.trim().is_empty())
}

fn non_empty(v: &Option<String>) -> Option<&str> {
    v.as_deref().filter(|s| !s.is_empty())
}
