use chrono::{DateTime, Utc};

use crate::{CallEdge, CallEvent, CallRecord, NewCall, Rejection};

/// The single transition an event is allowed to cause.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Decision {
    /// Insert a new open record.
    Create(NewCall),
    /// Close the open record for `external_id`.
    Close {
        external_id: String,
        ended_at: DateTime<Utc>,
        duration_ms: i64,
    },
    /// Refuse the event; no write may happen.
    Reject(Rejection),
}

impl Decision {
    pub fn is_reject(&self) -> bool {
        matches!(self, Decision::Reject(_))
    }
}

/// Decision table over {absent, open, closed} x {started, ended}:
///
/// | existing | event   | outcome                                   |
/// |----------|---------|-------------------------------------------|
/// | absent   | ended   | reject NotFound                           |
/// | absent   | started | create                                    |
/// | open     | started | reject AlreadyStarted                     |
/// | open     | ended   | close, or reject EndBeforeStart           |
/// | closed   | ended   | reject AlreadyEnded                       |
/// | closed   | started | reject AlreadyStarted                     |
///
/// Duration is measured from the stored `started_at`.
/// Stateless; the same inputs always produce the same output.
pub fn decide(event: &CallEvent, existing: Option<&CallRecord>) -> Decision {
    let external_id = event.external_id.clone();

    match (existing, event.edge) {
        (None, CallEdge::Ended(_)) => Decision::Reject(Rejection::NotFound { external_id }),

        (None, CallEdge::Started(started_at)) => Decision::Create(NewCall {
            external_id,
            from: event.from.clone(),
            to: event.to.clone(),
            started_at,
        }),

        (Some(_), CallEdge::Started(_)) => {
            Decision::Reject(Rejection::AlreadyStarted { external_id })
        }

        (Some(rec), CallEdge::Ended(ended_at)) if rec.is_open() => {
            match duration_ms(rec.started_at, ended_at) {
                Some(duration_ms) => Decision::Close {
                    external_id,
                    ended_at,
                    duration_ms,
                },
                None => Decision::Reject(Rejection::EndBeforeStart {
                    external_id,
                    started_at: rec.started_at,
                    ended_at,
                }),
            }
        }

        (Some(_), CallEdge::Ended(_)) => Decision::Reject(Rejection::AlreadyEnded { external_id }),
    }
}

/// Exact elapsed milliseconds, or `None` when `ended_at` precedes `started_at`.
///
/// Sub-millisecond remainders are truncated; ordering is checked on the full
/// timestamps so a sub-millisecond inversion still counts as end-before-start.
pub fn duration_ms(started_at: DateTime<Utc>, ended_at: DateTime<Utc>) -> Option<i64> {
    if ended_at < started_at {
        return None;
    }
    Some(ended_at.signed_duration_since(started_at).num_milliseconds())
}
