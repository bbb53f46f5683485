//! Lookback windows for counting calls that never ended.
//!
//! A window is relative; it resolves against an explicit `now` into the
//! half-open interval `[now - lookback, now - min_age)` over `started_at`.

use chrono::{DateTime, Duration, Utc};

use crate::CallRecord;

/// Relative window used by the unfinished and stale counts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CountWindow {
    /// How far back the window reaches.
    pub lookback: Duration,
    /// Calls younger than this are excluded.
    pub min_age: Duration,
}

impl CountWindow {
    pub fn new(lookback: Duration, min_age: Duration) -> Self {
        Self { lookback, min_age }
    }

    /// Window ending at `now`.
    pub fn rolling(lookback: Duration) -> Self {
        Self::new(lookback, Duration::zero())
    }

    pub fn from_secs(lookback_secs: u64, min_age_secs: u64) -> Self {
        Self::new(secs(lookback_secs), secs(min_age_secs))
    }

    /// Open calls started in the last two hours.
    pub fn unfinished_default() -> Self {
        Self::rolling(Duration::hours(2))
    }

    /// Open calls started between two hours and one hour ago.
    pub fn stale_default() -> Self {
        Self::new(Duration::hours(2), Duration::hours(1))
    }

    pub fn bounds_at(&self, now: DateTime<Utc>) -> CountWindowBounds {
        CountWindowBounds {
            lower: saturating_sub(now, self.lookback),
            upper: saturating_sub(now, self.min_age),
        }
    }
}

fn saturating_sub(now: DateTime<Utc>, d: Duration) -> DateTime<Utc> {
    now.checked_sub_signed(d).unwrap_or(DateTime::<Utc>::MIN_UTC)
}

fn secs(n: u64) -> Duration {
    const MAX_SECS: i64 = i64::MAX / 1_000;
    Duration::seconds(i64::try_from(n).unwrap_or(MAX_SECS).min(MAX_SECS))
}

/// Absolute `[lower, upper)` interval over `started_at`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CountWindowBounds {
    /// Inclusive.
    pub lower: DateTime<Utc>,
    /// Exclusive.
    pub upper: DateTime<Utc>,
}

impl CountWindowBounds {
    /// `true` when no timestamp can fall inside.
    pub fn is_empty(&self) -> bool {
        self.lower >= self.upper
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.lower <= ts && ts < self.upper
    }

    /// Whether `rec` contributes to the count: open, and started inside.
    pub fn counts(&self, rec: &CallRecord) -> bool {
        rec.is_open() && self.contains(rec.started_at)
    }
}
