//! Shared runtime state for cw-daemon.
//!
//! Handlers receive `State<Arc<AppState>>` from Axum. The call service owns
//! the store handle; this module only wires it up and runs the stale sweep.

use std::time::Duration;

use chrono::{DateTime, Utc};
use cw_calls::{CallService, MetricsWindows, StoreError};
use cw_config::MetricsSection;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

// ---------------------------------------------------------------------------
// BuildInfo
// ---------------------------------------------------------------------------

/// Static build metadata included in health responses.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BuildInfo {
    pub service: &'static str,
    pub version: &'static str,
}

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct AppState {
    pub build: BuildInfo,
    pub calls: CallService,
}

impl AppState {
    pub fn new(calls: CallService) -> Self {
        Self {
            build: BuildInfo {
                service: "cw-daemon",
                version: env!("CARGO_PKG_VERSION"),
            },
            calls,
        }
    }
}

/// Count windows from the `metrics` config section.
pub fn metrics_windows(cfg: &MetricsSection) -> MetricsWindows {
    MetricsWindows::from_secs(
        cfg.unfinished_lookback_secs,
        cfg.stale_lookback_secs,
        cfg.stale_min_age_secs,
    )
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Seconds since first call (process lifetime).
pub fn uptime_secs() -> u64 {
    static START: std::sync::OnceLock<std::time::Instant> = std::sync::OnceLock::new();
    START
        .get_or_init(std::time::Instant::now)
        .elapsed()
        .as_secs()
}

/// One pass of the stale sweep: count and log. Never writes.
pub async fn sweep_once(calls: &CallService, now: DateTime<Utc>) -> Result<u64, StoreError> {
    match calls.stale_count(now).await {
        Ok(0) => {
            debug!("stale sweep: no stale calls");
            Ok(0)
        }
        Ok(n) => {
            let w = calls.windows().stale;
            warn!(
                stale_calls = n,
                min_age_secs = w.min_age.num_seconds(),
                lookback_secs = w.lookback.num_seconds(),
                "stale sweep: open calls past the stale threshold"
            );
            Ok(n)
        }
        Err(e) => {
            error!(
                backend = calls.store().backend_name(),
                "stale sweep failed: {}",
                e.message()
            );
            Err(e)
        }
    }
}

/// Run [`sweep_once`] every `interval` until the runtime shuts down.
pub fn spawn_stale_sweep(calls: CallService, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            // Failures are logged inside; the next tick retries.
            let _ = sweep_once(&calls, Utc::now()).await;
        }
    })
}
