//! `cw calls` handlers.
//!
//! `submit` goes through the same validation and reconciliation path as the
//! daemon's `POST /events`, so operators can replay a webhook by hand.

use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use chrono::Utc;
use cw_calls::{CallService, CallStore, MetricsWindows};
use cw_db::PgCallStore;
use cw_reconcile::{validate_event, CallRecord, RawCallEvent};
use uuid::Uuid;

use super::{connect, load_service_config};

async fn open_service(config_paths: &[String]) -> Result<CallService> {
    let cfg = load_service_config(config_paths)?;
    let pool = connect(&cfg).await?;
    let store: Arc<dyn CallStore> = Arc::new(PgCallStore::new(pool));
    let m = &cfg.metrics;
    Ok(CallService::with_windows(
        store,
        MetricsWindows::from_secs(
            m.unfinished_lookback_secs,
            m.stale_lookback_secs,
            m.stale_min_age_secs,
        ),
    ))
}

fn print_call(rec: &CallRecord) -> Result<()> {
    let out = serde_json::to_string_pretty(rec).context("serialize call record failed")?;
    println!("{out}");
    Ok(())
}

pub async fn calls_show(
    config_paths: &[String],
    call_id: Option<String>,
    internal_id: Option<Uuid>,
) -> Result<()> {
    let svc = open_service(config_paths).await?;

    let found = match (call_id, internal_id) {
        (Some(id), _) => svc.store().find_by_external_id(&id).await?,
        (None, Some(id)) => svc.store().find_by_internal_id(id).await?,
        (None, None) => bail!("one of --call-id or --internal-id is required"),
    };

    match found {
        Some(rec) => print_call(&rec),
        None => bail!("call not found"),
    }
}

pub async fn calls_submit(config_paths: &[String], raw: RawCallEvent) -> Result<()> {
    // Validate before connecting so bad input never needs a database.
    let event = validate_event(&raw)?;

    let svc = open_service(config_paths).await?;
    let rec = svc
        .apply_event(event)
        .await
        .map_err(|e| anyhow!("{e} [{}]", e.kind().as_str()))?;

    print_call(&rec)
}

pub async fn calls_unfinished(config_paths: &[String]) -> Result<()> {
    let svc = open_service(config_paths).await?;
    let now = Utc::now();

    let unfinished = svc.unfinished_count(now).await?;
    let stale = svc.stale_count(now).await?;

    println!("as_of={}", now.to_rfc3339());
    println!("latest_unfinished_calls={unfinished}");
    println!("stale_calls={stale}");
    Ok(())
}
