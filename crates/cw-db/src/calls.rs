//! Postgres-backed call records.
//!
//! Creation and finalisation are single conditional statements, so two
//! deliveries racing on one call id cannot both write. When the condition
//! fails the current row is read back and reported to the caller.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use cw_calls::{CallStore, CloseOutcome, CreateOutcome, StoreError};
use cw_reconcile::{CallRecord, CountWindowBounds, NewCall};

const CALL_COLUMNS: &str =
    "internal_id, external_id, from_endpoint, to_endpoint, started_at, ended_at, duration_ms";

fn row_to_call(row: &PgRow) -> Result<CallRecord> {
    Ok(CallRecord {
        internal_id: row.try_get("internal_id")?,
        external_id: row.try_get("external_id")?,
        from: row.try_get("from_endpoint")?,
        to: row.try_get("to_endpoint")?,
        started_at: row.try_get("started_at")?,
        ended_at: row.try_get("ended_at")?,
        duration_ms: row.try_get("duration_ms")?,
    })
}

pub async fn fetch_call_by_external_id(
    pool: &PgPool,
    external_id: &str,
) -> Result<Option<CallRecord>> {
    let row = sqlx::query(&format!(
        "select {CALL_COLUMNS} from calls where external_id = $1"
    ))
    .bind(external_id)
    .fetch_optional(pool)
    .await
    .context("fetch_call_by_external_id failed")?;

    row.as_ref().map(row_to_call).transpose()
}

pub async fn fetch_call_by_internal_id(
    pool: &PgPool,
    internal_id: Uuid,
) -> Result<Option<CallRecord>> {
    let row = sqlx::query(&format!(
        "select {CALL_COLUMNS} from calls where internal_id = $1"
    ))
    .bind(internal_id)
    .fetch_optional(pool)
    .await
    .context("fetch_call_by_internal_id failed")?;

    row.as_ref().map(row_to_call).transpose()
}

/// Insert an open call unless the external id already exists.
pub async fn insert_call_if_absent(pool: &PgPool, call: &NewCall) -> Result<CreateOutcome> {
    let inserted = sqlx::query(&format!(
        r#"
        insert into calls (internal_id, external_id, from_endpoint, to_endpoint, started_at)
        values ($1, $2, $3, $4, $5)
        on conflict (external_id) do nothing
        returning {CALL_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(&call.external_id)
    .bind(&call.from)
    .bind(&call.to)
    .bind(call.started_at)
    .fetch_optional(pool)
    .await
    .context("insert_call_if_absent failed")?;

    if let Some(row) = inserted {
        return Ok(CreateOutcome::Created(row_to_call(&row)?));
    }

    let existing = fetch_call_by_external_id(pool, &call.external_id)
        .await?
        .ok_or_else(|| {
            anyhow!(
                "insert for call {} conflicted but no row is visible",
                call.external_id
            )
        })?;
    Ok(CreateOutcome::AlreadyExists(existing))
}

/// Close the call if it is still open.
pub async fn close_call_if_open(
    pool: &PgPool,
    external_id: &str,
    ended_at: DateTime<Utc>,
    duration_ms: i64,
) -> Result<CloseOutcome> {
    let updated = sqlx::query(&format!(
        r#"
        update calls
        set ended_at = $2,
            duration_ms = $3,
            updated_at = now()
        where external_id = $1
          and ended_at is null
        returning {CALL_COLUMNS}
        "#
    ))
    .bind(external_id)
    .bind(ended_at)
    .bind(duration_ms)
    .fetch_optional(pool)
    .await
    .context("close_call_if_open failed")?;

    if let Some(row) = updated {
        return Ok(CloseOutcome::Closed(row_to_call(&row)?));
    }

    Ok(match fetch_call_by_external_id(pool, external_id).await? {
        Some(current) => CloseOutcome::AlreadyClosed(current),
        None => CloseOutcome::NotFound,
    })
}

/// Open calls with `lower <= started_at < upper`.
pub async fn count_open_calls(pool: &PgPool, bounds: &CountWindowBounds) -> Result<u64> {
    let (n,): (i64,) = sqlx::query_as::<_, (i64,)>(
        r#"
        select count(*)
        from calls
        where ended_at is null
          and started_at >= $1
          and started_at < $2
        "#,
    )
    .bind(bounds.lower)
    .bind(bounds.upper)
    .fetch_one(pool)
    .await
    .context("count_open_calls failed")?;

    u64::try_from(n).context("negative count")
}

// ---------------------------------------------------------------------------
// CallStore
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct PgCallStore {
    pool: PgPool,
}

impl PgCallStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn store_err(e: anyhow::Error) -> StoreError {
    StoreError::new(format!("{e:#}"))
}

#[async_trait]
impl CallStore for PgCallStore {
    fn backend_name(&self) -> &'static str {
        "postgres"
    }

    async fn find_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<CallRecord>, StoreError> {
        fetch_call_by_external_id(&self.pool, external_id)
            .await
            .map_err(store_err)
    }

    async fn find_by_internal_id(
        &self,
        internal_id: Uuid,
    ) -> Result<Option<CallRecord>, StoreError> {
        fetch_call_by_internal_id(&self.pool, internal_id)
            .await
            .map_err(store_err)
    }

    async fn create_open(&self, call: NewCall) -> Result<CreateOutcome, StoreError> {
        insert_call_if_absent(&self.pool, &call)
            .await
            .map_err(store_err)
    }

    async fn close_open(
        &self,
        external_id: &str,
        ended_at: DateTime<Utc>,
        duration_ms: i64,
    ) -> Result<CloseOutcome, StoreError> {
        close_call_if_open(&self.pool, external_id, ended_at, duration_ms)
            .await
            .map_err(store_err)
    }

    async fn count_open_in_window(&self, bounds: &CountWindowBounds) -> Result<u64, StoreError> {
        count_open_calls(&self.pool, bounds).await.map_err(store_err)
    }
}
