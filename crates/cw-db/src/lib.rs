use anyhow::{anyhow, Context, Result};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;

use cw_config::{resolve_database_secrets, DatabaseSecrets, DatabaseSection};

pub mod calls;

pub use calls::{
    close_call_if_open, count_open_calls, fetch_call_by_external_id, fetch_call_by_internal_id,
    insert_call_if_absent, PgCallStore,
};

pub const ENV_DB_URL: &str = "CW_DATABASE_URL";

/// Connect to Postgres using CW_DATABASE_URL.
pub async fn connect_from_env() -> Result<PgPool> {
    let url = std::env::var(ENV_DB_URL).with_context(|| format!("missing env var {ENV_DB_URL}"))?;
    let secrets = DatabaseSecrets::Url {
        var: ENV_DB_URL.to_string(),
        url,
    };
    connect(&secrets, 10).await
}

/// Resolve credentials for `cfg` from the environment and connect.
pub async fn connect_with_config(cfg: &DatabaseSection) -> Result<PgPool> {
    let secrets = resolve_database_secrets(cfg)?;
    connect(&secrets, cfg.max_connections).await
}

pub async fn connect(secrets: &DatabaseSecrets, max_connections: u32) -> Result<PgPool> {
    let options = connect_options(secrets)?;
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await
        .with_context(|| format!("failed to connect to Postgres ({})", secrets.describe()))?;
    Ok(pool)
}

fn connect_options(secrets: &DatabaseSecrets) -> Result<PgConnectOptions> {
    match secrets {
        // The parse error may quote the URL, so it is dropped.
        DatabaseSecrets::Url { var, url } => url
            .parse::<PgConnectOptions>()
            .map_err(|_| anyhow!("env var {var} does not hold a valid Postgres URL")),
        DatabaseSecrets::Parts {
            host,
            port,
            user,
            password,
            database,
        } => {
            let mut opts = PgConnectOptions::new()
                .host(host)
                .port(*port)
                .username(user)
                .database(database);
            if let Some(pw) = password {
                opts = opts.password(pw);
            }
            Ok(opts)
        }
    }
}

/// Run embedded SQLx migrations.
pub async fn migrate(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("db migrate failed")?;
    Ok(())
}

/// Connectivity + schema presence.
pub async fn status(pool: &PgPool) -> Result<DbStatus> {
    let (one,): (i32,) = sqlx::query_as::<_, (i32,)>("select 1")
        .fetch_one(pool)
        .await
        .context("status connectivity query failed")?;

    let (exists,): (bool,) = sqlx::query_as::<_, (bool,)>(
        r#"
        select exists (
            select 1
            from information_schema.tables
            where table_schema = 'public' and table_name = 'calls'
        )
        "#,
    )
    .fetch_one(pool)
    .await
    .context("status schema query failed")?;

    Ok(DbStatus {
        ok: one == 1,
        has_calls_table: exists,
    })
}

#[derive(Debug, Clone)]
pub struct DbStatus {
    pub ok: bool,
    pub has_calls_table: bool,
}
