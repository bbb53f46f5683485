//! `cw db` handlers.

use anyhow::Result;

use super::{connect, load_service_config};

pub async fn db_status() -> Result<()> {
    let cfg = load_service_config(&[])?;
    let pool = connect(&cfg).await?;
    let s = cw_db::status(&pool).await?;
    println!("db_ok={} has_calls_table={}", s.ok, s.has_calls_table);
    Ok(())
}

pub async fn db_migrate() -> Result<()> {
    let cfg = load_service_config(&[])?;
    let pool = connect(&cfg).await?;
    cw_db::migrate(&pool).await?;
    println!("migrations_applied=true");
    Ok(())
}
