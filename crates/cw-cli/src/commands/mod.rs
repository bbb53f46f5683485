//! Command handlers for the `cw` CLI.
//!
//! Shared config and connection helpers live here; command-specific logic
//! lives in the submodules.

pub mod calls;
pub mod db;

use anyhow::{Context, Result};
use cw_config::{report_unused_keys, LoadedConfig, ServiceConfig, UnusedKeyPolicy};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Explicit paths win; otherwise layers come from `CW_CONFIG`.
pub fn load_config(paths: &[String]) -> Result<LoadedConfig> {
    if paths.is_empty() {
        return cw_config::load_from_env();
    }
    let refs: Vec<&str> = paths.iter().map(String::as_str).collect();
    cw_config::load_layered_yaml(&refs)
}

pub fn load_service_config(paths: &[String]) -> Result<ServiceConfig> {
    load_config(paths)?.service_config()
}

pub async fn connect(cfg: &ServiceConfig) -> Result<PgPool> {
    cw_db::connect_with_config(&cfg.database)
        .await
        .context("database connection failed")
}

// ---------------------------------------------------------------------------
// config-hash
// ---------------------------------------------------------------------------

pub fn config_hash(paths: &[String], strict: bool) -> Result<()> {
    let loaded = load_config(paths)?;

    let policy = if strict {
        UnusedKeyPolicy::Fail
    } else {
        UnusedKeyPolicy::Warn
    };
    let report = report_unused_keys(&loaded.config_json, policy)?;
    if !report.is_clean() {
        eprintln!(
            "WARN: CONFIG_UNUSED_KEYS unused_leaf_keys={}",
            report.unused_leaf_pointers.len()
        );
        for p in report.unused_leaf_pointers.iter().take(50) {
            eprintln!("  unused={}", p);
        }
    }

    // Shape errors surface here rather than at daemon start.
    loaded.service_config()?;

    println!("config_hash={}", loaded.config_hash);
    println!("{}", loaded.canonical_json);
    Ok(())
}
