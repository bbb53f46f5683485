//! cw-daemon entry point.
//!
//! Thin on purpose: load config, connect the store, build the shared state,
//! wire middleware, serve. Handlers live in `routes.rs`; state and the stale
//! sweep in `state.rs`.

use std::{sync::Arc, time::Duration};

use anyhow::Context;
use cw_calls::{CallService, CallStore};
use cw_config::{report_unused_keys, UnusedKeyPolicy, ENV_BIND_ADDR_OVERRIDE};
use cw_daemon::{routes, state};
use cw_db::PgCallStore;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{info, warn, Level};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Silent if the file does not exist; production injects env vars directly.
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();

    let loaded = cw_config::load_from_env().context("config load failed")?;
    let unused = report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Warn)?;
    for pointer in &unused.unused_leaf_pointers {
        warn!(pointer = %pointer, "config key is not read by cw-daemon");
    }
    let cfg = loaded.service_config()?;
    info!(config_hash = %loaded.config_hash, "config loaded");

    let pool = cw_db::connect_with_config(&cfg.database).await?;
    cw_db::migrate(&pool).await?;

    let store: Arc<dyn CallStore> = Arc::new(PgCallStore::new(pool));
    let calls = CallService::with_windows(store, state::metrics_windows(&cfg.metrics));
    let shared = Arc::new(state::AppState::new(calls));

    if cfg.sweep.enabled {
        state::spawn_stale_sweep(
            shared.calls.clone(),
            Duration::from_secs(cfg.sweep.interval_secs),
        );
    }

    let app = routes::build_router(Arc::clone(&shared)).layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    let override_addr = std::env::var(ENV_BIND_ADDR_OVERRIDE).ok();
    let addr = cfg.server.effective_bind_addr(override_addr.as_deref())?;
    info!("cw-daemon listening on http://{}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server crashed")?;

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown requested");
    }
}
