//! Axum router and HTTP handlers for cw-daemon.
//!
//! `build_router` is the single entry point; `main.rs` calls it and attaches
//! middleware layers, so tests can drive the bare router.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use cw_calls::SubmitError;
use cw_reconcile::{ErrorKind, RawCallEvent};
use tracing::{error, warn};

use crate::{
    api_types::{ErrorResponse, EventAccepted, HealthResponse, MetricsResponse},
    state::{uptime_secs, AppState},
};

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the application router over the given shared state.
///
/// Tracing middleware is **not** applied here; `main.rs` attaches it.
/// A known path with the wrong method gets the same JSON 404 as an unknown
/// path, not an empty 405.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/health", get(health).fallback(not_found))
        .route("/events", post(submit_event).fallback(not_found))
        .route("/metrics", get(metrics).fallback(not_found))
        .fallback(not_found)
        .with_state(state)
}

/// HTTP status for each error category.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        // Conflicts are reported as bad requests to providers.
        ErrorKind::InvalidInput | ErrorKind::Conflict => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::StoreFailure => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ErrorResponse::new(message))).into_response()
}

// ---------------------------------------------------------------------------
// GET /v1/health
// ---------------------------------------------------------------------------

pub(crate) async fn health(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            ok: true,
            service: st.build.service,
            version: st.build.version,
            uptime_secs: uptime_secs(),
        }),
    )
}

// ---------------------------------------------------------------------------
// POST /events
// ---------------------------------------------------------------------------

/// Apply one provider event.
///
/// The body is decoded here rather than by the `Json` extractor so malformed
/// input gets the same `{"error": ...}` shape as every other failure.
pub(crate) async fn submit_event(State(st): State<Arc<AppState>>, body: Bytes) -> Response {
    let raw: RawCallEvent = match serde_json::from_slice(&body) {
        Ok(raw) => raw,
        Err(e) => {
            warn!("events: malformed body: {e}");
            return error_response(StatusCode::BAD_REQUEST, "Invalid JSON body");
        }
    };

    match st.calls.submit_event(&raw).await {
        Ok(call) => (
            StatusCode::OK,
            Json(EventAccepted {
                status: "ok".to_string(),
                call,
            }),
        )
            .into_response(),
        // Store text is already logged by the service and never returned.
        Err(SubmitError::Store(_)) => {
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
        Err(SubmitError::Rejected(r)) => error_response(status_for(r.kind()), r.to_string()),
    }
}

// ---------------------------------------------------------------------------
// GET /metrics
// ---------------------------------------------------------------------------

pub(crate) async fn metrics(State(st): State<Arc<AppState>>) -> Response {
    let now = Utc::now();

    let counts = async {
        let unfinished = st.calls.unfinished_count(now).await?;
        let stale = st.calls.stale_count(now).await?;
        Ok::<_, cw_calls::StoreError>(MetricsResponse {
            latest_unfinished_calls: unfinished,
            stale_calls: stale,
        })
    }
    .await;

    match counts {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(e) => {
            error!(
                backend = st.calls.store().backend_name(),
                "metrics: count failed: {}",
                e.message()
            );
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to retrieve metrics",
            )
        }
    }
}

// ---------------------------------------------------------------------------
// Fallback
// ---------------------------------------------------------------------------

pub(crate) async fn not_found() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not Found")
}
