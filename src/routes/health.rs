use std::time::Instant;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::state::AppState;
use crate::store::migrate;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(health_check))
        .route("/live", get(liveness))
        .route("/ready", get(readiness))
        .route("/database", get(database_health))
}

pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "uptimeSecs": state.uptime_secs(),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// Ready once every migration has been applied.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    match migrate::get_current_version(state.store()) {
        Ok(version) if version >= migrate::latest_version() => StatusCode::OK,
        Ok(version) => {
            tracing::warn!(version, "Store schema behind, not ready");
            StatusCode::SERVICE_UNAVAILABLE
        }
        Err(e) => {
            tracing::warn!(error = %e, "Readiness probe failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

pub async fn database_health(State(state): State<AppState>) -> impl IntoResponse {
    let start = Instant::now();
    let probe = state.store().get_test("__health__", "__probe__");
    let latency_us = start.elapsed().as_micros() as u64;
    let healthy = probe.is_ok();
    if let Err(e) = &probe {
        tracing::error!(error = %e, "Database health probe failed");
    }

    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (
        status,
        Json(serde_json::json!({
            "healthy": healthy,
            "latencyUs": latency_us,
            "schemaVersion": migrate::get_current_version(state.store()).ok(),
        })),
    )
}
