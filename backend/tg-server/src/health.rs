use crate::AppState;

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tg_store::with_timeout;

/// GET /health - Component status
pub async fn health(State(state): State<AppState>) -> Response {
    let store_status = match ping_store(&state).await {
        Ok(()) => "operational",
        Err(_) => "unavailable",
    };
    let status = if store_status == "operational" {
        "healthy"
    } else {
        "degraded"
    };

    let health = json!({
        "status": status,
        "version": env!("CARGO_PKG_VERSION"),
        "components": {
            "store": {
                "backend": state.store.backend_name(),
                "status": store_status,
            },
            "rateLimit": if state.settings.rate_limit.enabled { "enabled" } else { "disabled" },
        },
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (StatusCode::OK, Json(health)).into_response()
}

/// GET /live - Kubernetes liveness probe (is the process alive?)
pub async fn liveness() -> Response {
    (StatusCode::OK, "OK").into_response()
}

/// GET /ready - Kubernetes readiness probe
///
/// Not ready while the credential store is unreachable: every session
/// operation would fail with 503 anyway.
pub async fn readiness(State(state): State<AppState>) -> Response {
    match ping_store(&state).await {
        Ok(()) => (StatusCode::OK, "Ready").into_response(),
        Err(e) => {
            log::warn!("Readiness check failed: {}", e);
            (StatusCode::SERVICE_UNAVAILABLE, "Store unavailable").into_response()
        }
    }
}

async fn ping_store(state: &AppState) -> tg_store::Result<()> {
    with_timeout(state.settings.store_timeout, "health.ping", state.store.ping()).await
}
