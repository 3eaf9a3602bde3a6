use axum::Json;
use serde_json::{json, Value};

/// GET /health
/// Trivial liveness probe — no dependency checks.
pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "copilot-api"
    }))
}
