pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::pipeline::handlers as pipeline_handlers;
use crate::state::AppState;
use crate::store::handlers as store_handlers;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/resume", post(store_handlers::handle_ingest_resume))
        .route(
            "/api/v1/resume/upload",
            post(store_handlers::handle_upload_resume),
        )
        .route("/api/v1/analyze", post(pipeline_handlers::handle_analyze))
        .with_state(state)
}
