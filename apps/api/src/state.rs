use std::sync::Arc;

use crate::config::Config;
use crate::pipeline::runner::PipelineRunner;
use crate::store::ResumeStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<ResumeStore>,
    pub runner: Arc<PipelineRunner>,
    /// Full config kept alongside the runner's own copy of its knobs.
    #[allow(dead_code)]
    pub config: Config,
}
