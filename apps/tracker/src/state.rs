use std::sync::Arc;

use crate::config::Config;
use crate::extraction::Extractor;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Model-backed in production; tests swap in a stub.
    pub extractor: Arc<dyn Extractor>,
}
