pub mod handlers;
pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/reconcile", post(handlers::handle_reconcile))
        .route("/api/v1/extract", post(handlers::handle_extract))
        .with_state(state)
}
