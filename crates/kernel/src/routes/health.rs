//! Health check endpoint.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    templates: usize,
    content_types: usize,
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let model = &state.dispatcher().site().model;
    Json(HealthResponse {
        status: "healthy",
        templates: model.templates().len(),
        content_types: model.content_types().len(),
    })
}

/// Create the health check router.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
