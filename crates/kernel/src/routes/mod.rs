//! HTTP route handlers.

pub mod health;
pub mod page;

use axum::Router;

use crate::state::AppState;

/// All routes. Paths not matched elsewhere are served as pages.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .fallback(page::serve_page)
}
