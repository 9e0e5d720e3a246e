//! Page handler: every unmatched GET or HEAD is a page lookup.

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::Method;
use axum::response::{IntoResponse, Response};

use crate::error::{AppError, AppResult};
use crate::request::PageRequest;
use crate::state::AppState;

pub async fn serve_page(
    State(state): State<AppState>,
    request: Request<Body>,
) -> AppResult<Response> {
    if !matches!(*request.method(), Method::GET | Method::HEAD) {
        return Err(AppError::BadRequest(format!(
            "method {} is not supported for pages",
            request.method()
        )));
    }
    let request = PageRequest::from_http(&request);
    let response = state.dispatcher().dispatch(&request).await?;
    Ok(response.into_response())
}
