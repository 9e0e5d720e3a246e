//! Transport-facing request and response types.
//!
//! The kernel sees a small HTTP-like request and produces a response; the
//! axum adapter in `routes` converts to and from real HTTP messages.

use axum::body::Body;
use axum::http::header::{self, AsHeaderName, HeaderName, InvalidHeaderValue};
use axum::http::{HeaderMap, HeaderValue, Method, Request, StatusCode};
use axum::response::{IntoResponse, Response};

/// An incoming page request.
#[derive(Debug, Clone)]
pub struct PageRequest {
    pub method: Method,
    /// Request path, e.g. "/about/team/".
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
}

impl PageRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: None,
            headers: HeaderMap::new(),
        }
    }

    /// Create a GET request for a path.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// Build from an HTTP request, discarding the body.
    pub fn from_http(request: &Request<Body>) -> Self {
        Self {
            method: request.method().clone(),
            path: request.uri().path().to_string(),
            query: request.uri().query().map(str::to_string),
            headers: request.headers().clone(),
        }
    }

    /// Add a header. Values that are not valid header text are ignored.
    pub fn with_header(mut self, name: HeaderName, value: &str) -> Self {
        if let Ok(value) = HeaderValue::from_str(value) {
            self.headers.insert(name, value);
        }
        self
    }

    /// Get a header as text.
    pub fn header(&self, name: impl AsHeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// The conditional-request token sent by the client.
    pub fn if_none_match(&self) -> Option<&str> {
        self.header(header::IF_NONE_MATCH)
    }

    /// Whether the request is safe to answer from cache validators.
    pub fn is_cacheable_method(&self) -> bool {
        self.method == Method::GET || self.method == Method::HEAD
    }
}

/// An outgoing page response.
#[derive(Debug, Clone, PartialEq)]
pub struct PageResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl PageResponse {
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    /// A 200 response with an HTML body.
    pub fn html(body: impl Into<String>) -> Self {
        let mut response = Self::new(StatusCode::OK, body);
        response.headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/html; charset=utf-8"),
        );
        response
    }

    pub fn not_modified() -> Self {
        Self::new(StatusCode::NOT_MODIFIED, "")
    }

    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "not found")
    }

    /// A 302 redirect. Fails if the location is not valid header text.
    pub fn redirect(location: &str) -> Result<Self, InvalidHeaderValue> {
        let mut response = Self::new(StatusCode::FOUND, "");
        response.set_header(header::LOCATION, location)?;
        Ok(response)
    }

    pub fn set_header(&mut self, name: HeaderName, value: &str) -> Result<(), InvalidHeaderValue> {
        self.headers.insert(name, HeaderValue::from_str(value)?);
        Ok(())
    }

    pub fn header(&self, name: impl AsHeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

impl IntoResponse for PageResponse {
    fn into_response(self) -> Response {
        (self.status, self.headers, self.body).into_response()
    }
}
