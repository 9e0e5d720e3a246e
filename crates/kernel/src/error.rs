//! Error types.
//!
//! Three families, matching when they surface:
//! - [`ConfigError`]: raised by registration calls during startup.
//! - [`ContentError`]: invalid pages or content items rejected at write time.
//! - [`DispatchError`]: failures while serving a page; [`AppError`] maps
//!   them to HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use pagina_sdk::render::RenderError;
use pagina_sdk::store::StoreError;
use pagina_sdk::types::FieldKind;
use thiserror::Error;
use uuid::Uuid;

/// Registration-time configuration errors. These are fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("template '{key}' is already registered with a different shape")]
    TemplateConflict { key: String },

    #[error("template '{template}': region '{region}' is declared more than once")]
    DuplicateRegion { template: String, region: String },

    #[error(
        "content type '{content_type}': region '{region}' is not declared by any registered template"
    )]
    UnknownRegion {
        content_type: String,
        region: String,
    },

    #[error("content type '{0}' is already registered")]
    DuplicateContentType(String),

    #[error("unknown extension '{name}'. Available extensions: {available}")]
    UnknownExtension { name: String, available: String },

    #[error("extension '{0}' is already active")]
    ExtensionAlreadyActive(String),

    #[error("extension '{0}' is already in the catalog")]
    DuplicateExtension(String),

    #[error("extension '{extension}': field '{field}' conflicts with {owner}")]
    FieldConflict {
        extension: String,
        field: String,
        owner: String,
    },

    #[error(
        "navigation extensions not found: register at least one navigation extension before activating 'navigation'"
    )]
    NavigationExtensionsMissing,

    #[error("navigation extension '{0}' is already registered")]
    DuplicateNavigationExtension(String),
}

/// Invalid page or content data rejected before it reaches the store.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("unknown content type '{0}'")]
    UnknownContentType(String),

    #[error("unknown template '{0}'")]
    UnknownTemplate(String),

    #[error("template '{template}' has no region '{region}'")]
    RegionNotInTemplate { template: String, region: String },

    #[error("content type '{content_type}' is not allowed in region '{region}'")]
    RegionNotAllowed {
        content_type: String,
        region: String,
    },

    #[error("invalid payload for '{content_type}': {message}")]
    InvalidPayload {
        content_type: String,
        message: String,
    },

    #[error("unknown page field '{0}'")]
    UnknownField(String),

    #[error("field '{field}' expects a {expected:?} value")]
    InvalidFieldValue { field: String, expected: FieldKind },

    #[error("unknown navigation extension '{0}'")]
    UnknownNavigationExtension(String),

    #[error("page '{0}' uses a leaf-only template and cannot have children")]
    LeafTemplate(String),

    #[error("invalid slug '{0}': use lowercase letters, digits, and dashes")]
    InvalidSlug(String),

    #[error("url '{url}' is already used by page {existing}")]
    DuplicateUrl { url: String, existing: Uuid },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors raised while dispatching a page request.
///
/// Errors from processors and content renders propagate unchanged; the
/// dispatcher never swallows them.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("no page at '{0}'")]
    PageNotFound(String),

    #[error("page '{page}' uses unknown template '{template}'")]
    UnknownTemplate { page: String, template: String },

    #[error("unknown navigation extension '{0}'")]
    UnknownNavigationExtension(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("processor '{processor}' failed: {source}")]
    Processor {
        processor: String,
        source: anyhow::Error,
    },
}

impl DispatchError {
    /// Wrap an error raised inside a request or response processor.
    pub fn processor(processor: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        Self::Processor {
            processor: processor.into(),
            source: source.into(),
        }
    }
}

/// Application error returned by HTTP handlers.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error("bad request: {0}")]
    BadRequest(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Dispatch(DispatchError::PageNotFound(_)) => StatusCode::NOT_FOUND,
            AppError::Dispatch(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
        };

        let body = match &self {
            AppError::Dispatch(DispatchError::PageNotFound(_)) => "not found".to_string(),
            AppError::Dispatch(e) => {
                tracing::error!(error = %e, "page dispatch failed");
                "internal server error".to_string()
            }
            AppError::BadRequest(_) => self.to_string(),
        };

        (status, body).into_response()
    }
}

/// Result type alias using AppError.
pub type AppResult<T> = Result<T, AppError>;
