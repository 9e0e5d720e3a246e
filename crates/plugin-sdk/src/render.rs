//! Content type capability and rendering context.
//!
//! Third-party code declares a content type by implementing [`ContentType`]
//! and registering it with the kernel at startup. Each content item is then
//! rendered by its type into an HTML fragment.

use serde_json::Value;
use thiserror::Error;

use crate::types::{ContentItem, FieldSpec, Page, validate_fields};

/// Errors raised while rendering content or templates.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The template engine failed.
    #[error("template '{path}': {message}")]
    Template { path: String, message: String },

    /// A content item's payload could not be rendered.
    #[error("content type '{content_type}': {message}")]
    Payload {
        content_type: String,
        message: String,
    },
}

impl RenderError {
    pub fn template(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Template {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn payload(content_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Payload {
            content_type: content_type.into(),
            message: message.into(),
        }
    }
}

/// Renders a named template with a JSON context.
///
/// Implemented by the kernel's theme engine; content types may call it
/// recursively to render their own sub-templates.
pub trait TemplateRenderer: Send + Sync {
    fn render_template(&self, path: &str, context: &Value) -> Result<String, RenderError>;

    /// Check whether a template exists.
    fn has_template(&self, path: &str) -> bool;
}

/// Context handed to [`ContentType::render`].
pub struct RenderContext<'a> {
    /// The page being rendered (not necessarily the content's owner when
    /// content is inherited or symlinked).
    pub page: &'a Page,
    /// Region being rendered.
    pub region: &'a str,
    /// Template engine for sub-templates.
    pub renderer: &'a dyn TemplateRenderer,
}

/// A registered content type: payload shape plus render behavior.
pub trait ContentType: Send + Sync {
    /// Machine name stored on content items (e.g. "richtext").
    fn type_name(&self) -> &str;

    /// Human-readable label for editors.
    fn label(&self) -> &str;

    /// Payload fields.
    fn fields(&self) -> Vec<FieldSpec> {
        Vec::new()
    }

    /// Validate a payload before it is stored.
    fn validate(&self, payload: &Value) -> Result<(), String> {
        validate_fields(&self.fields(), payload)
    }

    /// Render one content item into an HTML fragment.
    fn render(&self, item: &ContentItem, ctx: &RenderContext<'_>) -> Result<String, RenderError>;
}

/// Escape text for safe inclusion in HTML.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Whether a link target uses a safe scheme: http, https, or site-relative.
pub fn is_safe_url(url: &str) -> bool {
    let trimmed = url.trim();
    trimmed.starts_with("https://") || trimmed.starts_with("http://") || trimmed.starts_with('/')
}
