//! Pagina SDK
//!
//! Types and capability traits for code that extends Pagina: content types,
//! navigation extensions, and the page store the kernel reads from.
//! Plugins depend on this crate and register their implementations with the
//! kernel at process start.

pub mod navigation;
pub mod render;
pub mod store;
pub mod types;

pub use async_trait::async_trait;

pub mod prelude {
    pub use crate::navigation::{
        NavigationContext, NavigationExtension, NavigationNode, NodeStream, Pretender,
    };
    pub use crate::render::{
        ContentType, RenderContext, RenderError, TemplateRenderer, html_escape, is_safe_url,
    };
    pub use crate::store::{PageStore, StoreError};
    pub use crate::types::*;
}
