//! Content types and region rendering.
//!
//! This module provides:
//! - ContentTypeRegistry: content types bound to the page model
//! - RegionRenderer: ordered, inherited and symlinked region output
//! - FilterPipeline: text format filtering used by the text content types
//! - PageService: validated writes of pages and content items

mod builtin;
mod filter;
mod page_service;
mod region;
mod type_registry;

pub use builtin::{
    CodeContent, GalleryContent, ImageContent, MarkdownContent, RawHtmlContent, RichTextContent,
    SectionContent, TemplateContent, builtin_content_types,
};
pub use filter::{FilterPipeline, TextFilter};
pub use page_service::{CreatePage, PageService};
pub(crate) use region::content_source;
pub use region::{RegionRenderer, SYMLINKED_PAGE_FIELD};
pub use type_registry::{ContentTypeBinding, ContentTypeRegistry};
