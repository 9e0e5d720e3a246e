//! Page extensions.
//!
//! An extension contributes a group of page attributes and, optionally,
//! request or response processors. Extensions are picked by name from an
//! [`ExtensionCatalog`] and activated once per page model.

mod builtin;
mod registry;
mod schema;

pub use builtin::{
    ChangeDateExtension, DatePublisherExtension, FieldGroupExtension,
    LastModifiedResponseProcessor, NavigationExtensionField, PublicationWindowProcessor,
    available_translations, content_title, original_translation, page_title,
};
pub use registry::{Activation, Extension, ExtensionCatalog, ExtensionRegistry};
pub use schema::{BASE_PAGE_FIELDS, EntitySchema};
