//! Template and region registry.
//!
//! Templates name a layout and the ordered regions content can be placed in.
//! They are registered once at startup and read-only afterwards.

mod registry;

pub use registry::TemplateRegistry;
