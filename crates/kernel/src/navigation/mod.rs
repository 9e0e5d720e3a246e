//! Navigation composition.
//!
//! Pages list their stored sub-pages as navigation children unless they name
//! a navigation extension, in which case the extension supplies the children.

mod registry;
mod resolve;

pub use registry::NavigationRegistry;
pub use resolve::{Breadcrumb, NavigationEntry, NavigationResolver};
