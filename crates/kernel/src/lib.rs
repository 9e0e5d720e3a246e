//! Pagina kernel library.
//!
//! Registries, extension activation, processor chains, navigation and
//! dispatch. The `pagina` binary wires these into an axum server.

pub mod config;
pub mod content;
pub mod dispatch;
pub mod error;
pub mod extension;
pub mod model;
pub mod navigation;
pub mod processor;
pub mod request;
pub mod routes;
pub mod site;
pub mod state;
pub mod store;
pub mod template;
pub mod theme;

pub use dispatch::Dispatcher;
pub use error::{ConfigError, ContentError, DispatchError};
pub use model::PageModel;
pub use request::{PageRequest, PageResponse};
pub use site::{Site, SiteBuilder};
