#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Common test utilities for integration tests.
//!
//! Everything here wires up the real kernel: registries, processor chains,
//! the in-memory store and the built-in theme. Nothing is mocked except
//! where a test wraps the store to observe it.

#![allow(dead_code)]

use std::sync::Arc;

use pagina_kernel::Dispatcher;
use pagina_kernel::SiteBuilder;
use pagina_kernel::store::MemoryPageStore;
use pagina_kernel::theme::ThemeEngine;
use pagina_sdk::store::PageStore;
use pagina_sdk::types::{Region, Template};

/// Templates shared by the integration tests.
///
/// `standard` has a plain `main` region and an inherited `sidebar`;
/// `landing` only declares `main`.
pub fn templates() -> Vec<Template> {
    vec![
        Template::new("standard", "Standard", "page.html")
            .region(Region::new("main", "Main"))
            .region(Region::new("sidebar", "Sidebar").inherited()),
        Template::new("landing", "Landing", "page.html").region(Region::new("main", "Main")),
    ]
}

/// A builder with the test templates and the built-in content types.
pub fn site_builder() -> SiteBuilder {
    let mut builder = SiteBuilder::new();
    builder
        .register_templates(templates())
        .unwrap()
        .register_builtin_content_types()
        .unwrap();
    builder
}

pub fn memory_store() -> Arc<dyn PageStore> {
    Arc::new(MemoryPageStore::new())
}

/// Freeze `builder` and serve it from `store` with the built-in theme.
pub fn dispatcher(builder: SiteBuilder, store: Arc<dyn PageStore>) -> Dispatcher {
    let theme = ThemeEngine::builtin().expect("built-in theme should load");
    Dispatcher::new(builder.build(), store, Arc::new(theme))
}
