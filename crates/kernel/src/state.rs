//! Application state shared across all handlers.

use std::sync::Arc;

use anyhow::{Context, Result};
use pagina_sdk::store::PageStore;
use pagina_sdk::types::{Region, Template};
use tracing::info;

use crate::config::Config;
use crate::content::PageService;
use crate::dispatch::Dispatcher;
use crate::processor::{
    ContentEtag, FrameOptionsResponseProcessor, RedirectRequestProcessor,
    RequireActiveRequestProcessor,
};
use crate::site::SiteBuilder;
use crate::store::{MemoryPageStore, SiteFixture};
use crate::theme::ThemeEngine;

/// Shared application state.
///
/// Wrapped in Arc internally so Clone is cheap.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    dispatcher: Dispatcher,
    pages: PageService,
}

/// Templates used when the fixture declares none.
pub fn default_templates() -> Vec<Template> {
    vec![
        Template::new("standard", "Standard", "page.html")
            .region(Region::new("main", "Main content"))
            .region(Region::new("sidebar", "Sidebar").inherited()),
        Template::new("article", "Article", "page.html")
            .region(Region::new("main", "Main content"))
            .region(Region::new("sidebar", "Sidebar").inherited())
            .enforce_leaf(),
    ]
}

impl AppState {
    /// Build the site from configuration and load the fixture.
    pub async fn new(config: &Config) -> Result<Self> {
        let fixture = match &config.site_fixture {
            Some(path) => SiteFixture::from_path(path)?,
            None => SiteFixture::default(),
        };
        let store: Arc<dyn PageStore> = Arc::new(MemoryPageStore::new());

        let mut builder = SiteBuilder::new();
        let templates = if fixture.templates.is_empty() {
            default_templates()
        } else {
            fixture.templates.clone()
        };
        builder
            .register_templates(templates)
            .context("failed to register templates")?
            .register_builtin_content_types()
            .context("failed to register content types")?;
        builder
            .register_navigation_extension(Arc::new(blog::BlogArchiveNavigation))
            .context("failed to register blog navigation")?
            .create_content_type(Arc::new(blog::BlogTeaserContent), None)
            .context("failed to register blog content types")?;

        let extensions: Vec<&str> = config.extensions.iter().map(String::as_str).collect();
        builder
            .register_extensions(&extensions)
            .context("failed to activate extensions")?;

        builder
            .processors()
            .register_request_processor(RequireActiveRequestProcessor::new(Arc::clone(&store)))
            .register_request_processor(RedirectRequestProcessor);
        if let Some(value) = &config.frame_options {
            builder
                .processors()
                .register_response_processor(FrameOptionsResponseProcessor::new(value.clone()));
        }
        if config.enable_etag {
            builder.enable_etag(Arc::new(ContentEtag::new(Arc::clone(&store))));
        }

        let site = builder.build();
        info!(
            templates = site.model.templates().len(),
            content_types = site.model.content_types().len(),
            extensions = ?site.model.active_extensions(),
            "site configured"
        );

        let pages = PageService::new(Arc::clone(&site.model), Arc::clone(&store));
        fixture
            .load_into(&pages)
            .await
            .context("failed to load site fixture")?;

        let theme = match &config.theme_dir {
            Some(dir) => ThemeEngine::new(dir)?,
            None => ThemeEngine::builtin()?,
        };

        Ok(Self::from_parts(
            Dispatcher::new(site, store, Arc::new(theme)),
            pages,
        ))
    }

    pub fn from_parts(dispatcher: Dispatcher, pages: PageService) -> Self {
        Self {
            inner: Arc::new(AppStateInner { dispatcher, pages }),
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.inner.dispatcher
    }

    pub fn pages(&self) -> &PageService {
        &self.inner.pages
    }
}
