//! Startup registration and the frozen site.
//!
//! All registration happens on a [`SiteBuilder`] before the first request.
//! [`SiteBuilder::build`] freezes it into a [`Site`], which is cheap to clone
//! and never changes afterwards.

use std::sync::Arc;

use pagina_sdk::navigation::NavigationExtension;
use pagina_sdk::render::ContentType;
use pagina_sdk::types::Template;

use crate::content::{ContentTypeRegistry, builtin_content_types};
use crate::error::ConfigError;
use crate::extension::{Extension, ExtensionCatalog, ExtensionRegistry};
use crate::model::PageModel;
use crate::navigation::NavigationRegistry;
use crate::processor::{
    EtagProvider, ProcessorChain, ProcessorChainBuilder, etag_processors,
};
use crate::template::TemplateRegistry;

/// Mutable registration surface used during startup.
pub struct SiteBuilder {
    templates: TemplateRegistry,
    content_types: ContentTypeRegistry,
    extensions: ExtensionRegistry,
    navigation: NavigationRegistry,
    processors: ProcessorChainBuilder,
}

impl std::fmt::Debug for SiteBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SiteBuilder").finish_non_exhaustive()
    }
}

impl Default for SiteBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SiteBuilder {
    /// A builder with the built-in extension catalog.
    pub fn new() -> Self {
        Self {
            templates: TemplateRegistry::new(),
            content_types: ContentTypeRegistry::new(),
            extensions: ExtensionRegistry::new(ExtensionCatalog::builtin()),
            navigation: NavigationRegistry::new(),
            processors: ProcessorChainBuilder::new(),
        }
    }

    pub fn register_templates(
        &mut self,
        templates: impl IntoIterator<Item = Template>,
    ) -> Result<&mut Self, ConfigError> {
        self.templates.register_templates(templates)?;
        Ok(self)
    }

    /// Bind a content type, optionally limited to `regions`.
    pub fn create_content_type(
        &mut self,
        content_type: Arc<dyn ContentType>,
        regions: Option<&[&str]>,
    ) -> Result<&mut Self, ConfigError> {
        self.content_types
            .create_content_type(&self.templates, content_type, regions)?;
        Ok(self)
    }

    /// Bind every built-in content type, allowed in all regions.
    pub fn register_builtin_content_types(&mut self) -> Result<&mut Self, ConfigError> {
        for content_type in builtin_content_types() {
            self.create_content_type(content_type, None)?;
        }
        Ok(self)
    }

    pub fn register_navigation_extension(
        &mut self,
        extension: Arc<dyn NavigationExtension>,
    ) -> Result<&mut Self, ConfigError> {
        self.navigation.register(extension)?;
        Ok(self)
    }

    /// Make a third-party extension available to [`register_extensions`](Self::register_extensions).
    pub fn add_extension(&mut self, extension: Arc<dyn Extension>) -> Result<&mut Self, ConfigError> {
        self.extensions.catalog_mut().add(extension)?;
        Ok(self)
    }

    /// Activate extensions by name. All-or-nothing per call.
    pub fn register_extensions(&mut self, names: &[&str]) -> Result<&mut Self, ConfigError> {
        self.extensions
            .register_extensions(names, &self.navigation, &mut self.processors)?;
        Ok(self)
    }

    /// Request and response processor chains.
    pub fn processors(&mut self) -> &mut ProcessorChainBuilder {
        &mut self.processors
    }

    /// Register the ETag request and response processors.
    pub fn enable_etag(&mut self, provider: Arc<dyn EtagProvider>) -> &mut Self {
        let (request, response) = etag_processors(provider);
        self.processors
            .register_request_processor(request)
            .register_response_processor(response);
        self
    }

    pub fn templates(&self) -> &TemplateRegistry {
        &self.templates
    }

    pub fn build(self) -> Site {
        let (extensions, schema) = self.extensions.into_parts();
        Site {
            model: Arc::new(PageModel::new(
                self.templates,
                self.content_types,
                schema,
                extensions,
                self.navigation,
            )),
            processors: Arc::new(self.processors.build()),
        }
    }
}

/// Frozen registries shared by every request.
#[derive(Clone)]
pub struct Site {
    pub model: Arc<PageModel>,
    pub processors: Arc<ProcessorChain>,
}
