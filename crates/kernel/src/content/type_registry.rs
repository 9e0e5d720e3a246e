//! Content type registry.
//!
//! Content types are registered once per page model at startup, optionally
//! restricted to a set of regions. Registration order is the order editors
//! see; it has no effect on rendering order.

use std::collections::HashMap;
use std::sync::Arc;

use pagina_sdk::render::ContentType;
use tracing::info;

use crate::error::ConfigError;
use crate::template::TemplateRegistry;

/// A content type bound to a page model.
#[derive(Clone)]
pub struct ContentTypeBinding {
    content_type: Arc<dyn ContentType>,
    /// Regions the type may be placed in (None = any region).
    regions: Option<Vec<String>>,
}

impl ContentTypeBinding {
    pub fn content_type(&self) -> &Arc<dyn ContentType> {
        &self.content_type
    }

    pub fn regions(&self) -> Option<&[String]> {
        self.regions.as_deref()
    }

    /// Whether items of this type may be placed in `region`.
    pub fn allows_region(&self, region: &str) -> bool {
        self.regions
            .as_ref()
            .is_none_or(|regions| regions.iter().any(|r| r == region))
    }
}

impl std::fmt::Debug for ContentTypeBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentTypeBinding")
            .field("type_name", &self.content_type.type_name())
            .field("regions", &self.regions)
            .finish()
    }
}

/// Registry of content types for one page model.
#[derive(Debug, Default)]
pub struct ContentTypeRegistry {
    bindings: Vec<ContentTypeBinding>,
    index: HashMap<String, usize>,
}

impl ContentTypeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a content type to the model.
    ///
    /// Every region in `regions` must be declared by at least one registered
    /// template; this is checked here so a typo fails at startup rather than
    /// at render time.
    pub fn create_content_type(
        &mut self,
        templates: &TemplateRegistry,
        content_type: Arc<dyn ContentType>,
        regions: Option<&[&str]>,
    ) -> Result<(), ConfigError> {
        let type_name = content_type.type_name().to_string();

        if self.index.contains_key(&type_name) {
            return Err(ConfigError::DuplicateContentType(type_name));
        }

        if let Some(regions) = regions
            && let Some(missing) = regions.iter().find(|r| !templates.declares_region(r))
        {
            return Err(ConfigError::UnknownRegion {
                content_type: type_name,
                region: (*missing).to_string(),
            });
        }

        info!(
            content_type = %type_name,
            regions = ?regions,
            "registered content type"
        );

        self.index.insert(type_name, self.bindings.len());
        self.bindings.push(ContentTypeBinding {
            content_type,
            regions: regions.map(|r| r.iter().map(|s| (*s).to_string()).collect()),
        });
        Ok(())
    }

    /// Get a content type by machine name.
    pub fn get(&self, type_name: &str) -> Option<&Arc<dyn ContentType>> {
        self.binding(type_name).map(|b| &b.content_type)
    }

    /// Get a content type's binding by machine name.
    pub fn binding(&self, type_name: &str) -> Option<&ContentTypeBinding> {
        self.index.get(type_name).map(|&i| &self.bindings[i])
    }

    /// All bindings in registration order.
    pub fn list(&self) -> impl Iterator<Item = &ContentTypeBinding> {
        self.bindings.iter()
    }

    /// Content types that may be placed in a region, in registration order.
    pub fn types_for_region(&self, region: &str) -> Vec<&Arc<dyn ContentType>> {
        self.bindings
            .iter()
            .filter(|b| b.allows_region(region))
            .map(|b| &b.content_type)
            .collect()
    }

    /// List content type names in registration order.
    pub fn type_names(&self) -> Vec<&str> {
        self.bindings
            .iter()
            .map(|b| b.content_type.type_name())
            .collect()
    }

    /// Check if a content type exists.
    pub fn exists(&self, type_name: &str) -> bool {
        self.index.contains_key(type_name)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
