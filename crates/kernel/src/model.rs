//! The frozen page model.
//!
//! A [`PageModel`] is built once by [`SiteBuilder`](crate::site::SiteBuilder)
//! and shared read-only with every request.

use pagina_sdk::navigation::NAVIGATION_EXTENSION_FIELD;
use pagina_sdk::types::{ContentItem, Page, Template};
use serde_json::Value;

use crate::content::ContentTypeRegistry;
use crate::error::ContentError;
use crate::extension::EntitySchema;
use crate::navigation::NavigationRegistry;
use crate::template::TemplateRegistry;

#[derive(Debug)]
pub struct PageModel {
    templates: TemplateRegistry,
    content_types: ContentTypeRegistry,
    schema: EntitySchema,
    extensions: Vec<String>,
    navigation: NavigationRegistry,
}

impl PageModel {
    pub(crate) fn new(
        templates: TemplateRegistry,
        content_types: ContentTypeRegistry,
        schema: EntitySchema,
        extensions: Vec<String>,
        navigation: NavigationRegistry,
    ) -> Self {
        Self {
            templates,
            content_types,
            schema,
            extensions,
            navigation,
        }
    }

    pub fn templates(&self) -> &TemplateRegistry {
        &self.templates
    }

    pub fn content_types(&self) -> &ContentTypeRegistry {
        &self.content_types
    }

    pub fn schema(&self) -> &EntitySchema {
        &self.schema
    }

    pub fn navigation(&self) -> &NavigationRegistry {
        &self.navigation
    }

    /// Active extension names in activation order.
    pub fn active_extensions(&self) -> &[String] {
        &self.extensions
    }

    pub fn is_active(&self, extension: &str) -> bool {
        self.extensions.iter().any(|e| e == extension)
    }

    /// The page's effective template.
    pub fn template_for(&self, page: &Page) -> Option<&Template> {
        self.templates.resolve(page.template_key.as_deref())
    }

    /// Check a content item before it is stored on `page`.
    pub fn validate_content(&self, page: &Page, item: &ContentItem) -> Result<(), ContentError> {
        let template = self.template_for(page).ok_or_else(|| {
            ContentError::UnknownTemplate(page.template_key.clone().unwrap_or_default())
        })?;
        if !template.has_region(&item.region) {
            return Err(ContentError::RegionNotInTemplate {
                template: template.key.clone(),
                region: item.region.clone(),
            });
        }

        let binding = self
            .content_types
            .binding(&item.content_type)
            .ok_or_else(|| ContentError::UnknownContentType(item.content_type.clone()))?;
        if !binding.allows_region(&item.region) {
            return Err(ContentError::RegionNotAllowed {
                content_type: item.content_type.clone(),
                region: item.region.clone(),
            });
        }

        binding
            .content_type()
            .validate(&item.payload)
            .map_err(|message| ContentError::InvalidPayload {
                content_type: item.content_type.clone(),
                message,
            })
    }

    /// Set an extension attribute after checking it against the schema.
    /// A null value removes the attribute.
    pub fn set_attribute(
        &self,
        page: &mut Page,
        name: &str,
        value: Value,
    ) -> Result<(), ContentError> {
        self.validate_attribute(name, &value)?;
        if value.is_null() {
            page.attributes.remove(name);
        } else {
            page.attributes.insert(name.to_string(), value);
        }
        Ok(())
    }

    /// Check every attribute already on `page`.
    pub fn validate_attributes(&self, page: &Page) -> Result<(), ContentError> {
        page.attributes
            .iter()
            .try_for_each(|(name, value)| self.validate_attribute(name, value))
    }

    fn validate_attribute(&self, name: &str, value: &Value) -> Result<(), ContentError> {
        self.schema.validate_attribute(name, value)?;
        if name == NAVIGATION_EXTENSION_FIELD
            && let Some(extension) = value.as_str().filter(|s| !s.is_empty())
            && !self.navigation.contains(extension)
        {
            return Err(ContentError::UnknownNavigationExtension(extension.to_string()));
        }
        Ok(())
    }
}
