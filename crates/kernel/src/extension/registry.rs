//! Extension catalog and activation.

use std::collections::HashMap;
use std::sync::Arc;

use pagina_sdk::types::FieldSpec;
use tracing::{debug, info};

use super::builtin;
use super::schema::EntitySchema;
use crate::error::ConfigError;
use crate::navigation::NavigationRegistry;
use crate::processor::{ProcessorChainBuilder, RequestProcessor, ResponseProcessor};

/// A named bundle of page attributes and behavior.
pub trait Extension: Send + Sync {
    fn name(&self) -> &str;

    /// Attribute fields merged into the page schema.
    fn fields(&self) -> Vec<FieldSpec> {
        Vec::new()
    }

    /// Preflight run for every extension in a call before any is applied.
    fn prepare(&self, _navigation: &NavigationRegistry) -> Result<(), ConfigError> {
        Ok(())
    }

    /// Install behavior. Runs only after every extension in the call passed
    /// its checks, so it must not fail.
    fn activate(&self, _activation: &mut Activation<'_>) {}
}

/// Handle given to [`Extension::activate`].
pub struct Activation<'a> {
    processors: &'a mut ProcessorChainBuilder,
}

impl Activation<'_> {
    pub fn request_processor(&mut self, processor: impl RequestProcessor + 'static) {
        self.processors.register_request_processor(processor);
    }

    pub fn response_processor(&mut self, processor: impl ResponseProcessor + 'static) {
        self.processors.register_response_processor(processor);
    }
}

/// Extensions available for activation, by name.
#[derive(Default)]
pub struct ExtensionCatalog {
    extensions: HashMap<String, Arc<dyn Extension>>,
}

impl ExtensionCatalog {
    /// An empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// The kernel's built-in extensions.
    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        for extension in builtin::builtin_extensions() {
            let name = extension.name().to_string();
            catalog.extensions.insert(name, extension);
        }
        catalog
    }

    /// Make a third-party extension available.
    pub fn add(&mut self, extension: Arc<dyn Extension>) -> Result<(), ConfigError> {
        let name = extension.name().to_string();
        if self.extensions.contains_key(&name) {
            return Err(ConfigError::DuplicateExtension(name));
        }
        debug!(extension = %name, "added extension to catalog");
        self.extensions.insert(name, extension);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Extension>> {
        self.extensions.get(name)
    }

    /// Sorted extension names.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.extensions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Active extensions and the schema they built.
#[derive(Default)]
pub struct ExtensionRegistry {
    catalog: ExtensionCatalog,
    active: Vec<Arc<dyn Extension>>,
    schema: EntitySchema,
}

impl ExtensionRegistry {
    pub fn new(catalog: ExtensionCatalog) -> Self {
        Self {
            catalog,
            active: Vec::new(),
            schema: EntitySchema::new(),
        }
    }

    pub fn catalog_mut(&mut self) -> &mut ExtensionCatalog {
        &mut self.catalog
    }

    /// Activate extensions by name, in the given order.
    ///
    /// Every name is resolved and checked before anything changes: an unknown
    /// name, a repeat, a failed preflight or a field conflict leaves the
    /// registry, schema and processor chains untouched.
    pub fn register_extensions(
        &mut self,
        names: &[&str],
        navigation: &NavigationRegistry,
        processors: &mut ProcessorChainBuilder,
    ) -> Result<(), ConfigError> {
        let mut resolved = Vec::with_capacity(names.len());
        let mut pending: HashMap<String, String> = HashMap::new();

        for &name in names {
            let extension = self
                .catalog
                .get(name)
                .ok_or_else(|| ConfigError::UnknownExtension {
                    name: name.to_string(),
                    available: self.catalog.names().join(", "),
                })?;

            let repeated = resolved
                .iter()
                .any(|e: &Arc<dyn Extension>| e.name() == name);
            if self.is_active(name) || repeated {
                return Err(ConfigError::ExtensionAlreadyActive(name.to_string()));
            }

            extension.prepare(navigation)?;

            let fields = extension.fields();
            self.schema.check(name, &fields, &pending)?;
            for field in fields {
                pending.insert(field.name, name.to_string());
            }
            resolved.push(Arc::clone(extension));
        }

        for extension in resolved {
            let fields = extension.fields();
            info!(
                extension = extension.name(),
                fields = fields.len(),
                "activated extension"
            );
            self.schema.merge(extension.name(), fields);
            extension.activate(&mut Activation {
                processors: &mut *processors,
            });
            self.active.push(extension);
        }
        Ok(())
    }

    pub fn is_active(&self, name: &str) -> bool {
        self.active.iter().any(|e| e.name() == name)
    }

    /// Active extension names in activation order.
    pub fn active_names(&self) -> Vec<&str> {
        self.active.iter().map(|e| e.name()).collect()
    }

    pub fn schema(&self) -> &EntitySchema {
        &self.schema
    }

    /// Split into the parts the frozen page model keeps.
    pub(crate) fn into_parts(self) -> (Vec<String>, EntitySchema) {
        let names = self.active.iter().map(|e| e.name().to_string()).collect();
        (names, self.schema)
    }
}
