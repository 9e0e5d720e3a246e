//! Navigation extension registry.

use std::collections::HashMap;
use std::sync::Arc;

use pagina_sdk::navigation::NavigationExtension;
use tracing::info;

use crate::error::ConfigError;

/// Named navigation extensions, in registration order.
#[derive(Default)]
pub struct NavigationRegistry {
    extensions: Vec<Arc<dyn NavigationExtension>>,
    index: HashMap<String, usize>,
}

impl NavigationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an extension. Names must be unique.
    pub fn register(&mut self, extension: Arc<dyn NavigationExtension>) -> Result<(), ConfigError> {
        let name = extension.name().to_string();
        if self.index.contains_key(&name) {
            return Err(ConfigError::DuplicateNavigationExtension(name));
        }
        info!(extension = %name, "registered navigation extension");
        self.index.insert(name, self.extensions.len());
        self.extensions.push(extension);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn NavigationExtension>> {
        self.index.get(name).map(|&i| &self.extensions[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// `(name, label)` pairs for editor choice lists.
    pub fn choices(&self) -> Vec<(&str, &str)> {
        self.extensions.iter().map(|e| (e.name(), e.label())).collect()
    }

    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }
}

impl std::fmt::Debug for NavigationRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NavigationRegistry")
            .field("extensions", &self.choices())
            .finish()
    }
}
