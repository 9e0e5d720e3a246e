//! Template registry - stores templates in registration order.

use std::collections::{HashMap, HashSet};

use pagina_sdk::types::Template;
use tracing::{debug, info};

use crate::error::ConfigError;

/// Registry of render templates, keyed by template key.
///
/// The first registered template is the default for pages that do not
/// name one.
#[derive(Debug, Default)]
pub struct TemplateRegistry {
    templates: Vec<Template>,
    index: HashMap<String, usize>,
}

impl TemplateRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one or more templates.
    ///
    /// Re-registering an identical template is a no-op. Re-registering a key
    /// with a different shape, or declaring a region twice, is an error and
    /// leaves the registry unchanged.
    pub fn register_templates(
        &mut self,
        templates: impl IntoIterator<Item = Template>,
    ) -> Result<(), ConfigError> {
        let templates: Vec<Template> = templates.into_iter().collect();

        let mut pending: HashMap<&str, &Template> = HashMap::new();
        for template in &templates {
            check_unique_regions(template)?;

            let existing = self
                .get(&template.key)
                .or_else(|| pending.get(template.key.as_str()).copied());
            if let Some(existing) = existing
                && existing != template
            {
                return Err(ConfigError::TemplateConflict {
                    key: template.key.clone(),
                });
            }
            pending.insert(&template.key, template);
        }

        for template in templates {
            if self.index.contains_key(&template.key) {
                debug!(template = %template.key, "template already registered");
                continue;
            }
            info!(
                template = %template.key,
                regions = template.regions.len(),
                "registered template"
            );
            self.index.insert(template.key.clone(), self.templates.len());
            self.templates.push(template);
        }

        Ok(())
    }

    /// Get a template by key.
    pub fn get(&self, key: &str) -> Option<&Template> {
        self.index.get(key).map(|&i| &self.templates[i])
    }

    /// The default template (first registered).
    pub fn default_template(&self) -> Option<&Template> {
        self.templates.first()
    }

    /// Resolve a page's template key, falling back to the default.
    pub fn resolve(&self, key: Option<&str>) -> Option<&Template> {
        match key {
            Some(key) => self.get(key),
            None => self.default_template(),
        }
    }

    /// All templates in registration order.
    pub fn all(&self) -> impl Iterator<Item = &Template> {
        self.templates.iter()
    }

    /// Whether any registered template declares the region.
    pub fn declares_region(&self, region: &str) -> bool {
        self.templates.iter().any(|t| t.has_region(region))
    }

    /// Union of region keys across all templates.
    pub fn all_region_keys(&self) -> HashSet<&str> {
        self.templates
            .iter()
            .flat_map(|t| t.regions.iter().map(|r| r.key.as_str()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

fn check_unique_regions(template: &Template) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for region in &template.regions {
        if !seen.insert(region.key.as_str()) {
            return Err(ConfigError::DuplicateRegion {
                template: template.key.clone(),
                region: region.key.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use pagina_sdk::types::Region;

    fn standard() -> Template {
        Template::new("standard", "Standard", "page.html")
            .region(Region::new("main", "Main content"))
            .region(Region::new("sidebar", "Sidebar").inherited())
    }

    #[test]
    fn first_template_is_default() {
        let mut registry = TemplateRegistry::new();
        registry
            .register_templates([
                standard(),
                Template::new("wide", "Wide", "wide.html").region(Region::new("main", "Main")),
            ])
            .unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.default_template().unwrap().key, "standard");
        assert_eq!(registry.resolve(Some("wide")).unwrap().path, "wide.html");
        assert!(registry.resolve(Some("missing")).is_none());
    }

    #[test]
    fn identical_reregistration_is_noop() {
        let mut registry = TemplateRegistry::new();
        registry.register_templates([standard()]).unwrap();
        registry.register_templates([standard()]).unwrap();
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn conflicting_reregistration_fails() {
        let mut registry = TemplateRegistry::new();
        registry.register_templates([standard()]).unwrap();

        let changed = Template::new("standard", "Standard", "page.html")
            .region(Region::new("main", "Main content"));
        let err = registry.register_templates([changed]).unwrap_err();
        assert!(matches!(err, ConfigError::TemplateConflict { ref key } if key == "standard"));
        assert_eq!(registry.get("standard").unwrap().regions.len(), 2);
    }

    #[test]
    fn duplicate_region_rejected_without_partial_registration() {
        let mut registry = TemplateRegistry::new();
        let bad = Template::new("bad", "Bad", "bad.html")
            .region(Region::new("main", "Main"))
            .region(Region::new("main", "Main again"));

        let err = registry.register_templates([standard(), bad]).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateRegion { .. }));
        assert!(registry.is_empty());
    }

    #[test]
    fn region_union_covers_all_templates() {
        let mut registry = TemplateRegistry::new();
        registry
            .register_templates([
                standard(),
                Template::new("landing", "Landing", "landing.html")
                    .region(Region::new("hero", "Hero")),
            ])
            .unwrap();

        assert!(registry.declares_region("hero"));
        assert!(registry.declares_region("sidebar"));
        assert!(!registry.declares_region("footer"));
        assert_eq!(registry.all_region_keys().len(), 3);
    }

    #[test]
    fn registered_templates_never_hold_duplicate_regions() {
        // Deterministic sweep over generated region-name sets.
        let names = ["main", "sidebar", "footer", "hero", "aside"];
        for mask in 0u32..(1 << 10) {
            let mut template = Template::new("t", "T", "t.html");
            for bit in 0..10 {
                if mask & (1 << bit) != 0 {
                    let name = names[bit % names.len()];
                    template = template.region(Region::new(name, name));
                }
            }

            let mut registry = TemplateRegistry::new();
            if registry.register_templates([template]).is_ok() {
                let registered = registry.get("t").unwrap();
                let unique: HashSet<_> = registered.regions.iter().map(|r| &r.key).collect();
                assert_eq!(unique.len(), registered.regions.len());
            }
        }
    }
}
