//! Merged attribute schema for pages.

use std::collections::{HashMap, HashSet};

use pagina_sdk::types::FieldSpec;
use serde_json::Value;

use crate::error::{ConfigError, ContentError};

/// Fields every page has. Extensions may not redefine them.
pub const BASE_PAGE_FIELDS: &[&str] = &[
    "id",
    "title",
    "slug",
    "template_key",
    "parent_id",
    "ordering",
    "active",
    "in_navigation",
    "override_url",
    "redirect_to",
    "cached_url",
];

/// Attribute fields contributed by active extensions.
#[derive(Debug, Default, Clone)]
pub struct EntitySchema {
    fields: Vec<FieldSpec>,
    owners: HashMap<String, (String, usize)>,
}

impl EntitySchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check that `fields` can be merged for `extension`.
    ///
    /// `pending` holds fields claimed earlier in the same activation call.
    pub(crate) fn check(
        &self,
        extension: &str,
        fields: &[FieldSpec],
        pending: &HashMap<String, String>,
    ) -> Result<(), ConfigError> {
        let mut own = HashSet::new();
        for field in fields {
            let owner = if BASE_PAGE_FIELDS.contains(&field.name.as_str()) {
                Some("the base page fields".to_string())
            } else if let Some(owner) = self.owner(&field.name) {
                Some(format!("extension '{owner}'"))
            } else if let Some(owner) = pending.get(&field.name) {
                Some(format!("extension '{owner}'"))
            } else if !own.insert(field.name.as_str()) {
                Some(format!("extension '{extension}'"))
            } else {
                None
            };

            if let Some(owner) = owner {
                return Err(ConfigError::FieldConflict {
                    extension: extension.to_string(),
                    field: field.name.clone(),
                    owner,
                });
            }
        }
        Ok(())
    }

    /// Append a checked field group.
    pub(crate) fn merge(&mut self, extension: &str, fields: Vec<FieldSpec>) {
        for field in fields {
            self.owners
                .insert(field.name.clone(), (extension.to_string(), self.fields.len()));
            self.fields.push(field);
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.owners.get(name).map(|(_, i)| &self.fields[*i])
    }

    /// Extension that contributed `name`.
    pub fn owner(&self, name: &str) -> Option<&str> {
        self.owners.get(name).map(|(owner, _)| owner.as_str())
    }

    /// Fields in merge order.
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn contains(&self, name: &str) -> bool {
        self.owners.contains_key(name)
    }

    /// Check one attribute value against its field.
    pub fn validate_attribute(&self, name: &str, value: &Value) -> Result<(), ContentError> {
        let field = self
            .field(name)
            .ok_or_else(|| ContentError::UnknownField(name.to_string()))?;
        if !field.kind.accepts(value) {
            return Err(ContentError::InvalidFieldValue {
                field: name.to_string(),
                expected: field.kind,
            });
        }
        Ok(())
    }
}
