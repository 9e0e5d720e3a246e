//! Core types shared between the kernel and third-party content code.
//!
//! Pages, content items, templates and the field schema used by page
//! extensions all live here so plugins can depend on this crate alone.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// A page: a node in the site tree that owns content items.
///
/// Extension-contributed attributes live in `attributes`; the kernel
/// validates them against the model's merged field schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// Unique identifier (UUIDv7, time-sortable).
    pub id: Uuid,

    /// Display title.
    pub title: String,

    /// URL segment for this page.
    pub slug: String,

    /// Template key (None = the model's default template).
    #[serde(default)]
    pub template_key: Option<String>,

    /// Parent page in the tree (None = root).
    #[serde(default)]
    pub parent_id: Option<Uuid>,

    /// Ordering key among siblings (lower first).
    #[serde(default)]
    pub ordering: i32,

    /// Whether the page is publicly reachable.
    #[serde(default = "default_true")]
    pub active: bool,

    /// Whether the page shows up in navigation.
    #[serde(default = "default_true")]
    pub in_navigation: bool,

    /// Explicit URL replacing the computed one.
    #[serde(default)]
    pub override_url: Option<String>,

    /// Redirect target; navigation links point here instead of the page.
    #[serde(default)]
    pub redirect_to: Option<String>,

    /// URL computed by the store from the parent chain.
    #[serde(default)]
    pub cached_url: String,

    /// Attributes contributed by activated extensions.
    #[serde(default)]
    pub attributes: BTreeMap<String, Value>,
}

fn default_true() -> bool {
    true
}

impl Page {
    /// Create an active, navigable root page.
    pub fn new(title: impl Into<String>, slug: impl Into<String>) -> Self {
        let slug = slug.into();
        Self {
            id: Uuid::now_v7(),
            title: title.into(),
            cached_url: format!("/{slug}/"),
            slug,
            template_key: None,
            parent_id: None,
            ordering: 0,
            active: true,
            in_navigation: true,
            override_url: None,
            redirect_to: None,
            attributes: BTreeMap::new(),
        }
    }

    /// Compute this page's URL given its parent's URL.
    ///
    /// `override_url` wins; otherwise the slug is appended to the parent URL.
    pub fn compute_url(&self, parent_url: Option<&str>) -> String {
        if let Some(url) = &self.override_url {
            return url.clone();
        }
        match parent_url {
            Some(parent) => format!("{}/{}/", parent.trim_end_matches('/'), self.slug),
            None => format!("/{}/", self.slug),
        }
    }

    /// The page's own URL.
    pub fn url(&self) -> &str {
        &self.cached_url
    }

    /// URL navigation links should point to.
    pub fn navigation_url(&self) -> &str {
        self.redirect_to.as_deref().unwrap_or(&self.cached_url)
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Get an extension attribute as a specific type.
    pub fn attribute<T: DeserializeOwned>(&self, name: &str) -> Option<T> {
        self.attributes
            .get(name)
            .filter(|v| !v.is_null())
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Get a string extension attribute.
    pub fn attribute_str(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).and_then(|v| v.as_str())
    }
}

/// A block of content owned by a page and placed in one region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: Uuid,
    /// Owning page.
    pub page_id: Uuid,
    /// Region key within the page's template.
    pub region: String,
    /// Position within the region (ascending).
    pub ordering: i32,
    /// Registered content type name.
    pub content_type: String,
    /// Type-specific payload.
    pub payload: Value,
}

impl ContentItem {
    pub fn new(
        page_id: Uuid,
        region: impl Into<String>,
        content_type: impl Into<String>,
        payload: Value,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            page_id,
            region: region.into(),
            ordering: 0,
            content_type: content_type.into(),
            payload,
        }
    }

    pub fn ordering(mut self, ordering: i32) -> Self {
        self.ordering = ordering;
        self
    }

    /// Get a string value from the payload.
    pub fn payload_str(&self, key: &str) -> Option<&str> {
        self.payload.get(key).and_then(|v| v.as_str())
    }
}

/// A named slot within a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub key: String,
    pub title: String,
    /// Empty regions fall back to the nearest ancestor with content here.
    #[serde(default)]
    pub inherited: bool,
}

impl Region {
    pub fn new(key: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            title: title.into(),
            inherited: false,
        }
    }

    pub fn inherited(mut self) -> Self {
        self.inherited = true;
        self
    }
}

/// A render template with its ordered regions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    pub key: String,
    pub title: String,
    /// Layout path handed to the template renderer.
    pub path: String,
    pub regions: Vec<Region>,
    /// Pages using this template may not have children.
    #[serde(default)]
    pub enforce_leaf: bool,
    /// Template suggested for new children.
    #[serde(default)]
    pub child_template: Option<String>,
}

impl Template {
    pub fn new(key: impl Into<String>, title: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            title: title.into(),
            path: path.into(),
            regions: Vec::new(),
            enforce_leaf: false,
            child_template: None,
        }
    }

    pub fn region(mut self, region: Region) -> Self {
        self.regions.push(region);
        self
    }

    pub fn enforce_leaf(mut self) -> Self {
        self.enforce_leaf = true;
        self
    }

    pub fn child_template(mut self, key: impl Into<String>) -> Self {
        self.child_template = Some(key.into());
        self
    }

    /// Look up a region by key.
    pub fn get_region(&self, key: &str) -> Option<&Region> {
        self.regions.iter().find(|r| r.key == key)
    }

    pub fn has_region(&self, key: &str) -> bool {
        self.get_region(key).is_some()
    }
}

/// Value kinds a field may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    TextLong,
    Integer,
    Boolean,
    /// RFC 3339 timestamp string.
    DateTime,
    /// UUID of another page.
    PageRef,
    /// Language code such as "en" or "de-ch".
    Language,
}

impl FieldKind {
    /// Check whether a JSON value fits this kind. Null always fits.
    pub fn accepts(&self, value: &Value) -> bool {
        if value.is_null() {
            return true;
        }
        match self {
            FieldKind::Text | FieldKind::TextLong => value.is_string(),
            FieldKind::Integer => value.is_i64() || value.is_u64(),
            FieldKind::Boolean => value.is_boolean(),
            FieldKind::DateTime => value
                .as_str()
                .is_some_and(|s| chrono::DateTime::parse_from_rfc3339(s).is_ok()),
            FieldKind::PageRef => value.as_str().is_some_and(|s| Uuid::parse_str(s).is_ok()),
            FieldKind::Language => value.as_str().is_some_and(is_language_code),
        }
    }
}

fn is_language_code(code: &str) -> bool {
    let mut parts = code.split('-');
    let primary_ok = parts
        .next()
        .is_some_and(|p| (2..=3).contains(&p.len()) && p.chars().all(|c| c.is_ascii_lowercase()));
    primary_ok && parts.all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_alphanumeric()))
}

/// A single field in a content payload or extension field group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
    pub label: String,
    #[serde(default)]
    pub required: bool,
}

impl FieldSpec {
    pub fn new(name: &str, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            label: name.into(),
            required: false,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn label(mut self, label: &str) -> Self {
        self.label = label.into();
        self
    }
}

/// Validate a JSON object against a list of field specs.
///
/// Unknown keys are allowed; missing required fields and kind mismatches are not.
pub fn validate_fields(fields: &[FieldSpec], payload: &Value) -> Result<(), String> {
    let Some(object) = payload.as_object() else {
        return Err("payload must be a JSON object".to_string());
    };
    for field in fields {
        match object.get(&field.name) {
            None | Some(Value::Null) if field.required => {
                return Err(format!("missing required field '{}'", field.name));
            }
            Some(value) if !field.kind.accepts(value) => {
                return Err(format!(
                    "field '{}' expects {:?}, got {value}",
                    field.name, field.kind
                ));
            }
            _ => {}
        }
    }
    Ok(())
}
