//! YAML site fixtures.
//!
//! A fixture declares templates and a nested page tree with content:
//!
//! ```yaml
//! templates:
//!   - key: standard
//!     title: Standard
//!     path: page.html
//!     regions:
//!       - { key: main, title: Main }
//!       - { key: sidebar, title: Sidebar, inherited: true }
//! pages:
//!   - title: Home
//!     slug: home
//!     content:
//!       - { region: main, type: richtext, payload: { text: "<p>Hi</p>" } }
//!     children:
//!       - { title: About, slug: about }
//! ```

use std::collections::{BTreeMap, VecDeque};
use std::path::Path;

use anyhow::{Context, Result};
use pagina_sdk::types::{ContentItem, Template};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::content::{CreatePage, PageService};
use crate::error::ContentError;

/// Maximum fixture size (10 MB).
const MAX_FIXTURE_SIZE: u64 = 10 * 1024 * 1024;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SiteFixture {
    #[serde(default)]
    pub templates: Vec<Template>,
    #[serde(default)]
    pub pages: Vec<FixturePage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FixturePage {
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub template: Option<String>,
    #[serde(default)]
    pub ordering: i32,
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default)]
    pub in_navigation: Option<bool>,
    #[serde(default)]
    pub override_url: Option<String>,
    #[serde(default)]
    pub redirect_to: Option<String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, Value>,
    #[serde(default)]
    pub content: Vec<FixtureContent>,
    #[serde(default)]
    pub children: Vec<FixturePage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FixtureContent {
    pub region: String,
    #[serde(rename = "type")]
    pub content_type: String,
    #[serde(default)]
    pub ordering: Option<i32>,
    #[serde(default)]
    pub payload: Value,
}

impl SiteFixture {
    pub fn from_yaml(source: &str) -> Result<Self> {
        serde_yml::from_str(source).context("failed to parse site fixture")
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let size = std::fs::metadata(path)
            .with_context(|| format!("failed to stat fixture {}", path.display()))?
            .len();
        if size > MAX_FIXTURE_SIZE {
            anyhow::bail!(
                "fixture {} is {size} bytes, larger than the {MAX_FIXTURE_SIZE} byte limit",
                path.display()
            );
        }
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read fixture {}", path.display()))?;
        Self::from_yaml(&source)
    }

    /// Create every page and content item through `service`, parents first.
    ///
    /// Content without an explicit ordering is numbered in declaration order.
    pub async fn load_into(&self, service: &PageService) -> Result<usize, ContentError> {
        let mut queue: VecDeque<(Option<Uuid>, &FixturePage)> =
            self.pages.iter().map(|p| (None, p)).collect();
        let mut created = 0;

        while let Some((parent_id, fixture)) = queue.pop_front() {
            let page = service
                .create_page(CreatePage {
                    title: fixture.title.clone(),
                    slug: fixture.slug.clone(),
                    parent_id,
                    template_key: fixture.template.clone(),
                    ordering: fixture.ordering,
                    override_url: fixture.override_url.clone(),
                    redirect_to: fixture.redirect_to.clone(),
                    active: fixture.active,
                    in_navigation: fixture.in_navigation,
                    attributes: fixture.attributes.clone(),
                })
                .await?;
            created += 1;

            for (index, content) in fixture.content.iter().enumerate() {
                let ordering = content
                    .ordering
                    .unwrap_or_else(|| i32::try_from(index).unwrap_or(i32::MAX));
                let item = ContentItem::new(
                    page.id,
                    &content.region,
                    &content.content_type,
                    content.payload.clone(),
                )
                .ordering(ordering);
                service.add_content(item).await?;
            }

            queue.extend(fixture.children.iter().map(|c| (Some(page.id), c)));
        }

        info!(pages = created, "loaded site fixture");
        Ok(created)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"
templates:
  - key: standard
    title: Standard
    path: page.html
    regions:
      - { key: main, title: Main }
pages:
  - title: Home
    slug: home
    content:
      - { region: main, type: richtext, payload: { text: "<p>Hi</p>" } }
    children:
      - { title: About, slug: about, ordering: 1 }
      - { title: Team, slug: team, ordering: 0, in_navigation: false }
"#;

    #[test]
    fn parses_nested_pages() {
        let fixture = SiteFixture::from_yaml(FIXTURE).unwrap();
        assert_eq!(fixture.templates.len(), 1);
        assert!(fixture.templates[0].has_region("main"));
        let home = &fixture.pages[0];
        assert_eq!(home.content[0].content_type, "richtext");
        assert_eq!(home.children.len(), 2);
        assert_eq!(home.children[1].in_navigation, Some(false));
    }

    #[test]
    fn invalid_yaml_is_reported() {
        let err = SiteFixture::from_yaml("pages: [ {title: 1").unwrap_err();
        assert!(err.to_string().contains("site fixture"));
    }
}
