//! Page service.
//!
//! Validated writes of pages and content items. Everything that reaches the
//! store through here has passed the page model's checks.

use std::collections::BTreeMap;
use std::sync::{Arc, LazyLock};

use chrono::{SecondsFormat, Utc};
use pagina_sdk::store::{PageStore, StoreError};
use pagina_sdk::types::{ContentItem, Page};
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::error::ContentError;
use crate::model::PageModel;

/// Lowercase words separated by single dashes.
///
/// # Panics
///
/// Panics if the hard-coded regex literal is invalid (impossible in practice).
#[allow(clippy::expect_used)]
static VALID_SLUG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]+(-[a-z0-9]+)*$").expect("valid regex literal"));

/// Input for creating a page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreatePage {
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub parent_id: Option<Uuid>,
    #[serde(default)]
    pub template_key: Option<String>,
    #[serde(default)]
    pub ordering: i32,
    #[serde(default)]
    pub override_url: Option<String>,
    #[serde(default)]
    pub redirect_to: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default)]
    pub in_navigation: Option<bool>,
    #[serde(default)]
    pub attributes: BTreeMap<String, Value>,
}

/// Service for page and content writes.
#[derive(Clone)]
pub struct PageService {
    inner: Arc<PageServiceInner>,
}

struct PageServiceInner {
    model: Arc<PageModel>,
    store: Arc<dyn PageStore>,
}

impl PageService {
    pub fn new(model: Arc<PageModel>, store: Arc<dyn PageStore>) -> Self {
        Self {
            inner: Arc::new(PageServiceInner { model, store }),
        }
    }

    pub async fn load(&self, id: Uuid) -> Result<Option<Page>, ContentError> {
        Ok(self.inner.store.page(id).await?)
    }

    /// Create a page below `input.parent_id` (or as a root).
    pub async fn create_page(&self, input: CreatePage) -> Result<Page, ContentError> {
        let mut page = Page::new(input.title, input.slug);
        page.parent_id = input.parent_id;
        page.template_key = input.template_key;
        page.ordering = input.ordering;
        page.override_url = input.override_url;
        page.redirect_to = input.redirect_to;
        page.active = input.active.unwrap_or(true);
        page.in_navigation = input.in_navigation.unwrap_or(true);
        page.attributes = input.attributes;

        if self.inner.model.is_active("changedate") {
            let now = Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true));
            page.attributes
                .entry("creation_date".to_string())
                .or_insert_with(|| now.clone());
            page.attributes.insert("modification_date".to_string(), now);
        }

        let page = self.save(page).await?;
        info!(page = %page.id, url = %page.url(), "page created");
        Ok(page)
    }

    /// Save changes to an existing page.
    pub async fn update_page(&self, mut page: Page) -> Result<Page, ContentError> {
        if self.inner.store.page(page.id).await?.is_none() {
            return Err(StoreError::PageNotFound(page.id).into());
        }
        if self.inner.model.is_active("changedate") {
            let now = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
            page.attributes
                .insert("modification_date".to_string(), Value::String(now));
        }
        let page = self.save(page).await?;
        info!(page = %page.id, "page updated");
        Ok(page)
    }

    async fn save(&self, page: Page) -> Result<Page, ContentError> {
        let model = &self.inner.model;

        if !VALID_SLUG.is_match(&page.slug) {
            return Err(ContentError::InvalidSlug(page.slug));
        }
        if let Some(key) = &page.template_key
            && model.templates().get(key).is_none()
        {
            return Err(ContentError::UnknownTemplate(key.clone()));
        }
        let mut parent_url = None;
        if let Some(parent_id) = page.parent_id {
            let parent = self
                .inner
                .store
                .page(parent_id)
                .await?
                .ok_or(StoreError::PageNotFound(parent_id))?;
            if model.template_for(&parent).is_some_and(|t| t.enforce_leaf) {
                return Err(ContentError::LeafTemplate(parent.title));
            }
            parent_url = Some(parent.url().to_string());
        }
        model.validate_attributes(&page)?;

        let url = page.compute_url(parent_url.as_deref());
        if let Some(existing) = self.inner.store.page_by_url(&url).await?
            && existing.id != page.id
        {
            return Err(ContentError::DuplicateUrl {
                url,
                existing: existing.id,
            });
        }

        Ok(self.inner.store.save_page(page).await?)
    }

    /// Add a content item to its page.
    pub async fn add_content(&self, item: ContentItem) -> Result<ContentItem, ContentError> {
        let page = self
            .inner
            .store
            .page(item.page_id)
            .await?
            .ok_or(StoreError::PageNotFound(item.page_id))?;
        self.inner.model.validate_content(&page, &item)?;

        let item = self.inner.store.save_content(item).await?;
        info!(
            item = %item.id,
            page = %item.page_id,
            region = %item.region,
            content_type = %item.content_type,
            "content added"
        );
        Ok(item)
    }

    /// Delete a page with its content and descendants.
    pub async fn delete_page(&self, id: Uuid) -> Result<(), ContentError> {
        self.inner.store.delete_page(id).await?;
        info!(page = %id, "page deleted");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::site::SiteBuilder;
    use crate::store::MemoryPageStore;
    use pagina_sdk::types::{Region, Template};
    use serde_json::json;

    fn service() -> PageService {
        let mut builder = SiteBuilder::new();
        builder
            .register_templates([
                Template::new("standard", "Standard", "page.html")
                    .region(Region::new("main", "Main")),
                Template::new("article", "Article", "page.html")
                    .region(Region::new("main", "Main"))
                    .enforce_leaf(),
            ])
            .unwrap()
            .register_builtin_content_types()
            .unwrap()
            .register_extensions(&["changedate", "seo"])
            .unwrap();
        let site = builder.build();
        PageService::new(site.model, Arc::new(MemoryPageStore::new()))
    }

    fn input(title: &str, slug: &str) -> CreatePage {
        CreatePage {
            title: title.to_string(),
            slug: slug.to_string(),
            ..CreatePage::default()
        }
    }

    #[tokio::test]
    async fn create_page_computes_url_and_dates() {
        let service = service();
        let parent = service.create_page(input("Company", "company")).await.unwrap();
        let child = service
            .create_page(CreatePage {
                parent_id: Some(parent.id),
                ..input("About us", "about-us")
            })
            .await
            .unwrap();
        assert_eq!(child.url(), "/company/about-us/");
        assert!(child.attributes.contains_key("creation_date"));
        assert!(child.attributes.contains_key("modification_date"));
    }

    #[tokio::test]
    async fn rejects_bad_slug_and_unknown_attribute() {
        let service = service();
        let err = service.create_page(input("Bad", "Bad Slug")).await.unwrap_err();
        assert!(matches!(err, ContentError::InvalidSlug(_)));

        let mut attributes = BTreeMap::new();
        attributes.insert("featured".to_string(), json!(true));
        let err = service
            .create_page(CreatePage {
                attributes,
                ..input("Home", "home")
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ContentError::UnknownField(f) if f == "featured"));
    }

    #[tokio::test]
    async fn urls_stay_unique() {
        let service = service();
        let first = service.create_page(input("About", "about")).await.unwrap();

        let err = service.create_page(input("About again", "about")).await.unwrap_err();
        assert!(matches!(
            &err,
            ContentError::DuplicateUrl { url, existing } if url == "/about/" && *existing == first.id
        ));

        let err = service
            .create_page(CreatePage {
                override_url: Some("/about/".to_string()),
                ..input("Contact", "contact")
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ContentError::DuplicateUrl { .. }));

        let parent = service.create_page(input("Company", "company")).await.unwrap();
        service
            .create_page(CreatePage {
                parent_id: Some(parent.id),
                ..input("About", "about")
            })
            .await
            .unwrap();

        let mut renamed = first.clone();
        renamed.title = "About us".to_string();
        service.update_page(renamed).await.unwrap();
    }

    #[tokio::test]
    async fn leaf_templates_refuse_children() {
        let service = service();
        let article = service
            .create_page(CreatePage {
                template_key: Some("article".to_string()),
                ..input("Article", "article")
            })
            .await
            .unwrap();
        let err = service
            .create_page(CreatePage {
                parent_id: Some(article.id),
                ..input("Child", "child")
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ContentError::LeafTemplate(_)));
    }

    #[tokio::test]
    async fn add_content_validates_payload() {
        let service = service();
        let page = service.create_page(input("Home", "home")).await.unwrap();

        let ok = ContentItem::new(page.id, "main", "richtext", json!({"text": "<p>Hi</p>"}));
        service.add_content(ok).await.unwrap();

        let missing = ContentItem::new(page.id, "main", "richtext", json!({}));
        let err = service.add_content(missing).await.unwrap_err();
        assert!(matches!(err, ContentError::InvalidPayload { .. }));

        let orphan = ContentItem::new(Uuid::now_v7(), "main", "richtext", json!({"text": "x"}));
        let err = service.add_content(orphan).await.unwrap_err();
        assert!(matches!(err, ContentError::Store(StoreError::PageNotFound(_))));
    }
}
