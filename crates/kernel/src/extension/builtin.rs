//! Built-in extensions.

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::header;
use chrono::{DateTime, Utc};
use pagina_sdk::navigation::NAVIGATION_EXTENSION_FIELD;
use pagina_sdk::store::{PageStore, StoreError};
use pagina_sdk::types::{FieldKind, FieldSpec, Page};
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use super::registry::{Activation, Extension};
use crate::error::{ConfigError, DispatchError};
use crate::navigation::NavigationRegistry;
use crate::processor::{RequestProcessor, ResponseProcessor};
use crate::request::{PageRequest, PageResponse};

pub(super) fn builtin_extensions() -> Vec<Arc<dyn Extension>> {
    vec![
        Arc::new(ChangeDateExtension),
        Arc::new(DatePublisherExtension),
        Arc::new(FieldGroupExtension::new(
            "excerpt",
            vec![FieldSpec::new("excerpt", FieldKind::TextLong).label("Excerpt")],
        )),
        Arc::new(FieldGroupExtension::new(
            "featured",
            vec![FieldSpec::new("featured", FieldKind::Boolean).label("Featured")],
        )),
        Arc::new(FieldGroupExtension::new(
            "seo",
            vec![
                FieldSpec::new("meta_keywords", FieldKind::Text).label("Meta keywords"),
                FieldSpec::new("meta_description", FieldKind::TextLong).label("Meta description"),
            ],
        )),
        Arc::new(FieldGroupExtension::new(
            "titles",
            vec![
                FieldSpec::new("content_title", FieldKind::Text).label("Content title"),
                FieldSpec::new("page_title", FieldKind::Text).label("Page title"),
            ],
        )),
        Arc::new(FieldGroupExtension::new(
            "symlinks",
            vec![FieldSpec::new("symlinked_page", FieldKind::PageRef).label("Symlinked page")],
        )),
        Arc::new(FieldGroupExtension::new(
            "translations",
            vec![
                FieldSpec::new("language", FieldKind::Language).label("Language"),
                FieldSpec::new("translation_of", FieldKind::PageRef).label("Translation of"),
            ],
        )),
        Arc::new(NavigationExtensionField),
    ]
}

/// An extension that only adds attribute fields.
pub struct FieldGroupExtension {
    name: String,
    fields: Vec<FieldSpec>,
}

impl FieldGroupExtension {
    pub fn new(name: impl Into<String>, fields: Vec<FieldSpec>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }
}

impl Extension for FieldGroupExtension {
    fn name(&self) -> &str {
        &self.name
    }

    fn fields(&self) -> Vec<FieldSpec> {
        self.fields.clone()
    }
}

/// `navigation`: lets pages delegate their children to a navigation extension.
pub struct NavigationExtensionField;

impl Extension for NavigationExtensionField {
    fn name(&self) -> &str {
        "navigation"
    }

    fn fields(&self) -> Vec<FieldSpec> {
        vec![FieldSpec::new(NAVIGATION_EXTENSION_FIELD, FieldKind::Text).label("Navigation extension")]
    }

    fn prepare(&self, navigation: &NavigationRegistry) -> Result<(), ConfigError> {
        if navigation.is_empty() {
            return Err(ConfigError::NavigationExtensionsMissing);
        }
        Ok(())
    }
}

/// `changedate`: creation and modification timestamps, plus `Last-Modified`.
pub struct ChangeDateExtension;

impl Extension for ChangeDateExtension {
    fn name(&self) -> &str {
        "changedate"
    }

    fn fields(&self) -> Vec<FieldSpec> {
        vec![
            FieldSpec::new("creation_date", FieldKind::DateTime).label("Creation date"),
            FieldSpec::new("modification_date", FieldKind::DateTime).label("Modification date"),
        ]
    }

    fn activate(&self, activation: &mut Activation<'_>) {
        activation.response_processor(LastModifiedResponseProcessor);
    }
}

/// `datepublisher`: pages are visible only inside their publication window.
pub struct DatePublisherExtension;

impl Extension for DatePublisherExtension {
    fn name(&self) -> &str {
        "datepublisher"
    }

    fn fields(&self) -> Vec<FieldSpec> {
        vec![
            FieldSpec::new("publication_date", FieldKind::DateTime).label("Publication date"),
            FieldSpec::new("publication_end_date", FieldKind::DateTime)
                .label("Publication end date"),
        ]
    }

    fn activate(&self, activation: &mut Activation<'_>) {
        activation.request_processor(PublicationWindowProcessor::default());
    }
}

fn date_attribute(page: &Page, name: &str) -> Option<DateTime<Utc>> {
    let raw = page.attribute_str(name)?;
    DateTime::parse_from_rfc3339(raw)
        .map(|d| d.with_timezone(&Utc))
        .ok()
}

/// Answers 404 before `publication_date` and from `publication_end_date` on.
pub struct PublicationWindowProcessor {
    clock: fn() -> DateTime<Utc>,
}

impl PublicationWindowProcessor {
    /// Use a fixed clock, mainly for tests.
    pub fn with_clock(clock: fn() -> DateTime<Utc>) -> Self {
        Self { clock }
    }

    /// Whether `page` is published at `now`.
    pub fn is_published(page: &Page, now: DateTime<Utc>) -> bool {
        let started = date_attribute(page, "publication_date").is_none_or(|start| start <= now);
        let ended = date_attribute(page, "publication_end_date").is_some_and(|end| end <= now);
        started && !ended
    }
}

impl Default for PublicationWindowProcessor {
    fn default() -> Self {
        Self::with_clock(Utc::now)
    }
}

#[async_trait]
impl RequestProcessor for PublicationWindowProcessor {
    fn name(&self) -> &str {
        "datepublisher"
    }

    async fn process(
        &self,
        page: &Page,
        _request: &PageRequest,
    ) -> Result<Option<PageResponse>, DispatchError> {
        if Self::is_published(page, (self.clock)()) {
            return Ok(None);
        }
        debug!(page = %page.id, "page outside its publication window");
        Ok(Some(PageResponse::not_found()))
    }
}

/// Sets `Last-Modified` from the `modification_date` attribute.
pub struct LastModifiedResponseProcessor;

#[async_trait]
impl ResponseProcessor for LastModifiedResponseProcessor {
    fn name(&self) -> &str {
        "changedate"
    }

    async fn process(
        &self,
        page: &Page,
        _request: &PageRequest,
        response: &mut PageResponse,
    ) -> Result<(), DispatchError> {
        let Some(modified) = date_attribute(page, "modification_date") else {
            return Ok(());
        };
        let value = modified.format("%a, %d %b %Y %H:%M:%S GMT").to_string();
        response
            .set_header(header::LAST_MODIFIED, &value)
            .map_err(|e| DispatchError::processor(self.name(), e))
    }
}

/// Title for the browser window: `page_title` if set, else the page title.
pub fn page_title(page: &Page) -> &str {
    page.attribute_str("page_title")
        .filter(|t| !t.is_empty())
        .unwrap_or(&page.title)
}

/// Title for the content heading: `content_title` if set, else the page title.
pub fn content_title(page: &Page) -> &str {
    page.attribute_str("content_title")
        .filter(|t| !t.is_empty())
        .unwrap_or(&page.title)
}

fn translation_of(page: &Page) -> Option<Uuid> {
    page.attribute_str("translation_of")
        .and_then(|s| Uuid::parse_str(s).ok())
}

/// The page this one translates, or the page itself if it is an original.
pub async fn original_translation(store: &dyn PageStore, page: &Page) -> Result<Page, StoreError> {
    match translation_of(page) {
        Some(id) => store.page(id).await?.ok_or(StoreError::PageNotFound(id)),
        None => Ok(page.clone()),
    }
}

/// Other language versions of `page`, the original first.
pub async fn available_translations(
    store: &dyn PageStore,
    page: &Page,
) -> Result<Vec<Page>, StoreError> {
    let original = original_translation(store, page).await?;
    let siblings = store
        .pages_with_attribute("translation_of", &Value::String(original.id.to_string()))
        .await?;

    Ok(std::iter::once(original)
        .chain(siblings)
        .filter(|p| p.id != page.id)
        .collect())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use chrono::TimeZone;
    use serde_json::json;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn page_with(attrs: &[(&str, Value)]) -> Page {
        let mut page = Page::new("News", "news");
        for (name, value) in attrs {
            page.attributes.insert((*name).to_string(), value.clone());
        }
        page
    }

    #[test]
    fn publication_window() {
        let now = fixed_now();
        assert!(PublicationWindowProcessor::is_published(&page_with(&[]), now));
        let future = page_with(&[("publication_date", json!("2024-07-01T00:00:00Z"))]);
        assert!(!PublicationWindowProcessor::is_published(&future, now));
        let expired = page_with(&[
            ("publication_date", json!("2024-01-01T00:00:00Z")),
            ("publication_end_date", json!("2024-05-01T00:00:00Z")),
        ]);
        assert!(!PublicationWindowProcessor::is_published(&expired, now));
        let live = page_with(&[("publication_end_date", json!("2024-12-31T00:00:00+02:00"))]);
        assert!(PublicationWindowProcessor::is_published(&live, now));
    }

    #[tokio::test]
    async fn expired_pages_answer_not_found() {
        let processor = PublicationWindowProcessor::with_clock(fixed_now);
        let expired = page_with(&[("publication_end_date", json!("2024-05-01T00:00:00Z"))]);
        let response = processor
            .process(&expired, &PageRequest::get("/news/"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(response.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn last_modified_uses_http_date() {
        let page = page_with(&[("modification_date", json!("2024-06-01T12:00:00Z"))]);
        let mut response = PageResponse::html("ok");
        LastModifiedResponseProcessor
            .process(&page, &PageRequest::get("/news/"), &mut response)
            .await
            .unwrap();
        assert_eq!(
            response.header(header::LAST_MODIFIED),
            Some("Sat, 01 Jun 2024 12:00:00 GMT")
        );
    }

    #[tokio::test]
    async fn translations_resolve_through_the_original() {
        let store = crate::store::MemoryPageStore::new();
        let english = store
            .save_page(page_with(&[("language", json!("en"))]))
            .await
            .unwrap();
        let of_english = json!(english.id.to_string());
        let mut german = page_with(&[
            ("language", json!("de")),
            ("translation_of", of_english.clone()),
        ]);
        german.slug = "nachrichten".to_string();
        let german = store.save_page(german).await.unwrap();
        let mut french =
            page_with(&[("language", json!("fr")), ("translation_of", of_english)]);
        french.slug = "nouvelles".to_string();
        let french = store.save_page(french).await.unwrap();

        assert_eq!(original_translation(&store, &english).await.unwrap().id, english.id);
        assert_eq!(original_translation(&store, &german).await.unwrap().id, english.id);

        let ids = |pages: Vec<Page>| pages.into_iter().map(|p| p.id).collect::<Vec<_>>();
        let from_english = ids(available_translations(&store, &english).await.unwrap());
        assert_eq!(from_english.len(), 2);
        assert!(from_english.contains(&german.id) && from_english.contains(&french.id));

        let from_german = ids(available_translations(&store, &german).await.unwrap());
        assert_eq!(from_german, vec![english.id, french.id]);
    }

    #[tokio::test]
    async fn dangling_translation_reference_is_an_error() {
        let store = crate::store::MemoryPageStore::new();
        let missing = Uuid::now_v7();
        let orphan = store
            .save_page(page_with(&[("translation_of", json!(missing.to_string()))]))
            .await
            .unwrap();
        let err = original_translation(&store, &orphan).await.unwrap_err();
        assert!(matches!(err, StoreError::PageNotFound(id) if id == missing));
    }

    #[test]
    fn titles_fall_back_to_page_title() {
        let page = page_with(&[("page_title", json!("News | Example"))]);
        assert_eq!(page_title(&page), "News | Example");
        assert_eq!(content_title(&page), "News");
    }
}
