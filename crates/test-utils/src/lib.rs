//! Pagina test utilities.
//!
//! Helpers for integration testing: page and content builders, a store
//! wrapper that records region fetches, a content type that counts renders,
//! and assertion helpers for rendered HTML.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use pagina_sdk::prelude::*;
use parking_lot::Mutex;
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// Start building a root page.
pub fn test_page(title: &str, slug: &str) -> TestPage {
    TestPage {
        page: Page::new(title, slug),
    }
}

/// A page builder for creating test fixtures.
#[derive(Debug, Clone)]
pub struct TestPage {
    page: Page,
}

impl TestPage {
    pub fn with_id(mut self, id: Uuid) -> Self {
        self.page.id = id;
        self
    }

    /// Place the page below `parent`.
    pub fn child_of(mut self, parent: &Page) -> Self {
        self.page.parent_id = Some(parent.id);
        self
    }

    pub fn with_template(mut self, key: &str) -> Self {
        self.page.template_key = Some(key.to_string());
        self
    }

    pub fn ordering(mut self, ordering: i32) -> Self {
        self.page.ordering = ordering;
        self
    }

    /// Keep the page out of navigation.
    pub fn hidden(mut self) -> Self {
        self.page.in_navigation = false;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.page.active = false;
        self
    }

    pub fn redirect_to(mut self, target: &str) -> Self {
        self.page.redirect_to = Some(target.to_string());
        self
    }

    /// Set an extension attribute.
    pub fn with_attribute(mut self, name: &str, value: JsonValue) -> Self {
        self.page.attributes.insert(name.to_string(), value);
        self
    }

    pub fn build(self) -> Page {
        self.page
    }

    /// Save through `store`, which computes the page URL.
    pub async fn save(self, store: &dyn PageStore) -> Result<Page, StoreError> {
        store.save_page(self.page).await
    }
}

/// Start building a content item.
pub fn test_content(page: &Page, region: &str, content_type: &str) -> TestContent {
    TestContent {
        item: ContentItem::new(page.id, region, content_type, serde_json::json!({})),
    }
}

/// A content item builder.
#[derive(Debug, Clone)]
pub struct TestContent {
    item: ContentItem,
}

impl TestContent {
    pub fn ordering(mut self, ordering: i32) -> Self {
        self.item.ordering = ordering;
        self
    }

    pub fn with_payload(mut self, payload: JsonValue) -> Self {
        self.item.payload = payload;
        self
    }

    /// Shorthand for a `{ "text": ... }` payload.
    pub fn with_text(self, text: &str) -> Self {
        self.with_payload(serde_json::json!({ "text": text }))
    }

    pub fn build(self) -> ContentItem {
        self.item
    }

    pub async fn save(self, store: &dyn PageStore) -> Result<ContentItem, StoreError> {
        store.save_content(self.item).await
    }
}

/// Wraps a store and records every region fetch.
pub struct RecordingStore {
    inner: Arc<dyn PageStore>,
    region_fetches: Mutex<Vec<(Uuid, String)>>,
}

impl RecordingStore {
    pub fn new(inner: Arc<dyn PageStore>) -> Self {
        Self {
            inner,
            region_fetches: Mutex::new(Vec::new()),
        }
    }

    /// `(page, region)` pairs passed to `content_for_region`, in call order.
    pub fn region_fetches(&self) -> Vec<(Uuid, String)> {
        self.region_fetches.lock().clone()
    }

    /// Regions fetched for `page_id`.
    pub fn regions_fetched_for(&self, page_id: Uuid) -> Vec<String> {
        self.region_fetches
            .lock()
            .iter()
            .filter(|(id, _)| *id == page_id)
            .map(|(_, region)| region.clone())
            .collect()
    }

    pub fn clear(&self) {
        self.region_fetches.lock().clear();
    }
}

#[async_trait]
impl PageStore for RecordingStore {
    async fn page(&self, id: Uuid) -> Result<Option<Page>, StoreError> {
        self.inner.page(id).await
    }

    async fn page_by_url(&self, url: &str) -> Result<Option<Page>, StoreError> {
        self.inner.page_by_url(url).await
    }

    async fn roots(&self) -> Result<Vec<Page>, StoreError> {
        self.inner.roots().await
    }

    async fn children(&self, parent_id: Uuid) -> Result<Vec<Page>, StoreError> {
        self.inner.children(parent_id).await
    }

    async fn ancestors(&self, id: Uuid) -> Result<Vec<Page>, StoreError> {
        self.inner.ancestors(id).await
    }

    async fn pages_with_attribute(
        &self,
        name: &str,
        value: &JsonValue,
    ) -> Result<Vec<Page>, StoreError> {
        self.inner.pages_with_attribute(name, value).await
    }

    async fn content_for_region(
        &self,
        page_id: Uuid,
        region: &str,
    ) -> Result<Vec<ContentItem>, StoreError> {
        self.region_fetches.lock().push((page_id, region.to_string()));
        self.inner.content_for_region(page_id, region).await
    }

    async fn content_for_page(&self, page_id: Uuid) -> Result<Vec<ContentItem>, StoreError> {
        self.inner.content_for_page(page_id).await
    }

    async fn save_page(&self, page: Page) -> Result<Page, StoreError> {
        self.inner.save_page(page).await
    }

    async fn save_content(&self, item: ContentItem) -> Result<ContentItem, StoreError> {
        self.inner.save_content(item).await
    }

    async fn delete_page(&self, id: Uuid) -> Result<(), StoreError> {
        self.inner.delete_page(id).await
    }
}

/// Content type `counted` that renders its `text` payload and counts calls.
#[derive(Debug, Default)]
pub struct CountingContentType {
    renders: AtomicUsize,
}

impl CountingContentType {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn renders(&self) -> usize {
        self.renders.load(Ordering::SeqCst)
    }
}

impl ContentType for CountingContentType {
    fn type_name(&self) -> &str {
        "counted"
    }

    fn label(&self) -> &str {
        "Counted"
    }

    fn render(&self, item: &ContentItem, _ctx: &RenderContext<'_>) -> Result<String, RenderError> {
        self.renders.fetch_add(1, Ordering::SeqCst);
        Ok(format!(
            "<p>{}</p>",
            html_escape(item.payload_str("text").unwrap_or_default())
        ))
    }
}

/// Content type `failing` whose render always errors.
#[derive(Debug, Default)]
pub struct FailingContentType;

impl ContentType for FailingContentType {
    fn type_name(&self) -> &str {
        "failing"
    }

    fn label(&self) -> &str {
        "Failing"
    }

    fn render(&self, _item: &ContentItem, _ctx: &RenderContext<'_>) -> Result<String, RenderError> {
        Err(RenderError::payload("failing", "render failed"))
    }
}

/// Extension attributes as a map, for fixtures.
pub fn attributes(pairs: &[(&str, JsonValue)]) -> BTreeMap<String, JsonValue> {
    pairs
        .iter()
        .map(|(name, value)| ((*name).to_string(), value.clone()))
        .collect()
}

/// Assertion helpers for rendered output.
pub mod assert {
    /// Assert that a string contains a substring.
    pub fn contains(haystack: &str, needle: &str) {
        assert!(
            haystack.contains(needle),
            "Expected string to contain '{needle}'\nActual: {haystack}"
        );
    }

    /// Assert that a string does not contain a substring.
    pub fn not_contains(haystack: &str, needle: &str) {
        assert!(
            !haystack.contains(needle),
            "Expected string to NOT contain '{needle}'\nActual: {haystack}"
        );
    }

    /// Assert that `first` appears before `second`.
    pub fn in_order(haystack: &str, first: &str, second: &str) {
        let a = haystack.find(first);
        let b = haystack.find(second);
        assert!(
            matches!((a, b), (Some(a), Some(b)) if a < b),
            "Expected '{first}' before '{second}'\nActual: {haystack}"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_builder() {
        let parent = test_page("Parent", "parent").build();
        let page = test_page("Child", "child")
            .child_of(&parent)
            .with_template("article")
            .ordering(3)
            .hidden()
            .with_attribute("featured", serde_json::json!(true))
            .build();

        assert_eq!(page.parent_id, Some(parent.id));
        assert_eq!(page.template_key.as_deref(), Some("article"));
        assert_eq!(page.ordering, 3);
        assert!(!page.in_navigation);
        assert!(page.active);
        assert_eq!(page.attribute::<bool>("featured"), Some(true));
    }

    #[test]
    fn test_content_builder() {
        let page = test_page("Home", "home").build();
        let item = test_content(&page, "main", "richtext")
            .ordering(2)
            .with_text("hello")
            .build();
        assert_eq!(item.page_id, page.id);
        assert_eq!(item.ordering, 2);
        assert_eq!(item.payload_str("text"), Some("hello"));
    }

    #[test]
    fn test_assertions() {
        assert::contains("hello world", "world");
        assert::not_contains("hello world", "foo");
        assert::in_order("a b c", "a", "c");
    }
}
