//! Persistence interface the kernel consumes.
//!
//! The kernel never talks to a database directly; it reads and writes pages
//! and content items through [`PageStore`].

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::types::{ContentItem, Page};

/// Errors reported by a page store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("page {0} not found")]
    PageNotFound(Uuid),

    #[error("invalid record: {0}")]
    Invalid(String),

    #[error("store backend error: {0}")]
    Backend(String),
}

/// CRUD over pages and their content items.
///
/// Ordering contracts:
/// - `children` and `roots` return pages sorted by sibling ordering key.
/// - `ancestors` returns the parent chain nearest-first, stopping at the root.
/// - `content_for_region` returns items in insertion order; callers sort.
#[async_trait]
pub trait PageStore: Send + Sync {
    async fn page(&self, id: Uuid) -> Result<Option<Page>, StoreError>;

    async fn page_by_url(&self, url: &str) -> Result<Option<Page>, StoreError>;

    async fn roots(&self) -> Result<Vec<Page>, StoreError>;

    async fn children(&self, parent_id: Uuid) -> Result<Vec<Page>, StoreError>;

    async fn ancestors(&self, id: Uuid) -> Result<Vec<Page>, StoreError>;

    /// Pages whose extension attribute `name` equals `value`.
    async fn pages_with_attribute(&self, name: &str, value: &Value)
    -> Result<Vec<Page>, StoreError>;

    async fn content_for_region(
        &self,
        page_id: Uuid,
        region: &str,
    ) -> Result<Vec<ContentItem>, StoreError>;

    async fn content_for_page(&self, page_id: Uuid) -> Result<Vec<ContentItem>, StoreError>;

    /// Insert or update a page. The store computes `cached_url`.
    async fn save_page(&self, page: Page) -> Result<Page, StoreError>;

    async fn save_content(&self, item: ContentItem) -> Result<ContentItem, StoreError>;

    /// Delete a page, its content, and its descendants.
    async fn delete_page(&self, id: Uuid) -> Result<(), StoreError>;
}
