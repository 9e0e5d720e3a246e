//! In-memory page store.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use pagina_sdk::store::{PageStore, StoreError};
use pagina_sdk::types::{ContentItem, Page};
use parking_lot::RwLock;
use serde_json::Value;
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    pages: HashMap<Uuid, Page>,
    /// Content in insertion order.
    content: Vec<ContentItem>,
}

impl Tables {
    fn sorted_children(&self, parent_id: Option<Uuid>) -> Vec<Page> {
        let mut children: Vec<Page> = self
            .pages
            .values()
            .filter(|p| p.parent_id == parent_id)
            .cloned()
            .collect();
        children.sort_by(|a, b| (a.ordering, a.id).cmp(&(b.ordering, b.id)));
        children
    }

    /// Recompute `cached_url` for `id` and everything below it.
    fn refresh_urls(&mut self, id: Uuid) {
        let parent_url = self
            .pages
            .get(&id)
            .and_then(|p| p.parent_id)
            .and_then(|pid| self.pages.get(&pid))
            .map(|p| p.cached_url.clone());

        let mut queue = vec![(id, parent_url)];
        let mut seen = HashSet::new();
        while let Some((id, parent_url)) = queue.pop() {
            if !seen.insert(id) {
                continue;
            }
            let Some(page) = self.pages.get_mut(&id) else {
                continue;
            };
            page.cached_url = page.compute_url(parent_url.as_deref());
            let url = page.cached_url.clone();
            for child in self.pages.values().filter(|p| p.parent_id == Some(id)) {
                queue.push((child.id, Some(url.clone())));
            }
        }
    }

    fn descendants(&self, id: Uuid) -> HashSet<Uuid> {
        let mut found = HashSet::from([id]);
        let mut queue = vec![id];
        while let Some(current) = queue.pop() {
            for child in self.pages.values().filter(|p| p.parent_id == Some(current)) {
                if found.insert(child.id) {
                    queue.push(child.id);
                }
            }
        }
        found
    }
}

/// Page store backed by hash maps behind a read-write lock.
#[derive(Default)]
pub struct MemoryPageStore {
    tables: RwLock<Tables>,
}

impl MemoryPageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page_count(&self) -> usize {
        self.tables.read().pages.len()
    }
}

#[async_trait]
impl PageStore for MemoryPageStore {
    async fn page(&self, id: Uuid) -> Result<Option<Page>, StoreError> {
        Ok(self.tables.read().pages.get(&id).cloned())
    }

    async fn page_by_url(&self, url: &str) -> Result<Option<Page>, StoreError> {
        Ok(self
            .tables
            .read()
            .pages
            .values()
            .find(|p| p.cached_url == url)
            .cloned())
    }

    async fn roots(&self) -> Result<Vec<Page>, StoreError> {
        Ok(self.tables.read().sorted_children(None))
    }

    async fn children(&self, parent_id: Uuid) -> Result<Vec<Page>, StoreError> {
        Ok(self.tables.read().sorted_children(Some(parent_id)))
    }

    async fn ancestors(&self, id: Uuid) -> Result<Vec<Page>, StoreError> {
        let tables = self.tables.read();
        let mut chain = Vec::new();
        let mut seen = HashSet::from([id]);
        let mut next = tables.pages.get(&id).and_then(|p| p.parent_id);
        while let Some(parent_id) = next {
            if !seen.insert(parent_id) {
                return Err(StoreError::Invalid(format!(
                    "page {id} has a cycle in its parent chain"
                )));
            }
            let Some(parent) = tables.pages.get(&parent_id) else {
                break;
            };
            next = parent.parent_id;
            chain.push(parent.clone());
        }
        Ok(chain)
    }

    async fn pages_with_attribute(
        &self,
        name: &str,
        value: &Value,
    ) -> Result<Vec<Page>, StoreError> {
        let tables = self.tables.read();
        let mut pages: Vec<Page> = tables
            .pages
            .values()
            .filter(|p| p.attributes.get(name) == Some(value))
            .cloned()
            .collect();
        pages.sort_by_key(|p| p.id);
        Ok(pages)
    }

    async fn content_for_region(
        &self,
        page_id: Uuid,
        region: &str,
    ) -> Result<Vec<ContentItem>, StoreError> {
        Ok(self
            .tables
            .read()
            .content
            .iter()
            .filter(|c| c.page_id == page_id && c.region == region)
            .cloned()
            .collect())
    }

    async fn content_for_page(&self, page_id: Uuid) -> Result<Vec<ContentItem>, StoreError> {
        Ok(self
            .tables
            .read()
            .content
            .iter()
            .filter(|c| c.page_id == page_id)
            .cloned()
            .collect())
    }

    async fn save_page(&self, page: Page) -> Result<Page, StoreError> {
        let mut tables = self.tables.write();
        if let Some(parent_id) = page.parent_id {
            if !tables.pages.contains_key(&parent_id) {
                return Err(StoreError::PageNotFound(parent_id));
            }
            if tables.descendants(page.id).contains(&parent_id) {
                return Err(StoreError::Invalid(format!(
                    "page {} cannot be moved below its own descendant",
                    page.id
                )));
            }
        }
        let id = page.id;
        tables.pages.insert(id, page);
        tables.refresh_urls(id);
        tables
            .pages
            .get(&id)
            .cloned()
            .ok_or(StoreError::PageNotFound(id))
    }

    async fn save_content(&self, item: ContentItem) -> Result<ContentItem, StoreError> {
        let mut tables = self.tables.write();
        if !tables.pages.contains_key(&item.page_id) {
            return Err(StoreError::PageNotFound(item.page_id));
        }
        match tables.content.iter_mut().find(|c| c.id == item.id) {
            Some(existing) => *existing = item.clone(),
            None => tables.content.push(item.clone()),
        }
        Ok(item)
    }

    async fn delete_page(&self, id: Uuid) -> Result<(), StoreError> {
        let mut tables = self.tables.write();
        if !tables.pages.contains_key(&id) {
            return Err(StoreError::PageNotFound(id));
        }
        let doomed = tables.descendants(id);
        tables.pages.retain(|pid, _| !doomed.contains(pid));
        tables.content.retain(|c| !doomed.contains(&c.page_id));
        Ok(())
    }
}
