//! Region rendering.
//!
//! Items are fetched per region, ordered by their ordering index, and
//! rendered one by one through their content type. Empty inherited regions
//! fall back to the nearest ancestor with content in that region.

use std::collections::BTreeMap;

use pagina_sdk::render::{RenderContext, TemplateRenderer};
use pagina_sdk::store::PageStore;
use pagina_sdk::types::{ContentItem, Page, Template};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::DispatchError;
use crate::model::PageModel;

/// Attribute naming the page whose content a page borrows.
pub const SYMLINKED_PAGE_FIELD: &str = "symlinked_page";

/// Renders the regions of a page's template.
pub struct RegionRenderer<'a> {
    model: &'a PageModel,
    store: &'a dyn PageStore,
    renderer: &'a dyn TemplateRenderer,
}

impl<'a> RegionRenderer<'a> {
    pub fn new(
        model: &'a PageModel,
        store: &'a dyn PageStore,
        renderer: &'a dyn TemplateRenderer,
    ) -> Self {
        Self {
            model,
            store,
            renderer,
        }
    }

    /// Render every region of `template`, keyed by region key.
    pub async fn render_regions(
        &self,
        page: &Page,
        template: &Template,
    ) -> Result<BTreeMap<String, String>, DispatchError> {
        let mut rendered = BTreeMap::new();
        for region in &template.regions {
            let html = self.render_region(page, template, &region.key).await?;
            rendered.insert(region.key.clone(), html);
        }
        Ok(rendered)
    }

    /// Render one region. A key the template does not declare renders empty.
    pub async fn render_region(
        &self,
        page: &Page,
        template: &Template,
        region: &str,
    ) -> Result<String, DispatchError> {
        if !template.has_region(region) {
            warn!(page = %page.id, template = %template.key, region, "region not in template");
            return Ok(String::new());
        }
        let items = self.region_items(page, template, region).await?;
        self.render_items(page, template, region, &items)
    }

    /// Ordered items for `region`, after symlink and inheritance resolution.
    pub async fn region_items(
        &self,
        page: &Page,
        template: &Template,
        region: &str,
    ) -> Result<Vec<ContentItem>, DispatchError> {
        let source = content_source(page);
        let items = self.fetch(source, region).await?;
        if !items.is_empty() {
            return Ok(items);
        }

        let inherited = template.get_region(region).is_some_and(|r| r.inherited);
        if !inherited {
            return Ok(items);
        }

        for ancestor in self.store.ancestors(page.id).await? {
            let items = self.fetch(content_source(&ancestor), region).await?;
            if !items.is_empty() {
                debug!(page = %page.id, from = %ancestor.id, region, "inherited region content");
                return Ok(items);
            }
        }
        Ok(Vec::new())
    }

    async fn fetch(&self, page_id: Uuid, region: &str) -> Result<Vec<ContentItem>, DispatchError> {
        let mut items = self.store.content_for_region(page_id, region).await?;
        // Stable: equal ordering keeps insertion order.
        items.sort_by_key(|item| item.ordering);
        Ok(items)
    }

    fn render_items(
        &self,
        page: &Page,
        template: &Template,
        region: &str,
        items: &[ContentItem],
    ) -> Result<String, DispatchError> {
        let ctx = RenderContext {
            page,
            region,
            renderer: self.renderer,
        };
        let mut html = String::new();
        for item in items {
            if !template.has_region(&item.region) {
                warn!(item = %item.id, region = %item.region, "skipping item in unknown region");
                continue;
            }
            let Some(content_type) = self.model.content_types().get(&item.content_type) else {
                warn!(
                    item = %item.id,
                    content_type = %item.content_type,
                    "skipping item of unregistered content type"
                );
                continue;
            };
            html.push_str(&content_type.render(item, &ctx)?);
        }
        Ok(html)
    }
}

/// Page whose stored content backs `page`.
pub(crate) fn content_source(page: &Page) -> Uuid {
    page.attribute::<Uuid>(SYMLINKED_PAGE_FIELD)
        .unwrap_or(page.id)
}
