//! Page dispatch.
//!
//! Resolve the page for a path, run the request processors, render the page
//! layout with its regions and navigation, then run the response processors.

use std::sync::Arc;

use pagina_sdk::navigation::NavigationNode;
use pagina_sdk::store::PageStore;
use pagina_sdk::types::Page;
use serde_json::json;
use tracing::debug;

use crate::content::RegionRenderer;
use crate::error::DispatchError;
use crate::extension::{available_translations, content_title, page_title};
use crate::navigation::{NavigationEntry, NavigationResolver};
use crate::request::{PageRequest, PageResponse};
use crate::site::Site;
use crate::theme::SharedThemeEngine;

/// Depth of the main navigation rendered into every page.
const NAVIGATION_DEPTH: usize = 2;

/// Serves pages from a frozen [`Site`].
#[derive(Clone)]
pub struct Dispatcher {
    site: Site,
    store: Arc<dyn PageStore>,
    theme: SharedThemeEngine,
}

impl Dispatcher {
    pub fn new(site: Site, store: Arc<dyn PageStore>, theme: SharedThemeEngine) -> Self {
        Self { site, store, theme }
    }

    pub fn site(&self) -> &Site {
        &self.site
    }

    pub fn store(&self) -> &Arc<dyn PageStore> {
        &self.store
    }

    /// Serve the page at `request.path`.
    pub async fn dispatch(&self, request: &PageRequest) -> Result<PageResponse, DispatchError> {
        let url = normalize_path(&request.path);
        let page = self
            .store
            .page_by_url(&url)
            .await?
            .ok_or(DispatchError::PageNotFound(url))?;
        self.dispatch_page(&page, request).await
    }

    /// Run the processor chains around rendering `page`.
    pub async fn dispatch_page(
        &self,
        page: &Page,
        request: &PageRequest,
    ) -> Result<PageResponse, DispatchError> {
        let processors = &self.site.processors;
        if let Some(response) = processors.run_request(page, request).await? {
            return Ok(response);
        }

        let mut response = self.render_page(page).await?;
        processors.run_response(page, request, &mut response).await?;
        debug!(page = %page.id, status = %response.status, "dispatched page");
        Ok(response)
    }

    /// Render the page layout.
    pub async fn render_page(&self, page: &Page) -> Result<PageResponse, DispatchError> {
        let model = &self.site.model;
        let template = model
            .template_for(page)
            .ok_or_else(|| DispatchError::UnknownTemplate {
                page: page.id.to_string(),
                template: page.template_key.clone().unwrap_or_default(),
            })?;

        let regions = RegionRenderer::new(model, self.store.as_ref(), self.theme.as_ref())
            .render_regions(page, template)
            .await?;
        let region_list: Vec<_> = template
            .regions
            .iter()
            .map(|r| {
                json!({
                    "key": r.key,
                    "title": r.title,
                    "html": regions.get(&r.key).map(String::as_str).unwrap_or_default(),
                })
            })
            .collect();

        let resolver = NavigationResolver::new(model.navigation(), self.store.as_ref());
        let mut navigation = Vec::new();
        for root in resolver.roots().await? {
            let children = resolver.tree(&root, NAVIGATION_DEPTH - 1).await?;
            navigation.push(NavigationEntry::new(&root, children));
        }
        let current = NavigationNode::Page(page.clone());
        let subnavigation = resolver.tree(&current, 1).await?;
        let breadcrumbs = resolver.breadcrumbs(page).await?;

        let mut translations = Vec::new();
        if model.is_active("translations") {
            for other in available_translations(self.store.as_ref(), page).await? {
                translations.push(json!({
                    "language": other.attribute_str("language").unwrap_or_default(),
                    "title": other.title,
                    "url": other.url(),
                }));
            }
        }

        let context = json!({
            "page": page,
            "template": template.key,
            "page_title": page_title(page),
            "content_title": content_title(page),
            "language": page.attribute_str("language").unwrap_or("en"),
            "regions": regions,
            "region_list": region_list,
            "navigation": navigation,
            "subnavigation": subnavigation,
            "breadcrumbs": breadcrumbs,
            "translations": translations,
        });

        let html = self.theme.render_page(&template.path, &page.slug, &context)?;
        Ok(PageResponse::html(html))
    }
}

/// Page URLs always start and end with a slash.
fn normalize_path(path: &str) -> String {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{trimmed}/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_are_normalized() {
        assert_eq!(normalize_path("/about"), "/about/");
        assert_eq!(normalize_path("about/team/"), "/about/team/");
        assert_eq!(normalize_path("/"), "/");
        assert_eq!(normalize_path(""), "/");
    }
}
