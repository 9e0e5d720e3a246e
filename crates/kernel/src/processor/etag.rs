//! ETag coordination.
//!
//! An [`EtagProvider`] computes a validation token per page. The request
//! processor compares it with `If-None-Match` and answers 304 on a match;
//! the response processor stamps the token on successful responses. Neither
//! is installed unless registered explicitly.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use axum::http::header;
use pagina_sdk::store::PageStore;
use pagina_sdk::types::{ContentItem, Page};
use sha2::{Digest, Sha256};
use tracing::debug;

use super::chain::{RequestProcessor, ResponseProcessor};
use crate::content::content_source;
use crate::error::DispatchError;
use crate::request::{PageRequest, PageResponse};

/// Computes the ETag for a page. `None` disables conditional handling.
#[async_trait]
pub trait EtagProvider: Send + Sync {
    async fn etag(
        &self,
        page: &Page,
        request: &PageRequest,
    ) -> Result<Option<String>, DispatchError>;
}

/// Hashes id and slug only.
///
/// Content edits do not change the token, so this is too weak for real use.
#[derive(Debug, Default)]
pub struct IdentityEtag;

#[async_trait]
impl EtagProvider for IdentityEtag {
    async fn etag(
        &self,
        page: &Page,
        _request: &PageRequest,
    ) -> Result<Option<String>, DispatchError> {
        let mut hasher = Sha256::new();
        hasher.update(page.id.as_bytes());
        hasher.update(b":");
        hasher.update(page.slug.as_bytes());
        Ok(Some(hex::encode(hasher.finalize())))
    }
}

/// Hashes the page record together with the content it renders.
///
/// Content comes from the symlink source when `symlinked_page` is set.
/// Items of every ancestor are hashed for regions the page leaves empty,
/// so edits to inherited content change the token too.
pub struct ContentEtag {
    store: Arc<dyn PageStore>,
}

impl ContentEtag {
    pub fn new(store: Arc<dyn PageStore>) -> Self {
        Self { store }
    }

    async fn sorted_content(&self, page: &Page) -> Result<Vec<ContentItem>, DispatchError> {
        let mut items = self.store.content_for_page(content_source(page)).await?;
        items.sort_by(|a, b| (&a.region, a.ordering, a.id).cmp(&(&b.region, b.ordering, b.id)));
        Ok(items)
    }
}

fn hash_item(hasher: &mut Sha256, item: &ContentItem) {
    hasher.update(item.id.as_bytes());
    hasher.update(item.region.as_bytes());
    hasher.update(item.ordering.to_be_bytes());
    hasher.update(item.content_type.as_bytes());
    hasher.update(item.payload.to_string().as_bytes());
}

#[async_trait]
impl EtagProvider for ContentEtag {
    async fn etag(
        &self,
        page: &Page,
        _request: &PageRequest,
    ) -> Result<Option<String>, DispatchError> {
        let items = self.sorted_content(page).await?;

        let mut hasher = Sha256::new();
        hasher.update(page.id.as_bytes());
        hasher.update(page.slug.as_bytes());
        hasher.update(page.title.as_bytes());
        hasher.update(page.template_key.as_deref().unwrap_or_default().as_bytes());
        // BTreeMap keeps attribute order stable, including modification_date.
        hasher.update(serde_json::to_string(&page.attributes).unwrap_or_default().as_bytes());
        for item in &items {
            hash_item(&mut hasher, item);
        }

        let filled: BTreeSet<&str> = items.iter().map(|item| item.region.as_str()).collect();
        for ancestor in self.store.ancestors(page.id).await? {
            hasher.update(ancestor.id.as_bytes());
            for item in self.sorted_content(&ancestor).await? {
                if !filled.contains(item.region.as_str()) {
                    hash_item(&mut hasher, &item);
                }
            }
        }
        Ok(Some(hex::encode(hasher.finalize())))
    }
}

fn quote(token: &str) -> String {
    format!("\"{token}\"")
}

/// Whether an `If-None-Match` value matches `token`.
///
/// Handles `*`, comma-separated lists and weak validators.
fn if_none_match_matches(header_value: &str, token: &str) -> bool {
    header_value.split(',').map(str::trim).any(|candidate| {
        if candidate == "*" {
            return true;
        }
        let candidate = candidate.strip_prefix("W/").unwrap_or(candidate);
        candidate.trim_matches('"') == token
    })
}

/// Answers 304 when the client already holds the current ETag.
pub struct EtagRequestProcessor {
    provider: Arc<dyn EtagProvider>,
}

impl EtagRequestProcessor {
    pub fn new(provider: Arc<dyn EtagProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl RequestProcessor for EtagRequestProcessor {
    fn name(&self) -> &str {
        "etag_request"
    }

    async fn process(
        &self,
        page: &Page,
        request: &PageRequest,
    ) -> Result<Option<PageResponse>, DispatchError> {
        if !request.is_cacheable_method() {
            return Ok(None);
        }
        let Some(presented) = request.if_none_match() else {
            return Ok(None);
        };
        let Some(token) = self.provider.etag(page, request).await? else {
            return Ok(None);
        };
        if !if_none_match_matches(presented, &token) {
            return Ok(None);
        }

        debug!(page = %page.id, etag = %token, "not modified");
        let mut response = PageResponse::not_modified();
        response
            .set_header(header::ETAG, &quote(&token))
            .map_err(|e| DispatchError::processor(self.name(), e))?;
        Ok(Some(response))
    }
}

/// Stamps the current ETag on successful responses.
pub struct EtagResponseProcessor {
    provider: Arc<dyn EtagProvider>,
}

impl EtagResponseProcessor {
    pub fn new(provider: Arc<dyn EtagProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl ResponseProcessor for EtagResponseProcessor {
    fn name(&self) -> &str {
        "etag_response"
    }

    async fn process(
        &self,
        page: &Page,
        request: &PageRequest,
        response: &mut PageResponse,
    ) -> Result<(), DispatchError> {
        if !response.is_success() {
            return Ok(());
        }
        if let Some(token) = self.provider.etag(page, request).await? {
            response
                .set_header(header::ETAG, &quote(&token))
                .map_err(|e| DispatchError::processor(self.name(), e))?;
        }
        Ok(())
    }
}

/// Build the request/response pair sharing one provider.
pub fn etag_processors(
    provider: Arc<dyn EtagProvider>,
) -> (EtagRequestProcessor, EtagResponseProcessor) {
    (
        EtagRequestProcessor::new(Arc::clone(&provider)),
        EtagResponseProcessor::new(provider),
    )
}
