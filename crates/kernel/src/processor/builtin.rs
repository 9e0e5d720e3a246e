//! Processors installed by the kernel itself.

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::header;
use pagina_sdk::store::PageStore;
use pagina_sdk::types::Page;
use tracing::debug;

use super::chain::{RequestProcessor, ResponseProcessor};
use crate::error::DispatchError;
use crate::request::{PageRequest, PageResponse};

/// Answers with a redirect when the page has a `redirect_to` target.
#[derive(Debug, Default)]
pub struct RedirectRequestProcessor;

#[async_trait]
impl RequestProcessor for RedirectRequestProcessor {
    fn name(&self) -> &str {
        "redirect"
    }

    async fn process(
        &self,
        page: &Page,
        _request: &PageRequest,
    ) -> Result<Option<PageResponse>, DispatchError> {
        let Some(target) = page.redirect_to.as_deref().filter(|t| !t.is_empty()) else {
            return Ok(None);
        };
        debug!(page = %page.id, target, "redirecting");
        PageResponse::redirect(target)
            .map(Some)
            .map_err(|e| DispatchError::processor(self.name(), e))
    }
}

/// Hides pages that are inactive or sit below an inactive ancestor.
pub struct RequireActiveRequestProcessor {
    store: Arc<dyn PageStore>,
}

impl RequireActiveRequestProcessor {
    pub fn new(store: Arc<dyn PageStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl RequestProcessor for RequireActiveRequestProcessor {
    fn name(&self) -> &str {
        "require_active"
    }

    async fn process(
        &self,
        page: &Page,
        _request: &PageRequest,
    ) -> Result<Option<PageResponse>, DispatchError> {
        if !page.active {
            return Ok(Some(PageResponse::not_found()));
        }
        let ancestors = self.store.ancestors(page.id).await?;
        if ancestors.iter().any(|a| !a.active) {
            return Ok(Some(PageResponse::not_found()));
        }
        Ok(None)
    }
}

/// Sets `X-Frame-Options` on every response.
#[derive(Debug)]
pub struct FrameOptionsResponseProcessor {
    value: String,
}

impl FrameOptionsResponseProcessor {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }
}

impl Default for FrameOptionsResponseProcessor {
    fn default() -> Self {
        Self::new("DENY")
    }
}

#[async_trait]
impl ResponseProcessor for FrameOptionsResponseProcessor {
    fn name(&self) -> &str {
        "frame_options"
    }

    async fn process(
        &self,
        _page: &Page,
        _request: &PageRequest,
        response: &mut PageResponse,
    ) -> Result<(), DispatchError> {
        response
            .set_header(header::X_FRAME_OPTIONS, &self.value)
            .map_err(|e| DispatchError::processor(self.name(), e))
    }
}
