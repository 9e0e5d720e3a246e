//! Processor traits and the ordered chains built from them.

use std::sync::Arc;

use async_trait::async_trait;
use pagina_sdk::types::Page;
use tracing::debug;

use crate::error::DispatchError;
use crate::request::{PageRequest, PageResponse};

/// Runs before rendering; returning a response short-circuits dispatch.
#[async_trait]
pub trait RequestProcessor: Send + Sync {
    /// Name used in logs and error messages.
    fn name(&self) -> &str;

    async fn process(
        &self,
        page: &Page,
        request: &PageRequest,
    ) -> Result<Option<PageResponse>, DispatchError>;
}

/// Runs after rendering and may mutate the response in place.
#[async_trait]
pub trait ResponseProcessor: Send + Sync {
    /// Name used in logs and error messages.
    fn name(&self) -> &str;

    async fn process(
        &self,
        page: &Page,
        request: &PageRequest,
        response: &mut PageResponse,
    ) -> Result<(), DispatchError>;
}

/// Adapts a plain function into a [`RequestProcessor`].
pub struct FnRequestProcessor<F> {
    name: String,
    f: F,
}

impl<F> FnRequestProcessor<F>
where
    F: Fn(&Page, &PageRequest) -> Result<Option<PageResponse>, DispatchError> + Send + Sync,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

#[async_trait]
impl<F> RequestProcessor for FnRequestProcessor<F>
where
    F: Fn(&Page, &PageRequest) -> Result<Option<PageResponse>, DispatchError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn process(
        &self,
        page: &Page,
        request: &PageRequest,
    ) -> Result<Option<PageResponse>, DispatchError> {
        (self.f)(page, request)
    }
}

/// Adapts a plain function into a [`ResponseProcessor`].
pub struct FnResponseProcessor<F> {
    name: String,
    f: F,
}

impl<F> FnResponseProcessor<F>
where
    F: Fn(&Page, &PageRequest, &mut PageResponse) -> Result<(), DispatchError> + Send + Sync,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

#[async_trait]
impl<F> ResponseProcessor for FnResponseProcessor<F>
where
    F: Fn(&Page, &PageRequest, &mut PageResponse) -> Result<(), DispatchError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn process(
        &self,
        page: &Page,
        request: &PageRequest,
        response: &mut PageResponse,
    ) -> Result<(), DispatchError> {
        (self.f)(page, request, response)
    }
}

/// Collects processors during startup.
#[derive(Default)]
pub struct ProcessorChainBuilder {
    request: Vec<Arc<dyn RequestProcessor>>,
    response: Vec<Arc<dyn ResponseProcessor>>,
}

impl ProcessorChainBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a request processor.
    pub fn register_request_processor(
        &mut self,
        processor: impl RequestProcessor + 'static,
    ) -> &mut Self {
        self.register_request_processors([Arc::new(processor) as Arc<dyn RequestProcessor>])
    }

    /// Append request processors, keeping their order.
    pub fn register_request_processors(
        &mut self,
        processors: impl IntoIterator<Item = Arc<dyn RequestProcessor>>,
    ) -> &mut Self {
        for processor in processors {
            debug!(processor = processor.name(), "registered request processor");
            self.request.push(processor);
        }
        self
    }

    /// Append a request processor implemented as a closure.
    pub fn register_request_fn<F>(&mut self, name: impl Into<String>, f: F) -> &mut Self
    where
        F: Fn(&Page, &PageRequest) -> Result<Option<PageResponse>, DispatchError>
            + Send
            + Sync
            + 'static,
    {
        self.register_request_processor(FnRequestProcessor::new(name, f))
    }

    /// Append a response processor.
    pub fn register_response_processor(
        &mut self,
        processor: impl ResponseProcessor + 'static,
    ) -> &mut Self {
        self.register_response_processors([Arc::new(processor) as Arc<dyn ResponseProcessor>])
    }

    /// Append response processors, keeping their order.
    pub fn register_response_processors(
        &mut self,
        processors: impl IntoIterator<Item = Arc<dyn ResponseProcessor>>,
    ) -> &mut Self {
        for processor in processors {
            debug!(processor = processor.name(), "registered response processor");
            self.response.push(processor);
        }
        self
    }

    /// Append a response processor implemented as a closure.
    pub fn register_response_fn<F>(&mut self, name: impl Into<String>, f: F) -> &mut Self
    where
        F: Fn(&Page, &PageRequest, &mut PageResponse) -> Result<(), DispatchError>
            + Send
            + Sync
            + 'static,
    {
        self.register_response_processor(FnResponseProcessor::new(name, f))
    }

    /// Freeze the chains.
    pub fn build(self) -> ProcessorChain {
        ProcessorChain {
            request: self.request,
            response: self.response,
        }
    }
}

/// Immutable request and response chains.
#[derive(Default)]
pub struct ProcessorChain {
    request: Vec<Arc<dyn RequestProcessor>>,
    response: Vec<Arc<dyn ResponseProcessor>>,
}

impl ProcessorChain {
    /// Run request processors until one produces a response.
    pub async fn run_request(
        &self,
        page: &Page,
        request: &PageRequest,
    ) -> Result<Option<PageResponse>, DispatchError> {
        for processor in &self.request {
            if let Some(response) = processor.process(page, request).await? {
                debug!(
                    processor = processor.name(),
                    status = %response.status,
                    page = %page.id,
                    "request processor ended dispatch"
                );
                return Ok(Some(response));
            }
        }
        Ok(None)
    }

    /// Run every response processor in order.
    pub async fn run_response(
        &self,
        page: &Page,
        request: &PageRequest,
        response: &mut PageResponse,
    ) -> Result<(), DispatchError> {
        for processor in &self.response {
            processor.process(page, request, response).await?;
        }
        Ok(())
    }

    pub fn request_processor_names(&self) -> Vec<&str> {
        self.request.iter().map(|p| p.name()).collect()
    }

    pub fn response_processor_names(&self) -> Vec<&str> {
        self.response.iter().map(|p| p.name()).collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use std::sync::Mutex;

    fn page() -> Page {
        Page::new("Home", "home")
    }

    #[tokio::test]
    async fn short_circuit_skips_later_processors() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut builder = ProcessorChainBuilder::new();
        for (name, respond) in [("p1", false), ("p2", true), ("p3", false)] {
            let calls = Arc::clone(&calls);
            builder.register_request_fn(name, move |_page: &Page, _req: &PageRequest| {
                calls.lock().unwrap().push(name);
                Ok(respond.then(|| PageResponse::new(StatusCode::IM_A_TEAPOT, name)))
            });
        }
        let chain = builder.build();

        let response = chain
            .run_request(&page(), &PageRequest::get("/home/"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(response.body, "p2");
        assert_eq!(*calls.lock().unwrap(), vec!["p1", "p2"]);
    }

    #[tokio::test]
    async fn empty_chain_does_not_respond() {
        let chain = ProcessorChain::default();
        let result = chain.run_request(&page(), &PageRequest::get("/")).await;
        assert!(result.unwrap().is_none());
    }

    #[tokio::test]
    async fn response_processors_run_in_order() {
        let mut builder = ProcessorChainBuilder::new();
        builder
            .register_response_fn("first", |_p: &Page, _r: &PageRequest, resp: &mut PageResponse| {
                resp.body.push('1');
                Ok(())
            })
            .register_response_fn("second", |_p: &Page, _r: &PageRequest, resp: &mut PageResponse| {
                resp.body.push('2');
                Ok(())
            });
        let chain = builder.build();

        let mut response = PageResponse::html("");
        chain
            .run_response(&page(), &PageRequest::get("/"), &mut response)
            .await
            .unwrap();
        assert_eq!(response.body, "12");
        assert_eq!(chain.response_processor_names(), vec!["first", "second"]);
    }

    #[tokio::test]
    async fn response_error_aborts_remaining_processors() {
        let second_ran = Arc::new(Mutex::new(false));
        let flag = Arc::clone(&second_ran);
        let mut builder = ProcessorChainBuilder::new();
        builder
            .register_response_fn("r1", |_p: &Page, _r: &PageRequest, _resp: &mut PageResponse| {
                Err(DispatchError::processor("r1", anyhow::anyhow!("boom")))
            })
            .register_response_fn("r2", move |_p: &Page, _r: &PageRequest, _resp: &mut PageResponse| {
                *flag.lock().unwrap() = true;
                Ok(())
            });
        let chain = builder.build();

        let mut response = PageResponse::html("");
        let err = chain
            .run_response(&page(), &PageRequest::get("/"), &mut response)
            .await
            .unwrap_err();

        match err {
            DispatchError::Processor { processor, source } => {
                assert_eq!(processor, "r1");
                assert_eq!(source.to_string(), "boom");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!*second_ran.lock().unwrap());
    }
}
