//! Request and response processor chains.
//!
//! Request processors run in registration order before a page is rendered;
//! the first one to return a response ends dispatch. Response processors run
//! in registration order after rendering and may modify the response. An
//! error from any processor aborts the chain and propagates unchanged.

mod builtin;
mod chain;
mod etag;

pub use builtin::{
    FrameOptionsResponseProcessor, RedirectRequestProcessor, RequireActiveRequestProcessor,
};
pub use chain::{
    FnRequestProcessor, FnResponseProcessor, ProcessorChain, ProcessorChainBuilder,
    RequestProcessor, ResponseProcessor,
};
pub use etag::{
    ContentEtag, EtagProvider, EtagRequestProcessor, EtagResponseProcessor, IdentityEtag,
    etag_processors,
};
