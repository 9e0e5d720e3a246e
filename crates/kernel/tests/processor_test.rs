#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Request and response processor chains around dispatch.

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use axum::http::{StatusCode, header};
use pagina_kernel::content::SYMLINKED_PAGE_FIELD;
use pagina_kernel::processor::ContentEtag;
use pagina_kernel::{DispatchError, PageRequest, PageResponse};
use pagina_sdk::render::ContentType;
use pagina_test_utils::{CountingContentType, FailingContentType, test_content, test_page};
use serde_json::json;

#[tokio::test]
async fn request_processor_short_circuits_rendering() {
    let store = common::memory_store();
    let counter = CountingContentType::new();
    let later_calls = Arc::new(AtomicUsize::new(0));

    let mut builder = common::site_builder();
    builder
        .create_content_type(Arc::clone(&counter) as Arc<dyn ContentType>, None)
        .unwrap();
    let seen = Arc::clone(&later_calls);
    builder
        .processors()
        .register_request_fn("teapot", |_, _| {
            Ok(Some(PageResponse::new(StatusCode::IM_A_TEAPOT, "short")))
        })
        .register_request_fn("later", move |_, _| {
            seen.fetch_add(1, Ordering::SeqCst);
            Ok(None)
        });
    let dispatcher = common::dispatcher(builder, Arc::clone(&store));

    let page = test_page("Home", "home").save(store.as_ref()).await.unwrap();
    test_content(&page, "main", "counted")
        .with_text("hello")
        .save(store.as_ref())
        .await
        .unwrap();

    let response = dispatcher.dispatch(&PageRequest::get("/home/")).await.unwrap();
    assert_eq!(response.status, StatusCode::IM_A_TEAPOT);
    assert_eq!(response.body, "short");
    assert_eq!(later_calls.load(Ordering::SeqCst), 0);
    assert_eq!(counter.renders(), 0);
}

#[tokio::test]
async fn empty_chains_render_normally() {
    let store = common::memory_store();
    let dispatcher = common::dispatcher(common::site_builder(), Arc::clone(&store));
    let page = test_page("Home", "home").save(store.as_ref()).await.unwrap();
    test_content(&page, "main", "richtext")
        .with_text("<p>Welcome</p>")
        .save(store.as_ref())
        .await
        .unwrap();

    let response = dispatcher.dispatch(&PageRequest::get("/home/")).await.unwrap();
    assert_eq!(response.status, StatusCode::OK);
    pagina_test_utils::assert::contains(&response.body, "<p>Welcome</p>");
    assert!(response.header(header::ETAG).is_none());
}

#[tokio::test]
async fn response_processor_error_aborts_remaining_chain() {
    let store = common::memory_store();
    let reached = Arc::new(AtomicBool::new(false));

    let mut builder = common::site_builder();
    let flag = Arc::clone(&reached);
    builder
        .processors()
        .register_response_fn("broken", |_, _, _| {
            Err(DispatchError::processor("broken", anyhow::anyhow!("boom")))
        })
        .register_response_fn("after", move |_, _, _| {
            flag.store(true, Ordering::SeqCst);
            Ok(())
        });
    let dispatcher = common::dispatcher(builder, Arc::clone(&store));
    test_page("Home", "home").save(store.as_ref()).await.unwrap();

    let err = dispatcher.dispatch(&PageRequest::get("/home/")).await.unwrap_err();
    assert!(matches!(err, DispatchError::Processor { .. }));
    assert!(err.to_string().contains("broken"));
    assert!(!reached.load(Ordering::SeqCst));
}

#[tokio::test]
async fn content_render_error_skips_response_processors() {
    let store = common::memory_store();
    let reached = Arc::new(AtomicBool::new(false));

    let mut builder = common::site_builder();
    builder
        .create_content_type(Arc::new(FailingContentType), Some(&["main"][..]))
        .unwrap();
    let flag = Arc::clone(&reached);
    builder.processors().register_response_fn("after", move |_, _, _| {
        flag.store(true, Ordering::SeqCst);
        Ok(())
    });
    let dispatcher = common::dispatcher(builder, Arc::clone(&store));
    let page = test_page("Home", "home").save(store.as_ref()).await.unwrap();
    test_content(&page, "main", "failing")
        .save(store.as_ref())
        .await
        .unwrap();

    let err = dispatcher.dispatch(&PageRequest::get("/home/")).await.unwrap_err();
    assert!(matches!(err, DispatchError::Render(_)));
    assert!(!reached.load(Ordering::SeqCst));
}

#[tokio::test]
async fn response_processors_run_in_registration_order() {
    let store = common::memory_store();
    let mut builder = common::site_builder();
    builder
        .processors()
        .register_response_fn("first", |_, _, response| {
            response.body.push_str("<!-- first -->");
            Ok(())
        })
        .register_response_fn("second", |_, _, response| {
            response.body.push_str("<!-- second -->");
            Ok(())
        });
    let dispatcher = common::dispatcher(builder, Arc::clone(&store));
    test_page("Home", "home").save(store.as_ref()).await.unwrap();

    let response = dispatcher.dispatch(&PageRequest::get("/home/")).await.unwrap();
    assert!(response.body.ends_with("<!-- first --><!-- second -->"));
}

#[tokio::test]
async fn etag_round_trip_skips_rendering() {
    let store = common::memory_store();
    let counter = CountingContentType::new();

    let mut builder = common::site_builder();
    builder
        .create_content_type(Arc::clone(&counter) as Arc<dyn ContentType>, None)
        .unwrap();
    builder.enable_etag(Arc::new(ContentEtag::new(Arc::clone(&store))));
    let dispatcher = common::dispatcher(builder, Arc::clone(&store));

    let page = test_page("Home", "home").save(store.as_ref()).await.unwrap();
    test_content(&page, "main", "counted")
        .with_text("v1")
        .save(store.as_ref())
        .await
        .unwrap();

    let first = dispatcher.dispatch(&PageRequest::get("/home/")).await.unwrap();
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(counter.renders(), 1);
    let etag = first.header(header::ETAG).unwrap().to_string();
    assert!(etag.starts_with('"') && etag.ends_with('"'));

    let conditional = PageRequest::get("/home/").with_header(header::IF_NONE_MATCH, &etag);
    let second = dispatcher.dispatch(&conditional).await.unwrap();
    assert_eq!(second.status, StatusCode::NOT_MODIFIED);
    assert!(second.body.is_empty());
    assert_eq!(second.header(header::ETAG), Some(etag.as_str()));
    assert_eq!(counter.renders(), 1);

    test_content(&page, "main", "counted")
        .with_text("v2")
        .ordering(1)
        .save(store.as_ref())
        .await
        .unwrap();
    let third = dispatcher.dispatch(&conditional).await.unwrap();
    assert_eq!(third.status, StatusCode::OK);
    assert_ne!(third.header(header::ETAG), Some(etag.as_str()));
    assert_eq!(counter.renders(), 3);
}

/// Dispatch `path` once, then again with the returned ETag; returns the tag.
async fn revalidated_etag(dispatcher: &pagina_kernel::Dispatcher, path: &str) -> String {
    let first = dispatcher.dispatch(&PageRequest::get(path)).await.unwrap();
    let etag = first.header(header::ETAG).unwrap().to_string();
    let conditional = PageRequest::get(path).with_header(header::IF_NONE_MATCH, &etag);
    let second = dispatcher.dispatch(&conditional).await.unwrap();
    assert_eq!(second.status, StatusCode::NOT_MODIFIED);
    etag
}

#[tokio::test]
async fn symlink_source_edit_changes_content_etag() {
    let store = common::memory_store();
    let mut builder = common::site_builder();
    builder.enable_etag(Arc::new(ContentEtag::new(Arc::clone(&store))));
    let dispatcher = common::dispatcher(builder, Arc::clone(&store));

    let source = test_page("Source", "source").save(store.as_ref()).await.unwrap();
    test_content(&source, "main", "richtext")
        .with_text("<p>v1</p>")
        .save(store.as_ref())
        .await
        .unwrap();
    test_page("Link", "link")
        .with_attribute(SYMLINKED_PAGE_FIELD, json!(source.id.to_string()))
        .save(store.as_ref())
        .await
        .unwrap();

    let etag = revalidated_etag(&dispatcher, "/link/").await;

    test_content(&source, "main", "richtext")
        .with_text("<p>v2</p>")
        .ordering(1)
        .save(store.as_ref())
        .await
        .unwrap();
    let conditional = PageRequest::get("/link/").with_header(header::IF_NONE_MATCH, &etag);
    let response = dispatcher.dispatch(&conditional).await.unwrap();
    assert_eq!(response.status, StatusCode::OK);
    pagina_test_utils::assert::contains(&response.body, "<p>v2</p>");
    assert_ne!(response.header(header::ETAG), Some(etag.as_str()));
}

#[tokio::test]
async fn inherited_region_edit_changes_content_etag() {
    let store = common::memory_store();
    let mut builder = common::site_builder();
    builder.enable_etag(Arc::new(ContentEtag::new(Arc::clone(&store))));
    let dispatcher = common::dispatcher(builder, Arc::clone(&store));

    let parent = test_page("Parent", "parent").save(store.as_ref()).await.unwrap();
    let sidebar = test_content(&parent, "sidebar", "richtext")
        .with_text("<p>old news</p>")
        .save(store.as_ref())
        .await
        .unwrap();
    let child = test_page("Child", "child")
        .child_of(&parent)
        .save(store.as_ref())
        .await
        .unwrap();
    test_content(&child, "main", "richtext")
        .with_text("<p>child body</p>")
        .save(store.as_ref())
        .await
        .unwrap();

    let etag = revalidated_etag(&dispatcher, "/parent/child/").await;

    let mut edited = sidebar;
    edited.payload = json!({ "text": "<p>fresh news</p>" });
    store.save_content(edited).await.unwrap();

    let conditional =
        PageRequest::get("/parent/child/").with_header(header::IF_NONE_MATCH, &etag);
    let response = dispatcher.dispatch(&conditional).await.unwrap();
    assert_eq!(response.status, StatusCode::OK);
    pagina_test_utils::assert::contains(&response.body, "<p>fresh news</p>");
}

#[tokio::test]
async fn unknown_path_is_not_found() {
    let store = common::memory_store();
    let dispatcher = common::dispatcher(common::site_builder(), store);
    let err = dispatcher.dispatch(&PageRequest::get("/missing")).await.unwrap_err();
    assert!(matches!(err, DispatchError::PageNotFound(url) if url == "/missing/"));
}
