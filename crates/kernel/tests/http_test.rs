#![allow(clippy::unwrap_used, clippy::expect_used)]
//! End-to-end tests through the axum router.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use http_body_util::BodyExt;
use pagina_kernel::config::Config;
use pagina_kernel::content::CreatePage;
use pagina_kernel::routes;
use pagina_kernel::state::AppState;
use serde_json::{Value, json};
use tower::ServiceExt;

fn config() -> Config {
    Config {
        port: 0,
        theme_dir: None,
        site_fixture: None,
        extensions: ["changedate", "datepublisher", "titles", "seo", "navigation"]
            .map(String::from)
            .to_vec(),
        enable_etag: true,
        frame_options: Some("DENY".to_string()),
        request_timeout_secs: 30,
    }
}

async fn app() -> (Router, AppState) {
    let state = AppState::new(&config()).await.unwrap();
    let pages = state.pages();
    let home = pages
        .create_page(CreatePage {
            title: "Home".to_string(),
            slug: "home".to_string(),
            attributes: [("meta_description".to_string(), json!("Front page"))].into(),
            ..Default::default()
        })
        .await
        .unwrap();
    pages
        .create_page(CreatePage {
            title: "Moved".to_string(),
            slug: "moved".to_string(),
            parent_id: Some(home.id),
            redirect_to: Some("/home/".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    pages
        .create_page(CreatePage {
            title: "Draft".to_string(),
            slug: "draft".to_string(),
            parent_id: Some(home.id),
            active: Some(false),
            ..Default::default()
        })
        .await
        .unwrap();

    (routes::router().with_state(state.clone()), state)
}

async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn health_reports_registrations() {
    let (app, _) = app().await;
    let response = send(&app, get("/health")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["templates"], 2);
}

#[tokio::test]
async fn page_is_served_with_processor_headers() {
    let (app, _) = app().await;
    let response = send(&app, get("/home/")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::X_FRAME_OPTIONS], "DENY");
    assert!(response.headers().contains_key(header::ETAG));
    assert!(response.headers().contains_key(header::LAST_MODIFIED));

    let body = body_text(response).await;
    pagina_test_utils::assert::contains(&body, "<title>Home</title>");
    pagina_test_utils::assert::contains(&body, r#"content="Front page""#);
}

#[tokio::test]
async fn conditional_get_returns_not_modified() {
    let (app, _) = app().await;
    let first = send(&app, get("/home")).await;
    let etag = first.headers()[header::ETAG].to_str().unwrap().to_string();

    let request = Request::builder()
        .uri("/home/")
        .header(header::IF_NONE_MATCH, &etag)
        .body(Body::empty())
        .unwrap();
    let second = send(&app, request).await;
    assert_eq!(second.status(), StatusCode::NOT_MODIFIED);
    assert!(body_text(second).await.is_empty());
}

#[tokio::test]
async fn redirect_and_inactive_pages() {
    let (app, _) = app().await;

    let response = send(&app, get("/home/moved/")).await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(response.headers()[header::LOCATION], "/home/");

    let response = send(&app, get("/home/draft/")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_paths_and_methods() {
    let (app, _) = app().await;

    let response = send(&app, get("/nowhere/")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let request = Request::builder()
        .method("POST")
        .uri("/home/")
        .body(Body::empty())
        .unwrap();
    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn pages_created_after_startup_are_served() {
    let (app, state) = app().await;
    state
        .pages()
        .create_page(CreatePage {
            title: "Contact".to_string(),
            slug: "contact".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();
    let response = send(&app, get("/contact/")).await;
    assert_eq!(response.status(), StatusCode::OK);
}
