//! End-to-end tests for the HTTP API, driven through the router in-process

use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use std::sync::Arc;
use tower::ServiceExt;
use userdb::server::{app, AppState, ServerConfig};
use userdb::UserStore;

fn test_app() -> (Router, Arc<UserStore>) {
    let store = Arc::new(UserStore::default());
    let router = app(AppState {
        store: store.clone(),
        config: ServerConfig::default(),
    });
    (router, store)
}

async fn call(app: &Router, method: Method, uri: &str, body: &str) -> (StatusCode, String) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

async fn get(app: &Router, uri: &str) -> (StatusCode, String) {
    call(app, Method::GET, uri, "").await
}

async fn post(app: &Router, uri: &str, body: &str) -> (StatusCode, String) {
    call(app, Method::POST, uri, body).await
}

#[tokio::test]
async fn test_general_flow() {
    let (app, _store) = test_app();

    // Get for non-existing uid
    assert_eq!(
        get(&app, "/get/1000").await,
        (StatusCode::NOT_FOUND, r#"{"Error":"UID not found"}"#.to_string())
    );

    // Normal create
    let create_body = r#"{"name":"ilya", "passwd":"asdfgh", "email":"Bububu@hhh"}"#;
    assert_eq!(
        post(&app, "/create", create_body).await,
        (StatusCode::OK, r#"{"Uid":1000}"#.to_string())
    );

    // Normal get
    assert_eq!(
        get(&app, "/get/1000").await,
        (
            StatusCode::OK,
            r#"{"Name":"ilya","Email":"Bububu@hhh","Addr":""}"#.to_string()
        )
    );

    // Create for existing username
    assert_eq!(
        post(&app, "/create", create_body).await,
        (
            StatusCode::CONFLICT,
            r#"{"Error":"Name already reserved","Uid":-1}"#.to_string()
        )
    );

    // Create without a name
    assert_eq!(
        post(&app, "/create", r#"{"passwd":"asdfgh", "email":"Bububu@hhh"}"#).await,
        (
            StatusCode::BAD_REQUEST,
            r#"{"Error":"Empty name","Uid":-1}"#.to_string()
        )
    );

    // Normal update
    assert_eq!(
        post(&app, "/update/1000", r#"{"addr":"123 Broadway"}"#).await,
        (StatusCode::OK, r#"{"Status":"OK"}"#.to_string())
    );

    // Update for non-existing uid
    assert_eq!(
        post(&app, "/update/99", r#"{"addr":"123 Broadway"}"#).await,
        (
            StatusCode::NOT_FOUND,
            r#"{"Status":"ERROR: UID not found"}"#.to_string()
        )
    );

    // Update addressed by name is not supported
    assert_eq!(
        post(&app, "/update/ilya", r#"{"addr":"123 Broadway"}"#).await,
        (
            StatusCode::BAD_REQUEST,
            r#"{"Status":"ERROR: Non-numerical UID"}"#.to_string()
        )
    );

    // Negative uids are simply unknown
    assert_eq!(
        post(&app, "/update/-5", r#"{"addr":"123 Broadway"}"#).await,
        (
            StatusCode::NOT_FOUND,
            r#"{"Status":"ERROR: UID not found"}"#.to_string()
        )
    );
    assert_eq!(
        get(&app, "/get/-5").await,
        (StatusCode::NOT_FOUND, r#"{"Error":"UID not found"}"#.to_string())
    );

    // Unknown field in update
    let (status, body) = post(&app, "/update/1000", r#"{"address":"123 Broadway"}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.starts_with(r#"{"Status":"ERROR: Malformed request: unknown field `address`"#));

    // Get reflects the accepted update only
    assert_eq!(
        get(&app, "/get/1000").await,
        (
            StatusCode::OK,
            r#"{"Name":"ilya","Email":"Bububu@hhh","Addr":"123 Broadway"}"#.to_string()
        )
    );
}

#[tokio::test]
async fn test_lookup_and_reset() {
    let (app, store) = test_app();

    post(&app, "/create", r#"{"name":"JoeSmith"}"#).await;
    assert_eq!(
        get(&app, "/lookup/JoeSmith").await,
        (StatusCode::OK, r#"{"Uid":1000}"#.to_string())
    );
    assert_eq!(get(&app, "/lookup/nobody").await.0, StatusCode::NOT_FOUND);

    assert_eq!(
        post(&app, "/_admin/reset", "").await,
        (StatusCode::OK, r#"{"Status":"OK"}"#.to_string())
    );
    assert_eq!(get(&app, "/get/1000").await.0, StatusCode::NOT_FOUND);
    assert_eq!(store.stats().records, 0);

    // Numbering restarts after reset
    assert_eq!(
        post(&app, "/create", r#"{"name":"JoeSmith"}"#).await,
        (StatusCode::OK, r#"{"Uid":1000}"#.to_string())
    );
}

#[tokio::test]
async fn test_stats_and_health() {
    let (app, _store) = test_app();
    post(&app, "/create", r#"{"name":"ilya"}"#).await;

    let (status, body) = get(&app, "/_stats").await;
    assert_eq!(status, StatusCode::OK);
    let stats: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(stats["records"], 1);
    assert_eq!(stats["next_uid"], 1001);
    assert_eq!(stats["blocks"], 1);

    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#""status":"healthy""#));
}

#[tokio::test]
async fn test_password_never_returned() {
    let (app, _store) = test_app();
    post(&app, "/create", r#"{"name":"ilya","passwd":"s3cret"}"#).await;

    let (_, body) = get(&app, "/get/1000").await;
    assert!(!body.contains("s3cret"));
}

#[tokio::test]
async fn test_concurrent_creates_over_http() {
    let (app, store) = test_app();

    let handles: Vec<_> = (0..32)
        .map(|i| {
            let app = app.clone();
            tokio::spawn(async move {
                post(&app, "/create", &format!(r#"{{"name":"user{}"}}"#, i)).await
            })
        })
        .collect();

    for handle in handles {
        let (status, _) = handle.await.unwrap();
        assert_eq!(status, StatusCode::OK);
    }
    assert_eq!(store.stats().records, 32);
}
