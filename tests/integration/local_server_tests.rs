//! Local development server tests.
//!
//! Tests verify that the axum router hands requests to the gateway with the
//! same routing, status codes, and headers as the Lambda adapter.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use portfolio_api::create_local_router;

use super::test_utils::{alice, test_gateway, MockObjectStore};

async fn body_string(response: axum::response::Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_local_sign_in() {
    let router = create_local_router(
        test_gateway(alice(), Arc::new(MockObjectStore::new())),
        false,
    );

    let request = Request::builder()
        .method("POST")
        .uri("/auth/v1/login")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"username":"alice","password":"secret"}"#))
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(json["AccessToken"], "access-alice");
}

#[tokio::test]
async fn test_local_unknown_path() {
    let router = create_local_router(
        test_gateway(alice(), Arc::new(MockObjectStore::new())),
        true,
    );

    let request = Request::builder()
        .uri("/unknown/path")
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_string(response).await, "not found");
}

#[tokio::test]
async fn test_local_fetch_sets_headers_and_parses_query() {
    let store = MockObjectStore::new().with_object("my cv.pdf", b"%PDF-1.7".to_vec());
    let router = create_local_router(test_gateway(alice(), Arc::new(store)), false);

    let request = Request::builder()
        .uri("/s3/fetch?file=my%20cv.pdf")
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/pdf"
    );
    assert_eq!(
        response.headers().get("content-disposition").unwrap(),
        "attachment; filename=my cv.pdf"
    );
    assert_eq!(body_string(response).await, "JVBERi0xLjc=");
}

#[tokio::test]
async fn test_local_missing_file_param() {
    let router = create_local_router(
        test_gateway(alice(), Arc::new(MockObjectStore::new())),
        false,
    );

    let request = Request::builder()
        .uri("/s3/fetch")
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_string(response).await, "missing file name");
}

#[tokio::test]
async fn test_local_server_over_tcp() {
    let router = create_local_router(
        test_gateway(alice(), Arc::new(MockObjectStore::new())),
        false,
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    let client = reqwest::Client::new();

    let response = client
        .post(format!("http://{}/user/v1/logout", addr))
        .header("Authorization", "Bearer access-alice")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);

    let response = client
        .post(format!("http://{}/user/v1/logout", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    assert_eq!(response.text().await.unwrap(), "missing auth header");

    let response = client
        .get(format!("http://{}/health", addr))
        .send()
        .await
        .unwrap();
    let json: serde_json::Value = response.json().await.unwrap();
    assert_eq!(json["status"], "healthy");
}

#[tokio::test]
async fn test_local_rejects_invalid_utf8_body() {
    let provider = alice();
    let router = create_local_router(
        test_gateway(provider.clone(), Arc::new(MockObjectStore::new())),
        false,
    );

    let request = Request::builder()
        .method("POST")
        .uri("/auth/v1/login")
        .body(Body::from(
            b"{\"username\":\"al\xffice\",\"password\":\"secret\"}".to_vec(),
        ))
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_string(response)
        .await
        .starts_with("request body is not valid UTF-8"));
    assert!(provider.calls().await.is_empty());
}
