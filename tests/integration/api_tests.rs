//! End-to-end tests through the gateway entry point.
//!
//! Tests verify:
//! - Sign-in, refresh, revoke, password reset, and sign-out flows
//! - Malformed bodies and missing configuration answer 400
//! - Unknown routes answer 404 without surfacing an error
//! - API Gateway route keys (`ANY /{proxy+}`, `$default`) resolve like plain paths

use std::sync::Arc;

use portfolio_api::config::MISSING_IDENTITY_CONFIG;
use portfolio_api::identity::secret_hash;
use portfolio_api::ApiRequest;

use super::test_utils::{
    alice, get, post_json, test_gateway, unconfigured_gateway, MockObjectStore, RecordedCall,
    CLIENT_ID, CLIENT_SECRET, RESET_CODE,
};

fn json_body(body: &str) -> serde_json::Value {
    serde_json::from_str(body).expect("response body should be JSON")
}

// =============================================================================
// Sign In
// =============================================================================

#[tokio::test]
async fn test_sign_in_returns_tokens() {
    let provider = alice();
    let gateway = test_gateway(provider.clone(), Arc::new(MockObjectStore::new()));

    let response = gateway
        .handle(post_json(
            "/auth/v1/login",
            r#"{"username":"alice","password":"secret"}"#,
        ))
        .await;

    assert_eq!(response.status_code, 200);
    let json = json_body(&response.body);
    assert_eq!(json["AccessToken"], "access-alice");
    assert_eq!(json["IdToken"], "id-alice");
    assert_eq!(json["RefreshToken"], "refresh-alice");
    assert_eq!(json["ExpiresIn"], 3600);
    assert_eq!(json["TokenType"], "Bearer");

    // No SECRET_HASH on sign-in unless enabled
    assert_eq!(
        provider.calls().await,
        vec![RecordedCall::SignIn {
            username: "alice".to_string(),
            secret_hash: None,
        }]
    );
}

#[tokio::test]
async fn test_sign_in_unparsable_body() {
    let provider = alice();
    let gateway = test_gateway(provider.clone(), Arc::new(MockObjectStore::new()));

    let response = gateway
        .handle(post_json("/auth/v1/login", "not-json"))
        .await;

    assert_eq!(response.status_code, 400);
    assert!(
        response.body.starts_with("invalid request body:"),
        "unexpected body: {}",
        response.body
    );
    assert!(response.headers.is_empty());
    assert!(provider.calls().await.is_empty());
}

#[tokio::test]
async fn test_sign_in_missing_field() {
    let gateway = test_gateway(alice(), Arc::new(MockObjectStore::new()));

    let response = gateway
        .handle(post_json("/auth/v1/login", r#"{"username":"alice"}"#))
        .await;

    assert_eq!(response.status_code, 400);
    assert!(response.body.contains("password"));
}

#[tokio::test]
async fn test_sign_in_rejected_credentials_pass_through() {
    let gateway = test_gateway(alice(), Arc::new(MockObjectStore::new()));

    let response = gateway
        .handle(post_json(
            "/auth/v1/login",
            r#"{"username":"alice","password":"wrong"}"#,
        ))
        .await;

    assert_eq!(response.status_code, 400);
    assert_eq!(
        response.body,
        "NotAuthorizedException: Incorrect username or password."
    );
}

// =============================================================================
// Token Management
// =============================================================================

#[tokio::test]
async fn test_refresh_token_sends_secret_hash() {
    let provider = alice();
    let gateway = test_gateway(provider.clone(), Arc::new(MockObjectStore::new()));

    let response = gateway
        .handle(post_json(
            "/user/v1/refresh",
            r#"{"username":"alice","refresh_token":"refresh-alice"}"#,
        ))
        .await;

    assert_eq!(response.status_code, 200);
    let json = json_body(&response.body);
    assert_eq!(json["AccessToken"], "access-alice");
    assert!(json.get("RefreshToken").is_none());

    assert_eq!(
        provider.calls().await,
        vec![RecordedCall::RefreshToken {
            refresh_token: "refresh-alice".to_string(),
            secret_hash: secret_hash("alice", CLIENT_ID, CLIENT_SECRET),
        }]
    );
}

#[tokio::test]
async fn test_refresh_token_rejected() {
    let gateway = test_gateway(alice(), Arc::new(MockObjectStore::new()));

    let response = gateway
        .handle(post_json(
            "/user/v1/refresh",
            r#"{"username":"alice","refresh_token":"stale"}"#,
        ))
        .await;

    assert_eq!(response.status_code, 400);
    assert_eq!(response.body, "NotAuthorizedException: Invalid Refresh Token");
}

#[tokio::test]
async fn test_revoke_token() {
    let provider = alice();
    let gateway = test_gateway(provider.clone(), Arc::new(MockObjectStore::new()));

    let response = gateway
        .handle(post_json("/user/v1/revoke", r#"{"token":"refresh-alice"}"#))
        .await;

    assert_eq!(response.status_code, 200);
    assert_eq!(response.body, "{}");
    assert_eq!(
        provider.calls().await,
        vec![RecordedCall::RevokeToken {
            token: "refresh-alice".to_string(),
        }]
    );
}

// =============================================================================
// Global Sign Out
// =============================================================================

#[tokio::test]
async fn test_global_sign_out_with_bearer_prefix() {
    let provider = alice();
    let gateway = test_gateway(provider.clone(), Arc::new(MockObjectStore::new()));

    let request =
        ApiRequest::new("POST", "/user/v1/logout").with_header("authorization", "Bearer access-alice");
    let response = gateway.handle(request).await;

    assert_eq!(response.status_code, 200);
    assert_eq!(response.body, "");
    assert_eq!(
        provider.calls().await,
        vec![RecordedCall::GlobalSignOut {
            access_token: "access-alice".to_string(),
        }]
    );
}

#[tokio::test]
async fn test_global_sign_out_bare_token_and_header_case() {
    let provider = alice();
    let gateway = test_gateway(provider.clone(), Arc::new(MockObjectStore::new()));

    let request =
        ApiRequest::new("POST", "/user/v1/logout").with_header("Authorization", "access-alice");
    let response = gateway.handle(request).await;

    assert_eq!(response.status_code, 200);
    assert_eq!(
        provider.calls().await,
        vec![RecordedCall::GlobalSignOut {
            access_token: "access-alice".to_string(),
        }]
    );
}

#[tokio::test]
async fn test_global_sign_out_missing_header() {
    let provider = alice();
    let gateway = test_gateway(provider.clone(), Arc::new(MockObjectStore::new()));

    let response = gateway
        .handle(ApiRequest::new("POST", "/user/v1/logout"))
        .await;

    assert_eq!(response.status_code, 400);
    assert_eq!(response.body, "missing auth header");
    assert!(provider.calls().await.is_empty());
}

// =============================================================================
// Password Reset
// =============================================================================

#[tokio::test]
async fn test_forgot_password_reports_code_delivery() {
    let provider = alice();
    let gateway = test_gateway(provider.clone(), Arc::new(MockObjectStore::new()));

    let response = gateway
        .handle(post_json("/user/v1/forgot-password", r#"{"username":"alice"}"#))
        .await;

    assert_eq!(response.status_code, 200);
    let json = json_body(&response.body);
    assert_eq!(json["CodeDeliveryDetails"]["DeliveryMedium"], "EMAIL");
    assert_eq!(json["CodeDeliveryDetails"]["AttributeName"], "email");

    assert_eq!(
        provider.calls().await,
        vec![RecordedCall::ForgotPassword {
            username: "alice".to_string(),
            secret_hash: secret_hash("alice", CLIENT_ID, CLIENT_SECRET),
        }]
    );
}

#[tokio::test]
async fn test_confirm_forgot_password() {
    let provider = alice();
    let gateway = test_gateway(provider.clone(), Arc::new(MockObjectStore::new()));

    let body = format!(
        r#"{{"username":"alice","password":"n3w-secret","code":"{}"}}"#,
        RESET_CODE
    );
    let response = gateway
        .handle(post_json("/user/v1/confirm-forgot-password", &body))
        .await;

    assert_eq!(response.status_code, 200);
    assert_eq!(response.body, "{}");
    assert_eq!(
        provider.calls().await,
        vec![RecordedCall::ConfirmForgotPassword {
            username: "alice".to_string(),
            password: "n3w-secret".to_string(),
            code: RESET_CODE.to_string(),
            secret_hash: secret_hash("alice", CLIENT_ID, CLIENT_SECRET),
        }]
    );
}

#[tokio::test]
async fn test_confirm_forgot_password_wrong_code() {
    let gateway = test_gateway(alice(), Arc::new(MockObjectStore::new()));

    let response = gateway
        .handle(post_json(
            "/user/v1/confirm-forgot-password",
            r#"{"username":"alice","password":"n3w-secret","code":"000000"}"#,
        ))
        .await;

    assert_eq!(response.status_code, 400);
    assert!(response.body.starts_with("CodeMismatchException"));
}

// =============================================================================
// Configuration Failures
// =============================================================================

#[tokio::test]
async fn test_identity_routes_without_configuration() {
    let gateway = unconfigured_gateway();

    let requests = vec![
        post_json(
            "/auth/v1/login",
            r#"{"username":"alice","password":"secret"}"#,
        ),
        post_json(
            "/user/v1/refresh",
            r#"{"username":"alice","refresh_token":"refresh-alice"}"#,
        ),
        post_json("/user/v1/revoke", r#"{"token":"refresh-alice"}"#),
        post_json("/user/v1/forgot-password", r#"{"username":"alice"}"#),
        post_json(
            "/user/v1/confirm-forgot-password",
            r#"{"username":"alice","password":"n3w-secret","code":"123456"}"#,
        ),
        ApiRequest::new("POST", "/user/v1/logout").with_header("authorization", "Bearer t"),
    ];

    for request in requests {
        let path = request.raw_path.clone();
        let response = gateway.handle(request).await;
        assert_eq!(response.status_code, 400, "{}", path);
        assert_eq!(response.body, MISSING_IDENTITY_CONFIG, "{}", path);
    }
}

#[tokio::test]
async fn test_storage_routes_without_bucket() {
    let gateway = unconfigured_gateway();

    for path in ["/s3/fetch", "/s3/fetch-url"] {
        let response = gateway
            .handle(get(path).with_query("file", "cv.pdf"))
            .await;
        assert_eq!(response.status_code, 400);
        assert_eq!(response.body, "S3 config does not exist");
    }
}

// =============================================================================
// Routing
// =============================================================================

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let gateway = test_gateway(alice(), Arc::new(MockObjectStore::new()));

    let response = gateway.handle(get("/unknown/path")).await;

    assert_eq!(response.status_code, 404);
    assert_eq!(response.body, "not found");
    assert!(response.headers.is_empty());
}

#[tokio::test]
async fn test_wrong_method_is_not_found() {
    let gateway = test_gateway(alice(), Arc::new(MockObjectStore::new()));

    let response = gateway.handle(get("/auth/v1/login")).await;
    assert_eq!(response.status_code, 404);
}

#[tokio::test]
async fn test_route_matching_ignores_path_case() {
    let gateway = test_gateway(alice(), Arc::new(MockObjectStore::new()));

    let response = gateway
        .handle(post_json(
            "/Auth/V1/Login",
            r#"{"username":"alice","password":"secret"}"#,
        ))
        .await;
    assert_eq!(response.status_code, 200);
}

#[tokio::test]
async fn test_proxy_route_key_uses_raw_path() {
    let gateway = test_gateway(alice(), Arc::new(MockObjectStore::new()));

    let request = post_json(
        "/auth/v1/login",
        r#"{"username":"alice","password":"secret"}"#,
    )
    .with_route_key("ANY /{proxy+}");
    let response = gateway.handle(request).await;
    assert_eq!(response.status_code, 200);

    let request = get("/health").with_route_key("$default");
    let response = gateway.handle(request).await;
    assert_eq!(response.status_code, 200);
}

#[tokio::test]
async fn test_route_key_takes_precedence_over_raw_path() {
    let gateway = test_gateway(alice(), Arc::new(MockObjectStore::new()));

    let request = get("/prod/health").with_route_key("GET /health");
    let response = gateway.handle(request).await;
    assert_eq!(response.status_code, 200);
}

#[tokio::test]
async fn test_health() {
    let gateway = unconfigured_gateway();

    let response = gateway.handle(get("/health")).await;

    assert_eq!(response.status_code, 200);
    let json = json_body(&response.body);
    assert_eq!(json["status"], "healthy");
}
