//! Request handlers for the portfolio API.
//!
//! Each handler decodes its input, calls the identity gateway or the object
//! store, and shapes the result. Failures are returned as [`ApiError`]; the
//! [`Gateway`](super::gateway::Gateway) turns them into responses.
//!
//! # Endpoints
//!
//! - `POST /auth/v1/login` - `{"username","password"}` → tokens
//! - `POST /user/v1/refresh` - `{"username","refresh_token"}` → tokens
//! - `POST /user/v1/revoke` - `{"token"}` → `{}`
//! - `POST /user/v1/logout` - `Authorization: Bearer <access token>` → empty body
//! - `POST /user/v1/forgot-password` - `{"username"}` → code delivery details
//! - `POST /user/v1/confirm-forgot-password` - `{"username","password","code"}` → `{}`
//! - `GET /s3/fetch?file=<key>` - base64 file body
//! - `GET /s3/fetch-url?file=<key>` - pre-signed URL JSON
//! - `GET /health` - health check

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::request::ApiRequest;
use super::response::ApiResponse;
use super::routes::Operation;
use crate::config::MISSING_IDENTITY_CONFIG;
use crate::error::ApiError;
use crate::identity::{CodeDelivery, IdentityGateway};
use crate::storage::StorageGateway;

// =============================================================================
// Application State
// =============================================================================

/// Dependencies shared by all handlers.
///
/// Built once at process start and borrowed by every invocation.
#[derive(Debug, Clone)]
pub struct AppState {
    /// `None` when region or client id is not configured
    identity: Option<IdentityGateway>,

    storage: StorageGateway,
}

impl AppState {
    pub fn new(identity: Option<IdentityGateway>, storage: StorageGateway) -> Self {
        Self { identity, storage }
    }

    /// The identity gateway, or a configuration error if it is not configured.
    pub fn identity(&self) -> Result<&IdentityGateway, ApiError> {
        self.identity
            .as_ref()
            .ok_or_else(|| ApiError::Config(MISSING_IDENTITY_CONFIG.to_string()))
    }

    pub fn storage(&self) -> &StorageGateway {
        &self.storage
    }
}

// =============================================================================
// Request Bodies
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshTokenRequest {
    pub username: String,
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
pub struct RevokeTokenRequest {
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub username: String,
}

#[derive(Debug, Deserialize)]
pub struct ConfirmForgotPasswordRequest {
    pub username: String,
    /// The new password
    pub password: String,
    /// Reset code sent by the provider
    pub code: String,
}

// =============================================================================
// Response Bodies
// =============================================================================

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ForgotPasswordResponse {
    pub code_delivery_details: Option<CodeDelivery>,
}

// =============================================================================
// Dispatch
// =============================================================================

/// Run the handler for `operation`.
pub async fn handle(
    operation: Operation,
    state: &AppState,
    request: &ApiRequest,
) -> Result<ApiResponse, ApiError> {
    match operation {
        Operation::Health => health(),
        Operation::SignIn => sign_in(state, request).await,
        Operation::RefreshToken => refresh_token(state, request).await,
        Operation::RevokeToken => revoke_token(state, request).await,
        Operation::GlobalSignOut => global_sign_out(state, request).await,
        Operation::ForgotPassword => forgot_password(state, request).await,
        Operation::ConfirmForgotPassword => confirm_forgot_password(state, request).await,
        Operation::FetchObject => fetch_object(state, request).await,
        Operation::FetchObjectUrl => fetch_object_url(state, request).await,
    }
}

// =============================================================================
// Handlers
// =============================================================================

pub fn health() -> Result<ApiResponse, ApiError> {
    json_ok(&HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Sign in with username and password. Responds with the issued tokens.
pub async fn sign_in(state: &AppState, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
    let body: SignInRequest = parse_body(request)?;
    let identity = state.identity()?;

    let tokens = identity.sign_in(&body.username, &body.password).await?;
    json_ok(&tokens)
}

/// Exchange a refresh token for new access and id tokens.
pub async fn refresh_token(
    state: &AppState,
    request: &ApiRequest,
) -> Result<ApiResponse, ApiError> {
    let body: RefreshTokenRequest = parse_body(request)?;
    let identity = state.identity()?;

    let tokens = identity
        .refresh_token(&body.username, &body.refresh_token)
        .await?;
    json_ok(&tokens)
}

pub async fn revoke_token(
    state: &AppState,
    request: &ApiRequest,
) -> Result<ApiResponse, ApiError> {
    let body: RevokeTokenRequest = parse_body(request)?;
    let identity = state.identity()?;

    identity.revoke_token(&body.token).await?;
    Ok(ApiResponse::ok("{}"))
}

/// Sign the user out of every device.
///
/// The access token comes from the `authorization` header, with or without a
/// `Bearer ` prefix.
pub async fn global_sign_out(
    state: &AppState,
    request: &ApiRequest,
) -> Result<ApiResponse, ApiError> {
    let header = request
        .header("authorization")
        .ok_or_else(|| ApiError::Parse("missing auth header".to_string()))?;

    let access_token = access_token(header);
    if access_token.is_empty() {
        return Err(ApiError::Parse("missing access token".to_string()));
    }

    let identity = state.identity()?;
    identity.global_sign_out(access_token).await?;
    Ok(ApiResponse::ok(""))
}

pub async fn forgot_password(
    state: &AppState,
    request: &ApiRequest,
) -> Result<ApiResponse, ApiError> {
    let body: ForgotPasswordRequest = parse_body(request)?;
    let identity = state.identity()?;

    let delivery = identity.forgot_password(&body.username).await?;
    json_ok(&ForgotPasswordResponse {
        code_delivery_details: delivery,
    })
}

pub async fn confirm_forgot_password(
    state: &AppState,
    request: &ApiRequest,
) -> Result<ApiResponse, ApiError> {
    let body: ConfirmForgotPasswordRequest = parse_body(request)?;
    let identity = state.identity()?;

    identity
        .confirm_forgot_password(&body.username, &body.password, &body.code)
        .await?;
    Ok(ApiResponse::ok("{}"))
}

/// Download `file` from the bucket as a base64 body.
///
/// # Headers
///
/// - `Content-Type: application/pdf`
/// - `Content-Disposition: attachment; filename=<file>`
pub async fn fetch_object(
    state: &AppState,
    request: &ApiRequest,
) -> Result<ApiResponse, ApiError> {
    let storage = state.storage();
    storage.bucket()?;
    let key = file_param(request)?;

    let data = storage.fetch(key).await?;

    Ok(ApiResponse::ok(STANDARD.encode(&data))
        .with_header("Content-Type", "application/pdf")
        .with_header(
            "Content-Disposition",
            format!("attachment; filename={}", key),
        ))
}

/// Respond with a pre-signed GET URL for `file`.
pub async fn fetch_object_url(
    state: &AppState,
    request: &ApiRequest,
) -> Result<ApiResponse, ApiError> {
    let storage = state.storage();
    storage.bucket()?;
    let key = file_param(request)?;

    let presigned = storage.presign(key).await?;
    json_ok(&presigned)
}

// =============================================================================
// Helpers
// =============================================================================

fn parse_body<T: DeserializeOwned>(request: &ApiRequest) -> Result<T, ApiError> {
    Ok(serde_json::from_str(&request.body)?)
}

fn json_ok<T: Serialize>(value: &T) -> Result<ApiResponse, ApiError> {
    serde_json::to_string(value)
        .map(ApiResponse::ok)
        .map_err(|e| ApiError::upstream(format!("failed to encode response: {}", e)))
}

/// The `file` query parameter; absent and empty are both rejected.
fn file_param(request: &ApiRequest) -> Result<&str, ApiError> {
    request
        .query_param("file")
        .filter(|file| !file.is_empty())
        .ok_or_else(|| ApiError::Parse("missing file name".to_string()))
}

/// Token part of an `authorization` header value.
///
/// `"Bearer abc"` yields `"abc"`; a value without a space is used as-is.
fn access_token(header: &str) -> &str {
    let mut parts = header.split(' ');
    let first = parts.next().unwrap_or_default();
    parts.next().unwrap_or(first)
}
