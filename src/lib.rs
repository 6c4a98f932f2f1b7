//! # Portfolio API
//!
//! A serverless HTTP backend that puts a managed identity provider (Amazon
//! Cognito) and an object store (Amazon S3) behind a single set of routes.
//!
//! Requests arrive as API Gateway events under AWS Lambda, or over plain HTTP
//! from the local development server. Both are turned into an
//! [`ApiRequest`], routed by method and path, and answered with an
//! [`ApiResponse`].
//!
//! ## Features
//!
//! - **Authentication**: password sign-in, token refresh and revocation,
//!   password reset, and global sign-out
//! - **File access**: download objects as base64 or hand out pre-signed URLs
//! - **Two runtimes**: the Lambda runtime API and a local axum server
//!
//! ## Architecture
//!
//! - [`config`] - CLI and configuration types
//! - [`error`] - Error taxonomy shared by every module
//! - [`identity`] - Identity provider trait, Cognito client, and SECRET_HASH
//! - [`storage`] - Object store trait and S3 client
//! - [`server`] - Routing, handlers, and the Lambda and local adapters
//!
//! ## Example
//!
//! ```rust,no_run
//! use portfolio_api::{ApiRequest, Gateway, GatewayConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = GatewayConfig {
//!         region: Some("eu-west-1".to_string()),
//!         client_id: Some("client-id".to_string()),
//!         bucket: Some("portfolio-files".to_string()),
//!         presign_ttl: 300,
//!         ..GatewayConfig::default()
//!     };
//!
//!     let gateway = Gateway::from_config(&config).await;
//!     let response = gateway.handle(ApiRequest::new("GET", "/health")).await;
//!     assert_eq!(response.status_code, 200);
//! }
//! ```

pub mod config;
pub mod error;
pub mod identity;
pub mod server;
pub mod storage;

// Re-export commonly used types
pub use config::{
    Cli, Command, GatewayConfig, IdentitySettings, LambdaConfig, SecretHashConfig, ServeConfig,
};
pub use error::{ApiError, ErrorKind};
pub use identity::{
    create_cognito_client, secret_hash, AuthTokens, CodeDelivery, CognitoIdentityProvider,
    IdentityGateway, IdentityProvider,
};
pub use server::{
    create_local_router, ApiRequest, ApiResponse, AppState, Gateway, Operation, RouteConflict,
    RouteKey, RouteTable,
};
pub use storage::{create_s3_client, ObjectStore, PresignedUrl, S3ObjectStore, StorageGateway};
