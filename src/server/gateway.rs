//! Request entry point.
//!
//! [`Gateway::handle`] never fails: routing misses become 404 responses and
//! handler errors become 400 responses, both logged and not propagated.

use std::sync::Arc;

use tracing::{info, warn};

use super::handlers::{self, AppState};
use super::request::ApiRequest;
use super::response::ApiResponse;
use super::routes::RouteTable;
use crate::config::GatewayConfig;
use crate::error::ErrorKind;
use crate::identity::{create_cognito_client, CognitoIdentityProvider, IdentityGateway};
use crate::storage::{create_s3_client, S3ObjectStore, StorageGateway};

/// Routing table plus handler dependencies.
#[derive(Debug, Clone)]
pub struct Gateway {
    routes: RouteTable,
    state: AppState,
}

impl Gateway {
    pub fn new(routes: RouteTable, state: AppState) -> Self {
        Self { routes, state }
    }

    /// Build the standard routes and AWS-backed services from configuration.
    ///
    /// The identity gateway is left unconfigured when region or client id is
    /// missing; the handlers that need it then answer with a 400.
    pub async fn from_config(config: &GatewayConfig) -> Self {
        let identity = match config.identity_settings() {
            Some(settings) => {
                let client =
                    create_cognito_client(&settings.region, config.cognito_endpoint.as_deref())
                        .await;
                let provider = Arc::new(CognitoIdentityProvider::new(client, &settings));
                info!(
                    region = %settings.region,
                    client_secret = settings.client_secret.is_some(),
                    sign_in_secret_hash = config.sign_in_secret_hash,
                    "Identity provider configured"
                );
                Some(
                    IdentityGateway::new(provider, &settings)
                        .with_sign_in_secret_hash(config.sign_in_secret_hash),
                )
            }
            None => {
                warn!("Identity provider not configured: REGION and COGNITO_CLIENT_ID are required");
                None
            }
        };

        let bucket = config.bucket().map(str::to_string);
        if bucket.is_none() {
            warn!("Object store not configured: PORTFOLIO_S3_BUCKET_NAME is not set");
        }

        let s3_client = create_s3_client(config.s3_endpoint.as_deref(), None).await;
        let storage = StorageGateway::new(Arc::new(S3ObjectStore::new(s3_client)), bucket)
            .with_presign_ttl(config.presign_ttl());

        Self::new(RouteTable::standard(), AppState::new(identity, storage))
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Route and handle one request. Always returns a well-formed response.
    pub async fn handle(&self, request: ApiRequest) -> ApiResponse {
        let operation = match self.routes.resolve(&request) {
            Ok(operation) => operation,
            Err(err) => {
                warn!(
                    route = %request.route_key,
                    method = %request.method,
                    path = %request.raw_path,
                    "{}",
                    err
                );
                return ApiResponse::not_found();
            }
        };

        match handlers::handle(operation, &self.state, &request).await {
            Ok(response) => response,
            Err(err) => {
                warn!(
                    operation = operation.name(),
                    error_kind = err.kind().as_str(),
                    status = err.status_code(),
                    "Request failed: {}",
                    err
                );
                match err.kind() {
                    ErrorKind::NotFound => ApiResponse::not_found(),
                    _ => ApiResponse::bad(&err),
                }
            }
        }
    }
}
