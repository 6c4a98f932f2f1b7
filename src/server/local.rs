//! Local development server.
//!
//! Serves the same routes as the Lambda function over plain HTTP with axum.
//! Every path goes to one fallback handler, which hands the request to the
//! [`Gateway`] exactly as the Lambda adapter does.
//!
//! # Example
//!
//! ```ignore
//! let gateway = Gateway::from_config(&config).await;
//! let router = create_local_router(gateway, true);
//!
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
//! axum::serve(listener, router).await?;
//! ```

use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::response::Response;
use axum::Router;
use tower_http::trace::TraceLayer;

use super::gateway::Gateway;
use super::request::ApiRequest;
use super::response::ApiResponse;
use crate::error::ApiError;

/// Largest request body accepted, matching the Lambda payload limit (6 MB).
pub const MAX_BODY_BYTES: usize = 6 * 1024 * 1024;

/// Create the local router, optionally with request tracing.
pub fn create_local_router(gateway: Gateway, enable_tracing: bool) -> Router {
    let router = Router::new()
        .fallback(local_handler)
        .with_state(Arc::new(gateway));

    if enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

async fn local_handler(State(gateway): State<Arc<Gateway>>, request: Request) -> Response {
    let (parts, body) = request.into_parts();

    let bytes = match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            let err = ApiError::Parse(format!("failed to read request body: {}", e));
            return ApiResponse::bad(&err).into_http::<Body>();
        }
    };

    match ApiRequest::from_http_parts(&parts, &bytes) {
        Ok(request) => gateway.handle(request).await.into_http::<Body>(),
        Err(err) => ApiResponse::bad(&err).into_http::<Body>(),
    }
}
