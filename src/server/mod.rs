//! HTTP layer for the portfolio API.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │   lambda (API Gateway events)        local (axum dev server)    │
//! └───────────────────────────────┬─────────────────────────────────┘
//!                                 │ ApiRequest
//!                                 ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                            Gateway                              │
//! │  ┌─────────────┐  ┌─────────────────┐  ┌─────────────────────┐  │
//! │  │   routes    │  │    handlers     │  │      response       │  │
//! │  │ (RouteKey → │  │ (identity and   │  │ (ok / bad /         │  │
//! │  │  Operation) │  │  storage calls) │  │  not_found)         │  │
//! │  └─────────────┘  └─────────────────┘  └─────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod gateway;
pub mod handlers;
pub mod lambda;
pub mod local;
pub mod request;
pub mod response;
pub mod routes;

pub use gateway::Gateway;
pub use handlers::{
    AppState, ConfirmForgotPasswordRequest, ForgotPasswordRequest, ForgotPasswordResponse,
    HealthResponse, RefreshTokenRequest, RevokeTokenRequest, SignInRequest,
};
pub use local::create_local_router;
pub use request::ApiRequest;
pub use response::{ApiResponse, NOT_FOUND_BODY};
pub use routes::{Operation, RouteConflict, RouteKey, RouteTable, PROXY_MARKER, ROUTES};
