//! Routing table for the portfolio API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                           - Health check
//! POST /auth/v1/login                    - Sign in
//! POST /user/v1/refresh                  - Refresh tokens
//! POST /user/v1/revoke                   - Revoke a refresh token
//! POST /user/v1/logout                   - Global sign-out
//! POST /user/v1/forgot-password          - Send a password reset code
//! POST /user/v1/confirm-forgot-password  - Set a new password with a reset code
//! GET  /s3/fetch                         - Download a file (base64 body)
//! GET  /s3/fetch-url                     - Pre-signed download URL
//! ```
//!
//! Lookup is an exact match on the upper-cased method and lower-cased path.
//! There is no prefix matching and no trailing-slash normalization. The only
//! wildcard is the API Gateway catch-all `/{proxy+}`: when the route key
//! contains it, the real request path is used instead.

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

use super::request::ApiRequest;
use crate::error::ApiError;

/// Catch-all path segment used by API Gateway proxy integrations.
pub const PROXY_MARKER: &str = "/{proxy+}";

// =============================================================================
// Route Key
// =============================================================================

/// Normalized (method, path) pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RouteKey {
    method: String,
    path: String,
}

impl RouteKey {
    /// Create a key, upper-casing the method and lower-casing the path.
    pub fn new(method: &str, path: &str) -> Self {
        Self {
            method: method.to_uppercase(),
            path: path.to_lowercase(),
        }
    }

    /// Derive the lookup key for a request.
    ///
    /// The route key is split on its first space into method and path. A
    /// path containing [`PROXY_MARKER`] is replaced by the raw request path.
    /// An `ANY` method, or a route key without a path (`$default`), falls
    /// back to the request's own method and path.
    pub fn for_request(request: &ApiRequest) -> Self {
        let (method, path) = match request.route_key.split_once(' ') {
            Some((method, path)) => (method, Some(path)),
            None => (request.route_key.as_str(), None),
        };

        let method = match path {
            Some(_) if !method.eq_ignore_ascii_case("ANY") => method,
            _ => request.method.as_str(),
        };

        let path = match path {
            Some(path) if !path.contains(PROXY_MARKER) => path,
            _ => request.raw_path.as_str(),
        };

        Self::new(method, path)
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl fmt::Display for RouteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

// =============================================================================
// Operations
// =============================================================================

/// The handler a route dispatches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Health,
    SignIn,
    RefreshToken,
    RevokeToken,
    GlobalSignOut,
    ForgotPassword,
    ConfirmForgotPassword,
    FetchObject,
    FetchObjectUrl,
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Health => "health",
            Operation::SignIn => "sign_in",
            Operation::RefreshToken => "refresh_token",
            Operation::RevokeToken => "revoke_token",
            Operation::GlobalSignOut => "global_sign_out",
            Operation::ForgotPassword => "forgot_password",
            Operation::ConfirmForgotPassword => "confirm_forgot_password",
            Operation::FetchObject => "fetch_object",
            Operation::FetchObjectUrl => "fetch_object_url",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Routes served by the standard table.
pub const ROUTES: &[(&str, &str, Operation)] = &[
    ("GET", "/health", Operation::Health),
    ("POST", "/auth/v1/login", Operation::SignIn),
    ("POST", "/user/v1/refresh", Operation::RefreshToken),
    ("POST", "/user/v1/revoke", Operation::RevokeToken),
    ("POST", "/user/v1/logout", Operation::GlobalSignOut),
    ("POST", "/user/v1/forgot-password", Operation::ForgotPassword),
    (
        "POST",
        "/user/v1/confirm-forgot-password",
        Operation::ConfirmForgotPassword,
    ),
    ("GET", "/s3/fetch", Operation::FetchObject),
    ("GET", "/s3/fetch-url", Operation::FetchObjectUrl),
];

// =============================================================================
// Route Table
// =============================================================================

/// A second registration for an existing route key.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("route {key} is already registered to {existing}")]
pub struct RouteConflict {
    pub key: RouteKey,
    pub existing: Operation,
}

/// Immutable-after-construction mapping from route key to operation.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: HashMap<RouteKey, Operation>,
}

impl RouteTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the table with every route in [`ROUTES`].
    pub fn standard() -> Self {
        let routes = ROUTES
            .iter()
            .map(|(method, path, operation)| (RouteKey::new(method, path), *operation))
            .collect();
        Self { routes }
    }

    /// Register a route. Keys must be unique.
    pub fn register(
        &mut self,
        method: &str,
        path: &str,
        operation: Operation,
    ) -> Result<(), RouteConflict> {
        let key = RouteKey::new(method, path);
        if let Some(existing) = self.routes.get(&key) {
            return Err(RouteConflict {
                key,
                existing: *existing,
            });
        }
        self.routes.insert(key, operation);
        Ok(())
    }

    pub fn get(&self, key: &RouteKey) -> Option<Operation> {
        self.routes.get(key).copied()
    }

    /// Find the operation for a request, or `ApiError::NotFound` naming its route key.
    pub fn resolve(&self, request: &ApiRequest) -> Result<Operation, ApiError> {
        let key = RouteKey::for_request(request);
        self.get(&key)
            .ok_or_else(|| ApiError::NotFound(request.route_key.clone()))
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
