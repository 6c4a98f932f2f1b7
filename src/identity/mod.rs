//! Identity provider layer.
//!
//! Handlers never talk to Cognito directly. They go through an
//! [`IdentityGateway`], which owns the app client credentials, computes the
//! `SECRET_HASH` where Cognito needs one, and forwards the call to an
//! [`IdentityProvider`].
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │              HTTP Handlers              │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │            IdentityGateway              │
//! │  (client credentials, SECRET_HASH)      │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │        IdentityProvider Trait           │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │        CognitoIdentityProvider          │
//! │     (Cognito user pools via AWS SDK)    │
//! └─────────────────────────────────────────┘
//! ```

mod cognito;
pub mod secret_hash;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::{IdentitySettings, MISSING_CLIENT_SECRET};
use crate::error::ApiError;

pub use cognito::{create_cognito_client, CognitoIdentityProvider};
pub use secret_hash::secret_hash;

// =============================================================================
// Provider Types
// =============================================================================

/// Tokens issued by a successful sign-in or refresh.
///
/// Serialized with the provider's own PascalCase field names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AuthTokens {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,

    /// Lifetime of the access token in seconds
    #[serde(default)]
    pub expires_in: i32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,

    /// Only present on sign-in; refresh does not rotate the refresh token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
}

/// Where a password reset code was sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CodeDelivery {
    /// Masked destination, e.g. `a***@e***.com`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,

    /// `EMAIL` or `SMS`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_medium: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute_name: Option<String>,
}

/// Access to a managed identity provider.
///
/// Implementations surface provider rejections as [`ApiError::Upstream`] and
/// must not retry.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Password sign-in (`USER_PASSWORD_AUTH`).
    async fn sign_in(
        &self,
        username: &str,
        password: &str,
        secret_hash: Option<&str>,
    ) -> Result<AuthTokens, ApiError>;

    /// Exchange a refresh token for new tokens (`REFRESH_TOKEN_AUTH`).
    async fn refresh_token(
        &self,
        refresh_token: &str,
        secret_hash: &str,
    ) -> Result<AuthTokens, ApiError>;

    /// Revoke a refresh token and the access tokens issued from it.
    async fn revoke_token(&self, token: &str) -> Result<(), ApiError>;

    /// Send a password reset code to the user.
    async fn forgot_password(
        &self,
        username: &str,
        secret_hash: &str,
    ) -> Result<Option<CodeDelivery>, ApiError>;

    /// Set a new password using a reset code.
    async fn confirm_forgot_password(
        &self,
        username: &str,
        password: &str,
        code: &str,
        secret_hash: &str,
    ) -> Result<(), ApiError>;

    /// Invalidate every session of the user owning `access_token`.
    async fn global_sign_out(&self, access_token: &str) -> Result<(), ApiError>;
}

// =============================================================================
// IdentityGateway
// =============================================================================

/// App client view of the identity provider.
#[derive(Clone)]
pub struct IdentityGateway {
    provider: Arc<dyn IdentityProvider>,
    client_id: String,
    client_secret: Option<String>,
    sign_in_secret_hash: bool,
}

impl fmt::Debug for IdentityGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityGateway")
            .field("client_id", &self.client_id)
            .field("has_client_secret", &self.client_secret.is_some())
            .field("sign_in_secret_hash", &self.sign_in_secret_hash)
            .finish()
    }
}

impl IdentityGateway {
    pub fn new(provider: Arc<dyn IdentityProvider>, settings: &IdentitySettings) -> Self {
        Self {
            provider,
            client_id: settings.client_id.clone(),
            client_secret: settings.client_secret.clone(),
            sign_in_secret_hash: false,
        }
    }

    /// Send `SECRET_HASH` on sign-in as well.
    pub fn with_sign_in_secret_hash(mut self, enabled: bool) -> Self {
        self.sign_in_secret_hash = enabled;
        self
    }

    /// Compute the `SECRET_HASH` for `username`.
    ///
    /// Fails with a configuration error when no client secret is configured.
    pub fn secret_hash(&self, username: &str) -> Result<String, ApiError> {
        let client_secret = self
            .client_secret
            .as_deref()
            .ok_or_else(|| ApiError::Config(MISSING_CLIENT_SECRET.to_string()))?;
        Ok(secret_hash(username, &self.client_id, client_secret))
    }

    pub async fn sign_in(&self, username: &str, password: &str) -> Result<AuthTokens, ApiError> {
        let hash = if self.sign_in_secret_hash {
            Some(self.secret_hash(username)?)
        } else {
            None
        };
        self.provider
            .sign_in(username, password, hash.as_deref())
            .await
    }

    pub async fn refresh_token(
        &self,
        username: &str,
        refresh_token: &str,
    ) -> Result<AuthTokens, ApiError> {
        let hash = self.secret_hash(username)?;
        self.provider.refresh_token(refresh_token, &hash).await
    }

    pub async fn revoke_token(&self, token: &str) -> Result<(), ApiError> {
        self.provider.revoke_token(token).await
    }

    pub async fn forgot_password(&self, username: &str) -> Result<Option<CodeDelivery>, ApiError> {
        let hash = self.secret_hash(username)?;
        self.provider.forgot_password(username, &hash).await
    }

    pub async fn confirm_forgot_password(
        &self,
        username: &str,
        password: &str,
        code: &str,
    ) -> Result<(), ApiError> {
        let hash = self.secret_hash(username)?;
        self.provider
            .confirm_forgot_password(username, password, code, &hash)
            .await
    }

    pub async fn global_sign_out(&self, access_token: &str) -> Result<(), ApiError> {
        self.provider.global_sign_out(access_token).await
    }
}
