//! Cognito user pools implementation of [`IdentityProvider`].

use async_trait::async_trait;
use aws_config::retry::RetryConfig;
use aws_sdk_cognitoidentityprovider::error::{DisplayErrorContext, ProvideErrorMetadata};
use aws_sdk_cognitoidentityprovider::types::{AuthFlowType, AuthenticationResultType};
use aws_sdk_cognitoidentityprovider::Client;
use tracing::warn;

use super::{AuthTokens, CodeDelivery, IdentityProvider};
use crate::config::IdentitySettings;
use crate::error::{upstream_error, ApiError};

/// Cognito-backed identity provider.
///
/// Calls are made as a public app client: `USER_PASSWORD_AUTH` and
/// `REFRESH_TOKEN_AUTH` flows, with the client secret sent only where the API
/// takes it directly (token revocation).
#[derive(Clone, Debug)]
pub struct CognitoIdentityProvider {
    client: Client,
    client_id: String,
    client_secret: Option<String>,
}

impl CognitoIdentityProvider {
    pub fn new(client: Client, settings: &IdentitySettings) -> Self {
        Self {
            client,
            client_id: settings.client_id.clone(),
            client_secret: settings.client_secret.clone(),
        }
    }
}

#[async_trait]
impl IdentityProvider for CognitoIdentityProvider {
    async fn sign_in(
        &self,
        username: &str,
        password: &str,
        secret_hash: Option<&str>,
    ) -> Result<AuthTokens, ApiError> {
        let mut request = self
            .client
            .initiate_auth()
            .auth_flow(AuthFlowType::UserPasswordAuth)
            .client_id(&self.client_id)
            .auth_parameters("USERNAME", username)
            .auth_parameters("PASSWORD", password);

        if let Some(hash) = secret_hash {
            request = request.auth_parameters("SECRET_HASH", hash);
        }

        let output = match request.send().await {
            Ok(output) => output,
            Err(err) => {
                let reset_required = err
                    .as_service_error()
                    .map(|e| e.is_password_reset_required_exception())
                    .unwrap_or(false);

                if reset_required {
                    warn!(
                        username = username,
                        "Password reset required: {}",
                        err.message().unwrap_or("no message")
                    );
                } else {
                    warn!(
                        username = username,
                        "Couldn't sign in user: {}",
                        DisplayErrorContext(&err)
                    );
                }
                return Err(upstream_error(err));
            }
        };

        match output.authentication_result() {
            Some(result) => Ok(tokens_from(result)),
            None => Err(ApiError::upstream(format!(
                "authentication challenge required: {}",
                output
                    .challenge_name()
                    .map(|c| c.as_str())
                    .unwrap_or("unknown")
            ))),
        }
    }

    async fn refresh_token(
        &self,
        refresh_token: &str,
        secret_hash: &str,
    ) -> Result<AuthTokens, ApiError> {
        let output = self
            .client
            .initiate_auth()
            .auth_flow(AuthFlowType::RefreshTokenAuth)
            .client_id(&self.client_id)
            .auth_parameters("REFRESH_TOKEN", refresh_token)
            .auth_parameters("SECRET_HASH", secret_hash)
            .send()
            .await
            .map_err(upstream_error)?;

        output
            .authentication_result()
            .map(tokens_from)
            .ok_or_else(|| ApiError::upstream("refresh returned no authentication result"))
    }

    async fn revoke_token(&self, token: &str) -> Result<(), ApiError> {
        self.client
            .revoke_token()
            .token(token)
            .client_id(&self.client_id)
            .set_client_secret(self.client_secret.clone())
            .send()
            .await
            .map_err(upstream_error)?;
        Ok(())
    }

    async fn forgot_password(
        &self,
        username: &str,
        secret_hash: &str,
    ) -> Result<Option<CodeDelivery>, ApiError> {
        let output = self
            .client
            .forgot_password()
            .client_id(&self.client_id)
            .username(username)
            .secret_hash(secret_hash)
            .send()
            .await
            .map_err(upstream_error)?;

        Ok(output.code_delivery_details().map(|details| CodeDelivery {
            destination: details.destination().map(str::to_string),
            delivery_medium: details.delivery_medium().map(|m| m.as_str().to_string()),
            attribute_name: details.attribute_name().map(str::to_string),
        }))
    }

    async fn confirm_forgot_password(
        &self,
        username: &str,
        password: &str,
        code: &str,
        secret_hash: &str,
    ) -> Result<(), ApiError> {
        self.client
            .confirm_forgot_password()
            .client_id(&self.client_id)
            .username(username)
            .password(password)
            .confirmation_code(code)
            .secret_hash(secret_hash)
            .send()
            .await
            .map_err(upstream_error)?;
        Ok(())
    }

    async fn global_sign_out(&self, access_token: &str) -> Result<(), ApiError> {
        self.client
            .global_sign_out()
            .access_token(access_token)
            .send()
            .await
            .map_err(upstream_error)?;
        Ok(())
    }
}

fn tokens_from(result: &AuthenticationResultType) -> AuthTokens {
    AuthTokens {
        access_token: result.access_token().map(str::to_string),
        expires_in: result.expires_in(),
        id_token: result.id_token().map(str::to_string),
        refresh_token: result.refresh_token().map(str::to_string),
        token_type: result.token_type().map(str::to_string),
    }
}

/// Create a Cognito client for the given region with optional custom endpoint.
///
/// Retries are disabled: a failed call surfaces to the caller immediately.
pub async fn create_cognito_client(region: &str, endpoint_url: Option<&str>) -> Client {
    let region = aws_config::Region::new(region.to_string());
    let mut config_loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(region)
        .retry_config(RetryConfig::disabled());

    if let Some(endpoint) = endpoint_url {
        config_loader = config_loader.endpoint_url(endpoint);
    }

    Client::new(&config_loader.load().await)
}
