//! Configuration management for the portfolio API.
//!
//! Configuration is read once at process start, from command-line arguments
//! with environment-variable fallbacks, and then injected into the handlers.
//!
//! # Environment Variables
//!
//! - `REGION` - Cognito user pool region
//! - `COGNITO_CLIENT_ID` - Cognito app client id
//! - `COGNITO_CLIENT_SECRET` - Cognito app client secret (keys the secret hash)
//! - `PORTFOLIO_S3_BUCKET_NAME` - Bucket holding downloadable files
//! - `SIGN_IN_SECRET_HASH` - Send `SECRET_HASH` on sign-in (default: false)
//! - `PRESIGN_TTL_SECS` - Lifetime of pre-signed download URLs (default: 300)
//! - `COGNITO_ENDPOINT` / `S3_ENDPOINT` - Endpoint overrides for local testing
//! - `PORTFOLIO_HOST` / `PORTFOLIO_PORT` - Bind address of the `serve` command
//!
//! Missing identity or bucket settings do not stop the process. Each handler
//! that needs them answers with a 400 configuration error instead.

use std::time::Duration;

use clap::{Args, Parser, Subcommand};

// =============================================================================
// Default Values
// =============================================================================

/// Default bind host for the local server.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default port for the local server.
pub const DEFAULT_PORT: u16 = 3000;

/// Default lifetime of a pre-signed download URL (5 minutes).
pub const DEFAULT_PRESIGN_TTL_SECS: u64 = 300;

/// Longest lifetime S3 accepts for a SigV4 pre-signed URL (7 days).
pub const MAX_PRESIGN_TTL_SECS: u64 = 7 * 24 * 60 * 60;

/// Body returned when region or client id is not configured.
pub const MISSING_IDENTITY_CONFIG: &str =
    "failed to read configs: REGION and COGNITO_CLIENT_ID must be set";

/// Body returned when a secret hash is needed but no client secret is configured.
pub const MISSING_CLIENT_SECRET: &str = "failed to read configs: COGNITO_CLIENT_SECRET must be set";

/// Body returned when the bucket is not configured.
pub const MISSING_BUCKET_CONFIG: &str = "S3 config does not exist";

// =============================================================================
// CLI Arguments
// =============================================================================

/// Portfolio API - Cognito and S3 operations behind a single Lambda function.
///
/// Runs under the AWS Lambda runtime when no subcommand is given.
#[derive(Parser, Debug, Clone)]
#[command(name = "portfolio-api")]
#[command(author, version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub gateway: GatewayConfig,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl Cli {
    /// Resolve the command to run, defaulting to the Lambda runtime.
    pub fn into_command(self) -> Command {
        match self.command {
            Some(command) => command,
            None => Command::Lambda(LambdaConfig {
                gateway: self.gateway,
                verbose: self.verbose,
            }),
        }
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Serve requests from the AWS Lambda runtime API.
    Lambda(LambdaConfig),

    /// Run a local HTTP server over the same routes.
    Serve(ServeConfig),

    /// Print the Cognito SECRET_HASH for a username.
    SecretHash(SecretHashConfig),
}

// =============================================================================
// Gateway Configuration
// =============================================================================

/// Settings shared by every way of running the gateway.
#[derive(Args, Debug, Clone, Default)]
pub struct GatewayConfig {
    // =========================================================================
    // Identity Provider
    // =========================================================================
    /// AWS region of the Cognito user pool.
    #[arg(long, env = "REGION")]
    pub region: Option<String>,

    /// Cognito app client id.
    #[arg(long, env = "COGNITO_CLIENT_ID")]
    pub client_id: Option<String>,

    /// Cognito app client secret.
    #[arg(long, env = "COGNITO_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: Option<String>,

    /// Send SECRET_HASH with USER_PASSWORD_AUTH sign-in.
    ///
    /// App clients created with a secret reject sign-in without it.
    #[arg(long, default_value_t = false, env = "SIGN_IN_SECRET_HASH")]
    pub sign_in_secret_hash: bool,

    /// Custom Cognito endpoint URL.
    #[arg(long, env = "COGNITO_ENDPOINT")]
    pub cognito_endpoint: Option<String>,

    // =========================================================================
    // Object Store
    // =========================================================================
    /// S3 bucket containing downloadable files.
    #[arg(long, env = "PORTFOLIO_S3_BUCKET_NAME")]
    pub bucket: Option<String>,

    /// Lifetime of pre-signed download URLs in seconds.
    #[arg(long, default_value_t = DEFAULT_PRESIGN_TTL_SECS, env = "PRESIGN_TTL_SECS")]
    pub presign_ttl: u64,

    /// Custom S3 endpoint URL for S3-compatible services (MinIO, etc.).
    #[arg(long, env = "S3_ENDPOINT")]
    pub s3_endpoint: Option<String>,
}

/// Region, client id and secret needed to talk to the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentitySettings {
    pub region: String,
    pub client_id: String,
    pub client_secret: Option<String>,
}

impl GatewayConfig {
    /// Validate value formats. Absent settings are not an error here.
    pub fn validate(&self) -> Result<(), String> {
        if self.presign_ttl == 0 || self.presign_ttl > MAX_PRESIGN_TTL_SECS {
            return Err(format!(
                "presign_ttl must be between 1 and {} seconds",
                MAX_PRESIGN_TTL_SECS
            ));
        }

        for (name, endpoint) in [
            ("cognito_endpoint", &self.cognito_endpoint),
            ("s3_endpoint", &self.s3_endpoint),
        ] {
            if let Some(endpoint) = endpoint {
                validate_endpoint(endpoint).map_err(|reason| format!("{}: {}", name, reason))?;
            }
        }

        Ok(())
    }

    /// Identity settings, or `None` if region or client id is missing.
    pub fn identity_settings(&self) -> Option<IdentitySettings> {
        let region = non_empty(&self.region)?;
        let client_id = non_empty(&self.client_id)?;

        Some(IdentitySettings {
            region: region.to_string(),
            client_id: client_id.to_string(),
            client_secret: non_empty(&self.client_secret).map(str::to_string),
        })
    }

    pub fn bucket(&self) -> Option<&str> {
        non_empty(&self.bucket)
    }

    pub fn presign_ttl(&self) -> Duration {
        Duration::from_secs(self.presign_ttl)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

fn validate_endpoint(endpoint: &str) -> Result<(), String> {
    let url = url::Url::parse(endpoint).map_err(|e| format!("invalid URL '{}': {}", endpoint, e))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(format!("unsupported scheme '{}'", other)),
    }
}

// =============================================================================
// Command Configurations
// =============================================================================

/// Configuration for the `lambda` command.
#[derive(Args, Debug, Clone)]
pub struct LambdaConfig {
    #[command(flatten)]
    pub gateway: GatewayConfig,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

/// Configuration for the `serve` command.
#[derive(Args, Debug, Clone)]
pub struct ServeConfig {
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "PORTFOLIO_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "PORTFOLIO_PORT")]
    pub port: u16,

    #[command(flatten)]
    pub gateway: GatewayConfig,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl ServeConfig {
    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Configuration for the `secret-hash` command.
#[derive(Args, Debug, Clone)]
pub struct SecretHashConfig {
    /// Username to compute the hash for.
    #[arg(long)]
    pub username: String,

    /// Cognito app client id.
    #[arg(long, env = "COGNITO_CLIENT_ID")]
    pub client_id: Option<String>,

    /// Cognito app client secret.
    #[arg(long, env = "COGNITO_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: Option<String>,
}

impl SecretHashConfig {
    /// Return `(client_id, client_secret)` or a message naming what is missing.
    pub fn credentials(&self) -> Result<(&str, &str), String> {
        let client_id = non_empty(&self.client_id)
            .ok_or_else(|| "client id is required. Set --client-id or COGNITO_CLIENT_ID".to_string())?;
        let client_secret = non_empty(&self.client_secret).ok_or_else(|| {
            "client secret is required. Set --client-secret or COGNITO_CLIENT_SECRET".to_string()
        })?;
        Ok((client_id, client_secret))
    }
}

// =============================================================================
// Tests
// =============================================================================
