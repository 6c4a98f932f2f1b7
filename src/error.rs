use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use thiserror::Error;

/// Broad category of an [`ApiError`].
///
/// Callers branch on this instead of matching message strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Request body, query parameter, or header could not be used
    Parse,
    /// Required configuration is missing
    Config,
    /// The identity provider or object store rejected the call
    Upstream,
    /// No handler is registered for the route key
    NotFound,
}

impl ErrorKind {
    /// Short identifier used in structured log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Parse => "parse",
            ErrorKind::Config => "config",
            ErrorKind::Upstream => "upstream",
            ErrorKind::NotFound => "not_found",
        }
    }
}

/// Errors produced while handling a single request.
///
/// The `Display` output is the exact text returned in the response body.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// Malformed input (body does not decode, required query/header missing)
    #[error("{0}")]
    Parse(String),

    /// Missing environment configuration
    #[error("{0}")]
    Config(String),

    /// Provider error, passed through verbatim
    #[error("{message}")]
    Upstream {
        message: String,
        /// HTTP status of the provider's raw response, when there was one
        status: Option<u16>,
    },

    /// Route key has no registered handler
    #[error("not found: {0}")]
    NotFound(String),
}

impl ApiError {
    /// Create an upstream error without a provider status.
    pub fn upstream(message: impl Into<String>) -> Self {
        ApiError::Upstream {
            message: message.into(),
            status: None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Parse(_) => ErrorKind::Parse,
            ApiError::Config(_) => ErrorKind::Config,
            ApiError::Upstream { .. } => ErrorKind::Upstream,
            ApiError::NotFound(_) => ErrorKind::NotFound,
        }
    }

    /// HTTP status this error maps to. Only 400 and 404 are ever produced.
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::NotFound(_) => 404,
            _ => 400,
        }
    }
}

/// Convert an AWS SDK error into an upstream error, keeping the provider's
/// code, message, and HTTP status.
///
/// Every AWS SDK crate re-exports the same smithy `SdkError`, so this works
/// for Cognito and S3 alike.
pub(crate) fn upstream_error<E>(err: SdkError<E>) -> ApiError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    let status = err.raw_response().map(|r| r.status().as_u16());
    let message = match (err.code(), err.message()) {
        (Some(code), Some(message)) => format!("{}: {}", code, message),
        (Some(code), None) => code.to_string(),
        _ => DisplayErrorContext(&err).to_string(),
    };
    ApiError::Upstream { message, status }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Parse(format!("invalid request body: {}", err))
    }
}
