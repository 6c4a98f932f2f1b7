//! Canonical response shapes.

use std::collections::HashMap;
use std::fmt;

use http::{HeaderName, HeaderValue, StatusCode};
use tracing::warn;

/// Body of every 404 response.
pub const NOT_FOUND_BODY: &str = "not found";

/// Outbound response. `headers` is always a map, possibly empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiResponse {
    pub status_code: u16,
    pub body: String,
    pub headers: HashMap<String, String>,
}

impl ApiResponse {
    /// 200 with the given body.
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status_code: 200,
            body: body.into(),
            headers: HashMap::new(),
        }
    }

    /// 400 with the error's message as body.
    pub fn bad(err: &impl fmt::Display) -> Self {
        Self {
            status_code: 400,
            body: err.to_string(),
            headers: HashMap::new(),
        }
    }

    /// 404 with a fixed body.
    pub fn not_found() -> Self {
        Self {
            status_code: 404,
            body: NOT_FOUND_BODY.to_string(),
            headers: HashMap::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Convert into an HTTP response for either runtime.
    ///
    /// Headers that are not valid HTTP names or values are dropped.
    pub fn into_http<B: From<String>>(self) -> http::Response<B> {
        let mut response = http::Response::new(B::from(self.body));
        *response.status_mut() =
            StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::BAD_REQUEST);

        for (name, value) in self.headers {
            match (
                HeaderName::try_from(name.as_str()),
                HeaderValue::try_from(value.as_str()),
            ) {
                (Ok(name), Ok(value)) => {
                    response.headers_mut().insert(name, value);
                }
                _ => warn!(header = %name, "Dropping invalid response header"),
            }
        }

        response
    }
}
