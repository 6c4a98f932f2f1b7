//! Runtime-independent view of an inbound request.

use std::collections::HashMap;

use url::form_urlencoded;

use crate::error::ApiError;

/// An inbound HTTP event.
///
/// Both the Lambda adapter and the local server convert their native request
/// type into this shape before routing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiRequest {
    /// `"<METHOD> <path template>"`, e.g. `"POST /auth/v1/login"` or `"ANY /{proxy+}"`
    pub route_key: String,

    /// Method the client actually used
    pub method: String,

    /// Path the client actually requested
    pub raw_path: String,

    /// Header names as received
    pub headers: HashMap<String, String>,

    pub query: HashMap<String, String>,

    pub body: String,
}

impl ApiRequest {
    /// Create a request whose route key is its own method and path.
    pub fn new(method: impl Into<String>, raw_path: impl Into<String>) -> Self {
        let method = method.into();
        let raw_path = raw_path.into();
        Self {
            route_key: format!("{} {}", method, raw_path),
            method,
            raw_path,
            ..Self::default()
        }
    }

    pub fn with_route_key(mut self, route_key: impl Into<String>) -> Self {
        self.route_key = route_key.into();
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Look up a header, preferring an exact name match.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(name)
            .or_else(|| {
                self.headers
                    .iter()
                    .find(|(k, _)| k.eq_ignore_ascii_case(name))
                    .map(|(_, v)| v)
            })
            .map(String::as_str)
    }

    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    /// Build a request from plain HTTP parts.
    ///
    /// Used when no API Gateway route key is available; the route key is
    /// derived from the method and path. Fails if the body is not UTF-8.
    pub fn from_http_parts(parts: &http::request::Parts, body: &[u8]) -> Result<Self, ApiError> {
        let mut request = Self::new(parts.method.as_str(), parts.uri.path());
        request.headers = collect_headers(&parts.headers);
        if let Some(query) = parts.uri.query() {
            request.query = parse_query(query);
        }
        request.body = body_text(body)?;
        Ok(request)
    }
}

/// Collect headers into a map. Non-UTF-8 values are skipped; for repeated
/// names the first value wins.
pub(crate) fn collect_headers(headers: &http::HeaderMap) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for (name, value) in headers {
        if let Ok(value) = value.to_str() {
            map.entry(name.as_str().to_string())
                .or_insert_with(|| value.to_string());
        }
    }
    map
}

/// Request body as text. Invalid UTF-8 is rejected rather than replaced.
pub(crate) fn body_text(body: &[u8]) -> Result<String, ApiError> {
    std::str::from_utf8(body)
        .map(str::to_string)
        .map_err(|e| ApiError::Parse(format!("request body is not valid UTF-8: {}", e)))
}

/// Parse a raw query string. For repeated names the first value wins.
pub(crate) fn parse_query(query: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for (name, value) in form_urlencoded::parse(query.as_bytes()) {
        map.entry(name.into_owned())
            .or_insert_with(|| value.into_owned());
    }
    map
}
