//! AWS Lambda adapter.
//!
//! Converts API Gateway HTTP API events into [`ApiRequest`]s and runs them
//! through the shared [`Gateway`].

use std::sync::Arc;

use lambda_http::request::RequestContext;
use lambda_http::{service_fn, Body, Error, Request, RequestExt, Response};

use super::gateway::Gateway;
use super::request::{body_text, collect_headers, ApiRequest};
use super::response::ApiResponse;
use crate::error::ApiError;

/// Header that makes `lambda_http` send the body as text whatever the
/// `Content-Type`. Without it a base64 file body under `application/pdf`
/// would be base64-encoded a second time.
pub const CONTENT_ENCODING_HEADER: &str = "x-lambda-http-content-encoding";

/// Start the Lambda runtime loop. Returns only if the runtime fails.
pub async fn run(gateway: Gateway) -> Result<(), Error> {
    let gateway = Arc::new(gateway);
    lambda_http::run(service_fn(move |event: Request| {
        let gateway = Arc::clone(&gateway);
        async move { handle_event(&gateway, event).await }
    }))
    .await
}

/// Handle a single Lambda event.
pub async fn handle_event(gateway: &Gateway, event: Request) -> Result<Response<Body>, Error> {
    let response = match api_request_from_event(&event) {
        Ok(request) => gateway.handle(request).await,
        Err(err) => ApiResponse::bad(&err),
    };
    Ok(into_lambda_response(response))
}

/// Convert a response for the Lambda runtime. Every body is sent as text.
pub fn into_lambda_response(response: ApiResponse) -> Response<Body> {
    response
        .with_header(CONTENT_ENCODING_HEADER, "text")
        .into_http()
}

/// Convert a Lambda HTTP event into an [`ApiRequest`].
///
/// The route key comes from the API Gateway v2 request context when present,
/// otherwise it is `"<METHOD> <raw path>"`.
/// Fails if the body is not UTF-8.
pub fn api_request_from_event(event: &Request) -> Result<ApiRequest, ApiError> {
    let raw_path = match event.raw_http_path() {
        "" => event.uri().path(),
        path => path,
    };

    let mut request = ApiRequest::new(event.method().as_str(), raw_path);

    if let Some(RequestContext::ApiGatewayV2(context)) = event.request_context_ref() {
        if let Some(route_key) = &context.route_key {
            request.route_key = route_key.clone();
        }
    }

    request.headers = collect_headers(event.headers());

    if let Some(params) = event.query_string_parameters_ref() {
        for (name, value) in params.iter() {
            request
                .query
                .entry(name.to_string())
                .or_insert_with(|| value.to_string());
        }
    }

    request.body = body_text(event.body().as_ref())?;
    Ok(request)
}
