//! Request ID middleware for log and error correlation.
//!
//! An upstream proxy (CDN, load balancer) may already have assigned an
//! `x-request-id`; otherwise a UUID v4 is generated. The id is recorded on the
//! request's tracing span, tagged on the Sentry scope, stored in request
//! extensions for handlers and echoed on the response.

use axum::{
    extract::{FromRequestParts, Request},
    http::{HeaderValue, request::Parts},
    middleware::Next,
    response::Response,
};
use tracing::Span;
use uuid::Uuid;

/// The HTTP header name for request IDs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest upstream id accepted verbatim.
const MAX_UPSTREAM_ID_LEN: usize = 128;

/// The current request's id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestId(pub String);

impl RequestId {
    /// Reuse a well-formed upstream id or mint a new one.
    fn from_upstream(value: Option<&str>) -> Self {
        value
            .map(str::trim)
            .filter(|v| !v.is_empty() && v.len() <= MAX_UPSTREAM_ID_LEN)
            .filter(|v| v.chars().all(|c| c.is_ascii_graphic()))
            .map_or_else(|| Self(Uuid::new_v4().to_string()), |v| Self(v.to_string()))
    }
}

/// Middleware that ensures every request carries a request id.
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let request_id = RequestId::from_upstream(
        request
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|h| h.to_str().ok()),
    );

    Span::current().record("request_id", request_id.0.as_str());
    sentry::configure_scope(|scope| {
        scope.set_tag("request_id", &request_id.0);
    });

    request.extensions_mut().insert(request_id.clone());
    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(&request_id.0) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}

impl<S> FromRequestParts<S> for RequestId
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<Self>()
            .cloned()
            .unwrap_or_else(|| Self(String::new())))
    }
}
