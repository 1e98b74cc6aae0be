//! Edge middleware tagging responses served to known crawlers.
//!
//! Link-preview bots and search engines get a cacheable, explicitly tagged
//! response. Ordinary visitors are passed through untouched.

use axum::{
    extract::Request,
    http::{
        HeaderMap, HeaderName, HeaderValue,
        header::{CACHE_CONTROL, CONTENT_TYPE, USER_AGENT, VARY},
    },
    middleware::Next,
    response::Response,
};
use helix_research_core::crawler::{CRAWLER_CACHE_MAX_AGE, classify};

/// Response header carrying the crawler label.
pub const CRAWLER_TYPE_HEADER: HeaderName = HeaderName::from_static("x-crawler-type");

const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// Classify the request by `User-Agent` and, for known crawlers, add:
///
/// - `X-Crawler-Type: <label>`
/// - `Cache-Control: public, max-age=3600`
/// - `Content-Type: text/html; charset=utf-8` when the body is markup
/// - `Vary: User-Agent`, so shared caches keep crawler and visitor responses apart
///
/// The body is never modified.
pub async fn crawler_middleware(request: Request, next: Next) -> Response {
    let label = request
        .headers()
        .get(USER_AGENT)
        .and_then(|h| h.to_str().ok())
        .and_then(classify);

    let mut response = next.run(request).await;

    if let Some(label) = label {
        tracing::debug!(crawler = label, "Serving crawler response");
        tag_crawler_response(response.headers_mut(), label);
    }

    response
}

fn tag_crawler_response(headers: &mut HeaderMap, label: &'static str) {
    headers.insert(CRAWLER_TYPE_HEADER, HeaderValue::from_static(label));

    headers.insert(
        CACHE_CONTROL,
        HeaderValue::from_str(&format!("public, max-age={CRAWLER_CACHE_MAX_AGE}"))
            .unwrap_or_else(|_| HeaderValue::from_static("public")),
    );

    let is_html = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.trim_start().to_ascii_lowercase().starts_with("text/html"));
    if is_html {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(HTML_CONTENT_TYPE));
    }

    let varies_on_user_agent = headers.get_all(VARY).iter().any(|v| {
        v.to_str().is_ok_and(|v| {
            v.split(',')
                .any(|part| part.trim().eq_ignore_ascii_case("user-agent") || part.trim() == "*")
        })
    });
    if !varies_on_user_agent {
        headers.append(VARY, HeaderValue::from_static("User-Agent"));
    }
}
