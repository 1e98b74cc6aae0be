//! Shared helpers for router-level tests.
//!
//! [`TestClient`] drives one storefront [`Router`] with `oneshot` and carries
//! cookies between requests the way a browser would, so session-backed state
//! (cart, consent, age gate, terms) persists across calls.

#![allow(dead_code, clippy::unwrap_used)]

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{HeaderMap, Request, StatusCode, header},
};
use helix_research_core::Catalog;
use helix_research_storefront::{app, config::StorefrontConfig, state::AppState};
use tower::ServiceExt;

pub const BROWSER_UA: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0 Safari/537.36";

/// A response with its body read.
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn location(&self) -> Option<&str> {
        self.header("location")
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).unwrap()
    }
}

/// One simulated visitor.
pub struct TestClient {
    app: Router,
    cookies: Vec<(String, String)>,
}

impl TestClient {
    pub fn new() -> Self {
        Self::with_config(StorefrontConfig::local())
    }

    pub fn with_config(config: StorefrontConfig) -> Self {
        let state = AppState::new(config, Catalog::builtin().unwrap());
        Self {
            app: app(state),
            cookies: Vec::new(),
        }
    }

    /// A second visitor sharing this client's server (and session store).
    pub fn fresh_visitor(&self) -> Self {
        Self {
            app: self.app.clone(),
            cookies: Vec::new(),
        }
    }

    pub fn has_cookie(&self, name: &str) -> bool {
        self.cookies.iter().any(|(n, _)| n == name)
    }

    pub async fn get(&mut self, uri: &str) -> TestResponse {
        let request = self.request("GET", uri).body(Body::empty()).unwrap();
        self.send(request).await
    }

    /// GET with extra headers, replacing defaults such as `User-Agent`.
    pub async fn get_with(&mut self, uri: &str, headers: &[(&str, &str)]) -> TestResponse {
        let mut request = self.request("GET", uri).body(Body::empty()).unwrap();
        override_headers(&mut request, headers);
        self.send(request).await
    }

    pub async fn post_form(&mut self, uri: &str, form: &[(&str, &str)]) -> TestResponse {
        self.post_form_with(uri, form, &[]).await
    }

    pub async fn post_form_with(
        &mut self,
        uri: &str,
        form: &[(&str, &str)],
        headers: &[(&str, &str)],
    ) -> TestResponse {
        let body = form
            .iter()
            .map(|(k, v)| format!("{}={}", encode(k), encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        let mut request = self
            .request("POST", uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap();
        override_headers(&mut request, headers);
        self.send(request).await
    }

    fn request(&self, method: &str, uri: &str) -> axum::http::request::Builder {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::USER_AGENT, BROWSER_UA);
        if !self.cookies.is_empty() {
            let cookie = self
                .cookies
                .iter()
                .map(|(n, v)| format!("{n}={v}"))
                .collect::<Vec<_>>()
                .join("; ");
            builder = builder.header(header::COOKIE, cookie);
        }
        builder
    }

    async fn send(&mut self, request: Request<Body>) -> TestResponse {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();

        for set_cookie in headers.get_all(header::SET_COOKIE) {
            let Some(pair) = set_cookie.to_str().unwrap().split(';').next() else {
                continue;
            };
            let Some((name, value)) = pair.trim().split_once('=') else {
                continue;
            };
            self.cookies.retain(|(n, _)| n != name);
            self.cookies.push((name.to_string(), value.to_string()));
        }

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        TestResponse {
            status,
            headers,
            body: String::from_utf8(bytes.to_vec()).unwrap(),
        }
    }
}

fn override_headers(request: &mut Request<Body>, headers: &[(&str, &str)]) {
    for (name, value) in headers {
        request.headers_mut().insert(
            header::HeaderName::from_bytes(name.as_bytes()).unwrap(),
            header::HeaderValue::from_str(value).unwrap(),
        );
    }
}

/// Minimal `application/x-www-form-urlencoded` encoding.
fn encode(value: &str) -> String {
    value
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                char::from(b).to_string()
            }
            b' ' => "+".to_string(),
            _ => format!("%{b:02X}"),
        })
        .collect()
}
