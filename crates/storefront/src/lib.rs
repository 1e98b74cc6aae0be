//! Helix Research Storefront library.
//!
//! This crate provides the storefront functionality as a library, allowing
//! the router to be built by the binary and driven directly by tests.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod visitor_storage;

use axum::{
    Router,
    extract::Request,
    middleware::{from_fn, from_fn_with_state},
    routing::get,
};
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::error::AppError;
use crate::state::AppState;

/// Build the full storefront application.
///
/// Layers, outermost first: crawler tagging, Sentry, request tracing,
/// request id, sessions, the 404 page.
pub fn app(state: AppState) -> Router {
    let session_layer = middleware::create_session_layer(state.config());

    Router::new()
        .route("/health", get(health))
        .merge(routes::routes())
        .nest_service("/static", ServeDir::new("crates/storefront/static"))
        .fallback(not_found)
        .layer(from_fn_with_state(
            state.clone(),
            middleware::not_found_middleware,
        ))
        .layer(session_layer)
        .layer(from_fn(middleware::request_id_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = tracing::field::Empty,
            )
        }))
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
        // Crawler headers are applied last so they win over handler defaults
        .layer(from_fn(middleware::crawler_middleware))
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

async fn not_found(request: Request) -> AppError {
    AppError::NotFound(format!("page {}", request.uri().path()))
}
