//! Full-page 404 rendering.
//!
//! Handlers and the router fallback return `AppError::NotFound`, which only
//! marks the response with [`MissingPage`]. This layer sits inside the
//! session layer and replaces marked responses with the site's 404 page, so a
//! visitor landing on a missing URL still gets the age gate, terms banner and
//! consent banner.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tower_sessions::Session;

use super::page_context::PageContext;
use crate::filters;
use crate::routes::cart::is_htmx;
use crate::state::AppState;

/// Response extension naming what could not be found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingPage(pub String);

/// 404 page template.
#[derive(Template, WebTemplate)]
#[template(path = "errors/not_found.html")]
pub struct NotFoundTemplate {
    pub page: PageContext,
    pub what: String,
}

/// Render marked 404 responses as a page. HTMX requests keep the plain body.
pub async fn not_found_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let htmx = is_htmx(request.headers());
    let session = request.extensions().get::<Session>().cloned();
    let headers = request.headers().clone();
    let path = request.uri().path().to_string();

    let mut response = next.run(request).await;
    if htmx {
        return response;
    }
    let Some(MissingPage(what)) = response.extensions_mut().remove::<MissingPage>() else {
        return response;
    };

    let page = match session {
        Some(session) => PageContext::load(&session, &headers, &path, &state)
            .await
            .unwrap_or_else(|err| {
                tracing::warn!(error = %err, "Rendering 404 without visitor state");
                PageContext::anonymous(&path)
            }),
        None => PageContext::anonymous(&path),
    };

    (StatusCode::NOT_FOUND, NotFoundTemplate { page, what }).into_response()
}
