//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use helix_research_core::{CartError, CatalogError};
use thiserror::Error;

use crate::middleware::MissingPage;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Session store read or write failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Cart mutation was rejected.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::NotFound(id) => Self::NotFound(format!("product {id}")),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if matches!(self, Self::Session(_) | Self::Internal(_)) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = match &self {
            Self::Session(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Cart(err) => match err {
                CartError::ItemNotFound(_) => StatusCode::NOT_FOUND,
                CartError::InvalidQuantity | CartError::QuantityOverflow(_) => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        };

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Session(_) | Self::Internal(_) => "Internal server error".to_string(),
            Self::Cart(err) => err.to_string(),
            _ => self.to_string(),
        };

        let mut response = (status, message).into_response();
        // The not-found layer swaps this for the full page with overlays
        if let Self::NotFound(what) = self {
            response.extensions_mut().insert(MissingPage(what));
        }
        response
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Add a breadcrumb for visitor actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added to cart", Some(&[("product_id", "bpc-157")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use helix_research_core::ProductId;

    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product bpc-999".to_string());
        assert_eq!(err.to_string(), "Not found: product bpc-999");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(AppError::Cart(CartError::InvalidQuantity)),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn test_cart_item_not_found_is_404() {
        let id = ProductId::parse("tb-500").unwrap();
        assert_eq!(
            get_status(AppError::Cart(CartError::ItemNotFound(id))),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_not_found_marks_response_for_page() {
        let response = AppError::NotFound("product nope".to_string()).into_response();
        assert_eq!(
            response.extensions().get::<MissingPage>(),
            Some(&MissingPage("product nope".to_string()))
        );

        let response = AppError::BadRequest("bad".to_string()).into_response();
        assert!(response.extensions().get::<MissingPage>().is_none());
    }

    #[test]
    fn test_catalog_not_found_maps_to_not_found() {
        let err = AppError::from(CatalogError::NotFound("nope".to_string()));
        assert!(matches!(err, AppError::NotFound(msg) if msg == "product nope"));
    }
}
