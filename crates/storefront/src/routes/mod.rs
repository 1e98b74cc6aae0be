//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Home page
//! GET  /health                 - Health check
//!
//! # Products
//! GET  /products               - Product listing (?category=)
//! GET  /products/{id}          - Product detail
//!
//! # Cart (HTMX fragments, redirects for plain forms)
//! GET  /cart                   - Cart page
//! POST /cart/add               - Add to cart (returns count badge, triggers cart-updated)
//! POST /cart/update            - Update quantity (returns cart_items fragment)
//! POST /cart/remove            - Remove item (returns cart_items fragment)
//! POST /cart/clear             - Empty the cart (returns cart_items fragment)
//! GET  /cart/count             - Cart count badge (fragment)
//!
//! # Checkout
//! GET  /checkout               - Redirect to the payment provider
//!
//! # Consent
//! POST /consent/accept-all     - Accept every category
//! POST /consent/accept-selected - Accept ticked categories
//! POST /consent/reject-all     - Necessary only
//! POST /consent/close          - Hide the banner for this visit
//! GET  /api/consent            - Consent state (JSON)
//! GET  /api/consent/records    - Consent audit log (JSON)
//!
//! # Compliance
//! POST /age-gate/confirm       - Age confirmed
//! POST /age-gate/deny          - Age declined (403 page)
//! POST /terms/accept           - Terms accepted
//!
//! # Legal pages
//! GET  /pages/terms | /pages/privacy | /pages/cookies | /pages/research-use
//! ```

pub mod cart;
pub mod compliance;
pub mod consent;
pub mod home;
pub mod pages;
pub mod products;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
        .route("/count", get(cart::count))
}

/// Create the consent banner routes router.
pub fn consent_routes() -> Router<AppState> {
    Router::new()
        .route("/accept-all", post(consent::accept_all))
        .route("/accept-selected", post(consent::accept_selected))
        .route("/reject-all", post(consent::reject_all))
        .route("/close", post(consent::close))
}

/// Create the consent JSON API router.
pub fn consent_api_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(consent::status))
        .route("/records", get(consent::records))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Home page
        .route("/", get(home::home))
        // Product routes
        .nest("/products", product_routes())
        // Cart routes
        .nest("/cart", cart_routes())
        // Checkout redirect
        .route("/checkout", get(cart::checkout))
        // Compliance overlays
        .nest("/consent", consent_routes())
        .route("/age-gate/confirm", post(compliance::confirm_age))
        .route("/age-gate/deny", post(compliance::deny_age))
        .route("/terms/accept", post(compliance::accept_terms))
        // JSON API
        .nest("/api/consent", consent_api_routes())
        // Legal pages
        .nest("/pages", pages::router())
}
