//! Cart route handlers.
//!
//! Cart operations use HTMX for dynamic updates without full page reloads.
//! Plain form posts (no `HX-Request` header) are redirected back to the cart
//! page instead. The cart itself lives in the visitor's session.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::HeaderMap,
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use helix_research_core::cart::CartEvent;
use helix_research_core::{CartStore, ProductId};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::middleware::PageContext;
use crate::state::AppState;
use crate::visitor_storage;

/// Event name HTMX listens for to refresh the cart badge.
const CART_UPDATED_TRIGGER: &str = "cart-updated";

/// Cart item display data for templates.
#[derive(Clone)]
pub struct CartItemView {
    pub product_id: String,
    pub name: String,
    pub quantity: u32,
    pub price: String,
    pub line_price: String,
}

/// Cart display data for templates.
#[derive(Clone)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub subtotal: String,
    pub item_count: u32,
}

impl From<&CartStore> for CartView {
    fn from(cart: &CartStore) -> Self {
        Self {
            items: cart
                .items()
                .iter()
                .map(|item| CartItemView {
                    product_id: item.product_id.to_string(),
                    name: item.name.clone(),
                    quantity: item.quantity,
                    price: item.unit_price.display(),
                    line_price: item.line_total().display(),
                })
                .collect(),
            subtotal: cart.total_price().display(),
            item_count: cart.item_count(),
        }
    }
}

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: String,
    pub quantity: Option<u32>,
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub product_id: String,
    pub quantity: u32,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub product_id: String,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub page: PageContext,
    pub cart: CartView,
    pub checkout_available: bool,
}

/// Cart items fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate {
    pub cart: CartView,
    pub checkout_available: bool,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

// =============================================================================
// Helpers
// =============================================================================

/// Whether the request was issued by HTMX.
#[must_use]
pub fn is_htmx(headers: &HeaderMap) -> bool {
    headers.contains_key("HX-Request")
}

fn parse_product_id(raw: &str) -> Result<ProductId> {
    ProductId::parse(raw).map_err(|e| AppError::BadRequest(e.to_string()))
}

/// Load the cart with a listener that logs every change.
async fn load_tracked_cart(session: &Session) -> Result<CartStore> {
    let mut cart = visitor_storage::load_cart(session).await?;
    cart.subscribe(|event, summary| {
        match event {
            CartEvent::ItemAdded { product_id, added } => {
                tracing::debug!(%product_id, added, "Cart item added");
            }
            CartEvent::ItemRemoved { product_id } => {
                tracing::debug!(%product_id, "Cart item removed");
            }
            CartEvent::QuantityUpdated {
                product_id,
                quantity,
            } => tracing::debug!(%product_id, quantity, "Cart quantity updated"),
            CartEvent::Cleared => tracing::debug!("Cart cleared"),
        }
        tracing::debug!(
            item_count = summary.item_count,
            total = %summary.total,
            "Cart totals"
        );
    });
    Ok(cart)
}

/// Respond to a mutation of the cart page: the items fragment for HTMX,
/// otherwise a redirect back to `/cart`.
fn items_response(headers: &HeaderMap, state: &AppState, cart: &CartStore) -> Response {
    if is_htmx(headers) {
        (
            AppendHeaders([("HX-Trigger", CART_UPDATED_TRIGGER)]),
            CartItemsTemplate {
                cart: CartView::from(cart),
                checkout_available: state.config().checkout_url.is_some(),
            },
        )
            .into_response()
    } else {
        Redirect::to("/cart").into_response()
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Display cart page.
#[instrument(skip(state, session, page))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    page: PageContext,
) -> Result<impl IntoResponse> {
    let cart = visitor_storage::load_cart(&session).await?;

    Ok(CartShowTemplate {
        page,
        cart: CartView::from(&cart),
        checkout_available: state.config().checkout_url.is_some(),
    })
}

/// Add item to cart.
///
/// Returns the updated count badge with an HTMX trigger so other cart
/// elements refresh.
///
/// # Errors
///
/// Returns 404 for an unknown product and 422 for a zero quantity.
#[instrument(skip(state, session, headers))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<AddToCartForm>,
) -> Result<Response> {
    let product = state.catalog().get(&form.product_id)?;
    let quantity = form.quantity.unwrap_or(1);

    let mut cart = load_tracked_cart(&session).await?;
    cart.add_item(product, quantity)?;
    visitor_storage::save_cart(&session, &cart).await?;

    add_breadcrumb(
        "cart",
        "Added to cart",
        Some(&[("product_id", product.id.as_str())]),
    );

    if is_htmx(&headers) {
        return Ok((
            AppendHeaders([("HX-Trigger", CART_UPDATED_TRIGGER)]),
            CartCountTemplate {
                count: cart.item_count(),
            },
        )
            .into_response());
    }
    Ok(Redirect::to("/cart").into_response())
}

/// Update cart item quantity. A quantity of zero removes the line.
///
/// # Errors
///
/// Returns 404 if the product is not in the cart.
#[instrument(skip(state, session, headers))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<UpdateCartForm>,
) -> Result<Response> {
    let product_id = parse_product_id(&form.product_id)?;

    let mut cart = load_tracked_cart(&session).await?;
    cart.update_quantity(&product_id, form.quantity)?;
    visitor_storage::save_cart(&session, &cart).await?;

    Ok(items_response(&headers, &state, &cart))
}

/// Remove item from cart. Removing a product that is not in the cart is a
/// no-op.
#[instrument(skip(state, session, headers))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<RemoveFromCartForm>,
) -> Result<Response> {
    let product_id = parse_product_id(&form.product_id)?;

    let mut cart = load_tracked_cart(&session).await?;
    if cart.remove_item(&product_id) {
        visitor_storage::save_cart(&session, &cart).await?;
    }

    Ok(items_response(&headers, &state, &cart))
}

/// Empty the cart.
#[instrument(skip(state, session, headers))]
pub async fn clear(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
) -> Result<Response> {
    let mut cart = load_tracked_cart(&session).await?;
    cart.clear();
    visitor_storage::save_cart(&session, &cart).await?;

    Ok(items_response(&headers, &state, &cart))
}

/// Get cart count badge (HTMX).
#[instrument(skip(session))]
pub async fn count(session: Session) -> Result<impl IntoResponse> {
    let cart = visitor_storage::load_cart(&session).await?;
    Ok(CartCountTemplate {
        count: cart.item_count(),
    })
}

/// Hand the visitor off to the payment provider.
///
/// An empty cart, or a storefront without a configured checkout, goes back
/// to the cart page.
#[instrument(skip(state, session))]
pub async fn checkout(State(state): State<AppState>, session: Session) -> Result<Redirect> {
    let cart = visitor_storage::load_cart(&session).await?;
    if cart.is_empty() {
        return Ok(Redirect::to("/cart"));
    }

    match &state.config().checkout_url {
        Some(url) => {
            tracing::info!(items = cart.item_count(), "Redirecting to checkout");
            Ok(Redirect::to(url))
        }
        None => {
            tracing::warn!("Checkout requested but STOREFRONT_CHECKOUT_URL is not set");
            Ok(Redirect::to("/cart"))
        }
    }
}
