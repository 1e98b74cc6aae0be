//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::instrument;

use crate::filters;
use crate::middleware::PageContext;
use crate::routes::products::ProductView;
use crate::state::AppState;

/// Products highlighted under the hero.
const FEATURED_COUNT: usize = 4;

/// A category tile linking to the filtered listing.
#[derive(Clone)]
pub struct CategoryLink {
    pub label: String,
    pub count: usize,
}

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub page: PageContext,
    pub featured_products: Vec<ProductView>,
    pub categories: Vec<CategoryLink>,
}

/// Display the home page.
#[instrument(skip(state, page))]
pub async fn home(State(state): State<AppState>, page: PageContext) -> impl IntoResponse {
    let catalog = state.catalog();

    let categories = catalog
        .categories()
        .into_iter()
        .map(|label| CategoryLink {
            label: label.to_string(),
            count: catalog.in_category(label).count(),
        })
        .collect();

    HomeTemplate {
        page,
        featured_products: catalog
            .featured(FEATURED_COUNT)
            .iter()
            .map(ProductView::from)
            .collect(),
        categories,
    }
}
