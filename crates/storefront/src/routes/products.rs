//! Product route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use helix_research_core::{ChemicalProfile, Product};
use serde::Deserialize;
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::middleware::PageContext;
use crate::state::AppState;

/// Related products shown under a product detail page.
const RELATED_LIMIT: usize = 3;

/// Product display data for templates.
#[derive(Clone)]
pub struct ProductView {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: String,
    pub image: String,
    pub category: String,
    pub chemical: ChemicalProfile,
}

impl From<&Product> for ProductView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price.display(),
            image: product.image.clone(),
            category: product.category.clone(),
            chemical: product.chemical.clone(),
        }
    }
}

/// A category tab on the listing page.
#[derive(Clone)]
pub struct CategoryFilter {
    pub label: String,
    pub selected: bool,
}

/// Listing filter.
#[derive(Debug, Deserialize)]
pub struct CategoryQuery {
    pub category: Option<String>,
}

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub page: PageContext,
    pub products: Vec<ProductView>,
    pub categories: Vec<CategoryFilter>,
    pub selected_category: Option<String>,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub page: PageContext,
    pub product: ProductView,
    pub related_products: Vec<ProductView>,
}

/// Display product listing page.
///
/// An unknown category yields an empty listing rather than an error.
#[instrument(skip(state, page))]
pub async fn index(
    State(state): State<AppState>,
    page: PageContext,
    Query(query): Query<CategoryQuery>,
) -> impl IntoResponse {
    let catalog = state.catalog();
    let selected_category = query.category.filter(|c| !c.trim().is_empty());

    let products = match &selected_category {
        Some(category) => catalog
            .in_category(category)
            .map(ProductView::from)
            .collect(),
        None => catalog.iter().map(ProductView::from).collect(),
    };

    ProductsIndexTemplate {
        page,
        products,
        categories: catalog
            .categories()
            .into_iter()
            .map(|label| CategoryFilter {
                label: label.to_string(),
                selected: selected_category
                    .as_deref()
                    .is_some_and(|c| c.eq_ignore_ascii_case(label)),
            })
            .collect(),
        selected_category,
    }
}

/// Display product detail page.
///
/// # Errors
///
/// Returns `AppError::NotFound` (rendered as a 404 page) for an unknown id.
#[instrument(skip(state, page))]
pub async fn show(
    State(state): State<AppState>,
    page: PageContext,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let catalog = state.catalog();
    let product = catalog.get(&id)?;

    let related_products = catalog
        .in_category(&product.category)
        .filter(|p| p.id != product.id)
        .take(RELATED_LIMIT)
        .map(ProductView::from)
        .collect();

    Ok(ProductShowTemplate {
        page,
        product: ProductView::from(product),
        related_products,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use helix_research_core::Catalog;

    use super::*;

    #[test]
    fn test_product_view_formats_price() {
        let catalog = Catalog::builtin().unwrap();
        let view = ProductView::from(catalog.get("bpc-157").unwrap());
        assert_eq!(view.id, "bpc-157");
        assert_eq!(view.price, "$49.99");
        assert_eq!(view.category, "Peptides");
    }
}
