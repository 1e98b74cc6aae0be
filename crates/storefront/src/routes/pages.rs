//! Legal page route handlers.
//!
//! Terms of sale, privacy and cookie policies, and the research-use
//! statement. The overlays link to these, so they render the same shell as
//! every other page.

use askama::Template;
use askama_web::WebTemplate;
use axum::{Router, response::IntoResponse, routing::get};
use tracing::instrument;

use crate::filters;
use crate::middleware::PageContext;
use crate::state::AppState;

/// Which legal document to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegalPage {
    Terms,
    Privacy,
    Cookies,
    ResearchUse,
}

impl LegalPage {
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Terms => "Terms of Sale",
            Self::Privacy => "Privacy Policy",
            Self::Cookies => "Cookie Policy",
            Self::ResearchUse => "Research Use Only",
        }
    }
}

/// Legal page template.
#[derive(Template, WebTemplate)]
#[template(path = "pages/legal.html")]
pub struct LegalPageTemplate {
    pub page: PageContext,
    pub kind: LegalPage,
}

fn render(page: PageContext, kind: LegalPage) -> LegalPageTemplate {
    LegalPageTemplate { page, kind }
}

/// Display the Terms of Sale page.
#[instrument(skip_all)]
pub async fn terms(page: PageContext) -> impl IntoResponse {
    render(page, LegalPage::Terms)
}

/// Display the Privacy Policy page.
#[instrument(skip_all)]
pub async fn privacy(page: PageContext) -> impl IntoResponse {
    render(page, LegalPage::Privacy)
}

/// Display the Cookie Policy page.
#[instrument(skip_all)]
pub async fn cookies(page: PageContext) -> impl IntoResponse {
    render(page, LegalPage::Cookies)
}

/// Display the Research Use Only statement.
#[instrument(skip_all)]
pub async fn research_use(page: PageContext) -> impl IntoResponse {
    render(page, LegalPage::ResearchUse)
}

/// Create the pages routes router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/terms", get(terms))
        .route("/privacy", get(privacy))
        .route("/cookies", get(cookies))
        .route("/research-use", get(research_use))
}
