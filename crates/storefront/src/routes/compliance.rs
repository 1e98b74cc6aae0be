//! Age gate and terms banner route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    http::StatusCode,
    response::{IntoResponse, Redirect},
};
use chrono::Utc;
use helix_research_core::compliance::{AgeGate, TermsBanner};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{Result, add_breadcrumb};
use crate::filters;
use crate::routes::consent::safe_return_to;
use crate::visitor_storage;

/// Overlay form data.
#[derive(Debug, Default, Deserialize)]
pub struct OverlayForm {
    pub return_to: Option<String>,
}

/// Shown in place of the site after the visitor declines the age gate.
#[derive(Template, WebTemplate)]
#[template(path = "errors/restricted.html")]
pub struct RestrictedTemplate;

/// Confirm the visitor is of legal age.
#[instrument(skip_all)]
pub async fn confirm_age(
    session: Session,
    Form(form): Form<OverlayForm>,
) -> Result<Redirect> {
    let mut storage = visitor_storage::load(&session).await?;
    let outcome = AgeGate::load(&mut storage).confirm(Utc::now());
    visitor_storage::commit(&session, &mut storage).await?;

    tracing::info!(?outcome, "Age gate answered");
    add_breadcrumb("compliance", "Age verified", None);

    Ok(Redirect::to(safe_return_to(form.return_to.as_deref())))
}

/// Refuse entry. Nothing is stored, so the gate asks again next visit.
#[instrument(skip_all)]
pub async fn deny_age(session: Session) -> Result<impl IntoResponse> {
    let mut storage = visitor_storage::load(&session).await?;
    let outcome = AgeGate::load(&mut storage).deny();
    tracing::info!(?outcome, "Age gate answered");

    Ok((StatusCode::FORBIDDEN, RestrictedTemplate))
}

/// Accept the research-use terms of sale.
#[instrument(skip_all)]
pub async fn accept_terms(
    session: Session,
    Form(form): Form<OverlayForm>,
) -> Result<Redirect> {
    let mut storage = visitor_storage::load(&session).await?;
    TermsBanner::load(&mut storage).accept(Utc::now());
    visitor_storage::commit(&session, &mut storage).await?;

    tracing::info!("Terms accepted");
    add_breadcrumb("compliance", "Terms accepted", None);

    Ok(Redirect::to(safe_return_to(form.return_to.as_deref())))
}
