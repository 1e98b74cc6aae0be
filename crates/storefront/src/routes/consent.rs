//! Cookie consent route handlers.
//!
//! The banner posts one of three decisions (or a close) as a plain form and
//! is redirected back to the page it was shown on. Decisions are stored in
//! the visitor's session through [`ConsentManager`], which also appends the
//! audit record.

use axum::{
    Form, Json,
    http::{
        HeaderMap, HeaderValue,
        header::{ACCEPT_LANGUAGE, SET_COOKIE, USER_AGENT},
    },
    response::{AppendHeaders, IntoResponse, Redirect},
};
use chrono::Utc;
use helix_research_core::KeyValueStore;
use helix_research_core::consent::{
    CONSENT_DATE_KEY, ConsentContext, ConsentDecision, ConsentManager, ConsentPreferences,
    ConsentRecord, ConsentState,
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{Result, add_breadcrumb};
use crate::middleware::page_context::{CONSENT_CLOSED_SET_COOKIE, consent_banner_closed};
use crate::visitor_storage;

const DEFAULT_LOCALE: &str = "en-US";
const DEFAULT_TIMEZONE: &str = "UTC";

/// Consent banner form data.
///
/// Checkboxes are only submitted when ticked, so the category fields are
/// optional.
#[derive(Debug, Default, Deserialize)]
pub struct ConsentForm {
    pub timezone: Option<String>,
    pub return_to: Option<String>,
    pub analytics: Option<String>,
    pub marketing: Option<String>,
}

/// Response body for `GET /api/consent`.
#[derive(Debug, Serialize)]
pub struct ConsentStatus {
    pub state: ConsentState,
    pub preferences: ConsentPreferences,
    pub banner_visible: bool,
    pub decided_at: Option<String>,
}

// =============================================================================
// Request context
// =============================================================================

/// Only same-site paths are followed after a decision.
///
/// Browsers read `/\host` as `//host`, and drop tabs and newlines from
/// URLs, so both are refused along with protocol-relative paths.
#[must_use]
pub fn safe_return_to(return_to: Option<&str>) -> &str {
    match return_to {
        Some(path)
            if path.starts_with('/')
                && !matches!(path.as_bytes().get(1), Some(b'/' | b'\\'))
                && !path.chars().any(char::is_control) =>
        {
            path
        }
        _ => "/",
    }
}

/// First language tag of `Accept-Language`, without its quality value.
fn primary_locale(headers: &HeaderMap) -> String {
    headers
        .get(ACCEPT_LANGUAGE)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.split(',').next())
        .and_then(|tag| tag.split(';').next())
        .map(str::trim)
        .filter(|tag| !tag.is_empty() && *tag != "*")
        .map_or_else(|| DEFAULT_LOCALE.to_string(), str::to_string)
}

fn checkbox(value: Option<&String>) -> bool {
    value.is_some_and(|v| matches!(v.as_str(), "on" | "true" | "1" | "yes"))
}

fn consent_context(headers: &HeaderMap, form: &ConsentForm) -> ConsentContext {
    ConsentContext {
        user_agent: headers
            .get(USER_AGENT)
            .and_then(|h| h.to_str().ok())
            .unwrap_or_default()
            .to_string(),
        locale: primary_locale(headers),
        timezone: form
            .timezone
            .as_deref()
            .map(str::trim)
            .filter(|tz| !tz.is_empty())
            .unwrap_or(DEFAULT_TIMEZONE)
            .to_string(),
        page_path: safe_return_to(form.return_to.as_deref()).to_string(),
    }
}

// =============================================================================
// Decisions
// =============================================================================

async fn decide(
    session: &Session,
    headers: &HeaderMap,
    form: &ConsentForm,
    decision: ConsentDecision,
) -> Result<Redirect> {
    let context = consent_context(headers, form);
    let return_to = context.page_path.clone();

    let mut storage = visitor_storage::load(session).await?;
    let record = {
        let mut consent = ConsentManager::load(&mut storage);
        match decision {
            ConsentDecision::AcceptAll => consent.accept_all(context, Utc::now()),
            ConsentDecision::AcceptSelected => {
                consent.set_analytics(checkbox(form.analytics.as_ref()));
                consent.set_marketing(checkbox(form.marketing.as_ref()));
                consent.accept_selected(context, Utc::now())
            }
            ConsentDecision::RejectAll => consent.reject_all(context, Utc::now()),
        }
    };
    visitor_storage::commit(session, &mut storage).await?;

    tracing::info!(
        ?decision,
        analytics = record.preferences.analytics,
        marketing = record.preferences.marketing,
        "Cookie consent recorded"
    );
    add_breadcrumb("consent", "Cookie consent recorded", None);

    Ok(Redirect::to(&return_to))
}

/// Accept every tracking category.
#[instrument(skip_all)]
pub async fn accept_all(
    session: Session,
    headers: HeaderMap,
    Form(form): Form<ConsentForm>,
) -> Result<Redirect> {
    decide(&session, &headers, &form, ConsentDecision::AcceptAll).await
}

/// Accept the ticked categories.
#[instrument(skip_all)]
pub async fn accept_selected(
    session: Session,
    headers: HeaderMap,
    Form(form): Form<ConsentForm>,
) -> Result<Redirect> {
    decide(&session, &headers, &form, ConsentDecision::AcceptSelected).await
}

/// Refuse every optional category.
#[instrument(skip_all)]
pub async fn reject_all(
    session: Session,
    headers: HeaderMap,
    Form(form): Form<ConsentForm>,
) -> Result<Redirect> {
    decide(&session, &headers, &form, ConsentDecision::RejectAll).await
}

/// Hide the banner for the rest of the visit without storing a decision.
#[instrument(skip_all)]
pub async fn close(Form(form): Form<ConsentForm>) -> impl IntoResponse {
    (
        AppendHeaders([(
            SET_COOKIE,
            HeaderValue::from_static(CONSENT_CLOSED_SET_COOKIE),
        )]),
        Redirect::to(safe_return_to(form.return_to.as_deref())),
    )
}

// =============================================================================
// JSON API
// =============================================================================

/// Current consent state.
#[instrument(skip_all)]
pub async fn status(session: Session, headers: HeaderMap) -> Result<Json<ConsentStatus>> {
    let mut storage = visitor_storage::load(&session).await?;
    let decided_at = storage.get(CONSENT_DATE_KEY);

    let mut consent = ConsentManager::load(&mut storage);
    if consent_banner_closed(&headers) {
        consent.close_banner();
    }

    Ok(Json(ConsentStatus {
        state: consent.state(),
        preferences: consent.preferences(),
        banner_visible: consent.banner_visible(),
        decided_at,
    }))
}

/// The visitor's consent audit log, oldest first.
#[instrument(skip_all)]
pub async fn records(session: Session) -> Result<Json<Vec<ConsentRecord>>> {
    let mut storage = visitor_storage::load(&session).await?;
    let consent = ConsentManager::load(&mut storage);
    Ok(Json(consent.records()))
}
