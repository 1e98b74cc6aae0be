//! Per-request page context extractor.
//!
//! Every HTML page renders the compliance overlays and the cart badge, so
//! page handlers take a [`PageContext`] that reads the visitor's stored state
//! once per request.

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header::COOKIE, request::Parts},
};
use helix_research_core::compliance::{AgeGate, TermsBanner};
use helix_research_core::consent::{ConsentManager, ConsentPreferences};
use tower_sessions::Session;

use crate::error::AppError;
use crate::state::AppState;
use crate::visitor_storage;

/// Session-scoped cookie remembering that the consent banner was closed
/// without a decision. It has no `Max-Age`, so the browser drops it when the
/// visit ends and the banner comes back.
pub const CONSENT_CLOSED_COOKIE: &str = "consent_banner_closed";

/// `Set-Cookie` value for [`CONSENT_CLOSED_COOKIE`].
pub const CONSENT_CLOSED_SET_COOKIE: &str = "consent_banner_closed=1; Path=/; SameSite=Lax; HttpOnly";

/// What the page shell needs to know about the visitor.
#[derive(Debug, Clone)]
pub struct PageContext {
    /// Path of the page being rendered, used as the overlays' `return_to`.
    pub path: String,
    pub show_age_gate: bool,
    pub show_terms_banner: bool,
    pub show_consent_banner: bool,
    pub consent: ConsentPreferences,
    pub cart_count: u32,
    /// GA4 id, present only when configured and the visitor allowed analytics.
    pub analytics_id: Option<String>,
}

impl PageContext {
    /// Context for a visitor with nothing stored.
    #[must_use]
    pub fn anonymous(path: &str) -> Self {
        Self {
            path: path.to_string(),
            show_age_gate: true,
            show_terms_banner: true,
            show_consent_banner: true,
            consent: ConsentPreferences::NECESSARY_ONLY,
            cart_count: 0,
            analytics_id: None,
        }
    }
}

/// Whether the request carries the "banner closed this visit" cookie.
#[must_use]
pub fn consent_banner_closed(headers: &HeaderMap) -> bool {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .flat_map(|h| h.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .any(|(name, value)| name == CONSENT_CLOSED_COOKIE && value == "1")
}

impl PageContext {
    /// Read the visitor's stored state for a page at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store cannot be read.
    pub async fn load(
        session: &Session,
        headers: &HeaderMap,
        path: &str,
        state: &AppState,
    ) -> Result<Self, AppError> {
        let mut storage = visitor_storage::load(session).await?;

        let show_age_gate = AgeGate::load(&mut storage).gate_visible();
        let show_terms_banner = TermsBanner::load(&mut storage).banner_visible();

        let mut consent = ConsentManager::load(&mut storage);
        if consent_banner_closed(headers) {
            consent.close_banner();
        }
        let show_consent_banner = consent.banner_visible();
        let preferences = consent.preferences();

        let cart_count = visitor_storage::load_cart(session).await?.item_count();

        let analytics_id = state
            .config()
            .ga4_measurement_id
            .clone()
            .filter(|_| preferences.analytics);

        Ok(Self {
            path: path.to_string(),
            show_age_gate,
            show_terms_banner,
            show_consent_banner,
            consent: preferences,
            cart_count,
            analytics_id,
        })
    }
}

impl FromRequestParts<AppState> for PageContext {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or_else(|| AppError::Internal("session layer missing".to_string()))?;

        Self::load(&session, &parts.headers, parts.uri.path(), state).await
    }
}
