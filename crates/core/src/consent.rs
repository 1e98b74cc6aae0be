//! Cookie consent state machine and audit log.
//!
//! ```text
//! Unset ──load──► BannerShown ──accept_all──────► AcceptedAll
//!   │                  │ ──accept_selected──► AcceptedSelected
//!   │                  │ ──reject_all───────► RejectedAll
//!   │                  └─close_banner───────► Closed (nothing persisted)
//!   └──load (valid stored preferences)──────► Restored
//! ```
//!
//! Every decision writes [`CONSENT_KEY`] and [`CONSENT_DATE_KEY`] and appends
//! one [`ConsentRecord`] to [`CONSENT_RECORDS_KEY`]. Stored data that fails to
//! parse is treated as absent: the banner is shown again instead of failing
//! the page.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::KeyValueStore;

/// Storage key for the JSON-encoded [`ConsentPreferences`].
pub const CONSENT_KEY: &str = "cookie_consent";
/// Storage key for the ISO-8601 time of the last decision.
pub const CONSENT_DATE_KEY: &str = "cookie_consent_date";
/// Storage key for the JSON-encoded array of [`ConsentRecord`]s.
pub const CONSENT_RECORDS_KEY: &str = "consent_records";

/// Tracking categories the visitor has agreed to.
///
/// `necessary` is always `true`; constructors and loaders force it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentPreferences {
    pub necessary: bool,
    pub analytics: bool,
    pub marketing: bool,
}

impl ConsentPreferences {
    /// Only strictly necessary storage.
    pub const NECESSARY_ONLY: Self = Self {
        necessary: true,
        analytics: false,
        marketing: false,
    };

    /// Every category.
    pub const ALL: Self = Self {
        necessary: true,
        analytics: true,
        marketing: true,
    };

    #[must_use]
    pub const fn new(analytics: bool, marketing: bool) -> Self {
        Self {
            necessary: true,
            analytics,
            marketing,
        }
    }

    const fn normalized(self) -> Self {
        Self::new(self.analytics, self.marketing)
    }
}

impl Default for ConsentPreferences {
    fn default() -> Self {
        Self::NECESSARY_ONLY
    }
}

/// The button the visitor pressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsentDecision {
    AcceptAll,
    AcceptSelected,
    RejectAll,
}

/// Where the consent manager is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsentState {
    /// Nothing read yet.
    Unset,
    /// No stored decision; the banner is displayed.
    BannerShown,
    /// Closed without a decision for this visit.
    Closed,
    /// A stored decision from an earlier visit was found.
    Restored,
    AcceptedAll,
    AcceptedSelected,
    RejectedAll,
}

impl From<ConsentDecision> for ConsentState {
    fn from(decision: ConsentDecision) -> Self {
        match decision {
            ConsentDecision::AcceptAll => Self::AcceptedAll,
            ConsentDecision::AcceptSelected => Self::AcceptedSelected,
            ConsentDecision::RejectAll => Self::RejectedAll,
        }
    }
}

/// Request context captured alongside a decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsentContext {
    pub user_agent: String,
    pub locale: String,
    pub timezone: String,
    pub page_path: String,
}

/// One append-only audit log entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsentRecord {
    pub timestamp: DateTime<Utc>,
    pub decision: ConsentDecision,
    pub preferences: ConsentPreferences,
    pub user_agent: String,
    pub locale: String,
    pub timezone: String,
    pub page_path: String,
}

/// Read the stored preferences, treating malformed data as absent.
pub fn stored_preferences(storage: &impl KeyValueStore) -> Option<ConsentPreferences> {
    let raw = storage.get(CONSENT_KEY)?;
    match serde_json::from_str::<ConsentPreferences>(&raw) {
        Ok(preferences) => Some(preferences.normalized()),
        Err(e) => {
            tracing::warn!(error = %e, "Ignoring malformed stored cookie consent");
            None
        }
    }
}

/// Read the consent log, treating malformed data as empty.
pub fn stored_records(storage: &impl KeyValueStore) -> Vec<ConsentRecord> {
    let Some(raw) = storage.get(CONSENT_RECORDS_KEY) else {
        return Vec::new();
    };
    serde_json::from_str(&raw).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Ignoring malformed stored consent records");
        Vec::new()
    })
}

/// Cookie consent banner logic over an injected store.
#[derive(Debug)]
pub struct ConsentManager<S> {
    storage: S,
    state: ConsentState,
    preferences: ConsentPreferences,
}

impl<S: KeyValueStore> ConsentManager<S> {
    /// A manager that has not read storage yet.
    pub const fn new(storage: S) -> Self {
        Self {
            storage,
            state: ConsentState::Unset,
            preferences: ConsentPreferences::NECESSARY_ONLY,
        }
    }

    /// Read stored preferences: restore them if present, otherwise show the
    /// banner.
    pub fn load(storage: S) -> Self {
        let mut manager = Self::new(storage);
        match stored_preferences(&manager.storage) {
            Some(preferences) => {
                manager.preferences = preferences;
                manager.state = ConsentState::Restored;
            }
            None => manager.state = ConsentState::BannerShown,
        }
        manager
    }

    #[must_use]
    pub const fn state(&self) -> ConsentState {
        self.state
    }

    /// Current preferences, including unsaved banner toggles.
    #[must_use]
    pub const fn preferences(&self) -> ConsentPreferences {
        self.preferences
    }

    #[must_use]
    pub const fn banner_visible(&self) -> bool {
        matches!(self.state, ConsentState::BannerShown)
    }

    /// Toggle analytics on the banner. Nothing is persisted until a decision.
    pub fn set_analytics(&mut self, enabled: bool) {
        self.preferences.analytics = enabled;
    }

    /// Toggle marketing on the banner. Nothing is persisted until a decision.
    pub fn set_marketing(&mut self, enabled: bool) {
        self.preferences.marketing = enabled;
    }

    /// Agree to every category.
    pub fn accept_all(&mut self, context: ConsentContext, now: DateTime<Utc>) -> ConsentRecord {
        self.decide(ConsentDecision::AcceptAll, ConsentPreferences::ALL, context, now)
    }

    /// Persist the current toggle state.
    pub fn accept_selected(
        &mut self,
        context: ConsentContext,
        now: DateTime<Utc>,
    ) -> ConsentRecord {
        let selected = self.preferences.normalized();
        self.decide(ConsentDecision::AcceptSelected, selected, context, now)
    }

    /// Refuse every optional category, whatever the toggles say.
    pub fn reject_all(&mut self, context: ConsentContext, now: DateTime<Utc>) -> ConsentRecord {
        self.decide(
            ConsentDecision::RejectAll,
            ConsentPreferences::NECESSARY_ONLY,
            context,
            now,
        )
    }

    /// Hide the banner for this visit without storing anything.
    pub fn close_banner(&mut self) {
        if matches!(self.state, ConsentState::BannerShown | ConsentState::Unset) {
            self.state = ConsentState::Closed;
        }
    }

    /// The stored audit log.
    #[must_use]
    pub fn records(&self) -> Vec<ConsentRecord> {
        stored_records(&self.storage)
    }

    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    #[must_use]
    pub fn into_storage(self) -> S {
        self.storage
    }

    fn decide(
        &mut self,
        decision: ConsentDecision,
        preferences: ConsentPreferences,
        context: ConsentContext,
        now: DateTime<Utc>,
    ) -> ConsentRecord {
        self.preferences = preferences;
        self.state = decision.into();

        let record = ConsentRecord {
            timestamp: now,
            decision,
            preferences,
            user_agent: context.user_agent,
            locale: context.locale,
            timezone: context.timezone,
            page_path: context.page_path,
        };

        // Serialising these plain structs cannot fail
        if let Ok(json) = serde_json::to_string(&preferences) {
            self.storage.set(CONSENT_KEY, json);
        }
        self.storage.set(
            CONSENT_DATE_KEY,
            now.to_rfc3339_opts(SecondsFormat::Millis, true),
        );

        let mut records = stored_records(&self.storage);
        records.push(record.clone());
        if let Ok(json) = serde_json::to_string(&records) {
            self.storage.set(CONSENT_RECORDS_KEY, json);
        }

        tracing::debug!(?decision, records = records.len(), "Consent decision stored");
        record
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::storage::MemoryStorage;

    fn context() -> ConsentContext {
        ConsentContext {
            user_agent: "Mozilla/5.0 (X11; Linux x86_64)".to_string(),
            locale: "en-US".to_string(),
            timezone: "Europe/Berlin".to_string(),
            page_path: "/products/bpc-157".to_string(),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap()
    }

    fn stored(storage: &MemoryStorage) -> ConsentPreferences {
        serde_json::from_str(&storage.get(CONSENT_KEY).unwrap()).unwrap()
    }

    #[test]
    fn test_new_manager_is_unset() {
        let manager = ConsentManager::new(MemoryStorage::new());
        assert_eq!(manager.state(), ConsentState::Unset);
        assert!(!manager.banner_visible());
    }

    #[test]
    fn test_no_stored_consent_shows_banner() {
        let manager = ConsentManager::load(MemoryStorage::new());
        assert_eq!(manager.state(), ConsentState::BannerShown);
        assert!(manager.banner_visible());
        assert_eq!(manager.preferences(), ConsentPreferences::NECESSARY_ONLY);
    }

    #[test]
    fn test_stored_consent_is_restored() {
        let storage = MemoryStorage::with_entries([(
            CONSENT_KEY,
            r#"{"necessary":true,"analytics":true,"marketing":false}"#,
        )]);
        let manager = ConsentManager::load(storage);

        assert_eq!(manager.state(), ConsentState::Restored);
        assert!(!manager.banner_visible());
        assert_eq!(manager.preferences(), ConsentPreferences::new(true, false));
    }

    #[test]
    fn test_stored_necessary_false_is_forced_true() {
        let storage = MemoryStorage::with_entries([(
            CONSENT_KEY,
            r#"{"necessary":false,"analytics":false,"marketing":true}"#,
        )]);
        let manager = ConsentManager::load(storage);
        assert!(manager.preferences().necessary);
        assert!(manager.preferences().marketing);
    }

    #[test]
    fn test_malformed_stored_consent_shows_banner() {
        let storage = MemoryStorage::with_entries([(CONSENT_KEY, "{not json")]);
        let manager = ConsentManager::load(storage);
        assert_eq!(manager.state(), ConsentState::BannerShown);
        assert_eq!(manager.preferences(), ConsentPreferences::NECESSARY_ONLY);
    }

    #[test]
    fn test_accept_all_ignores_toggles() {
        let mut manager = ConsentManager::load(MemoryStorage::new());
        manager.set_analytics(false);
        manager.set_marketing(false);

        let record = manager.accept_all(context(), now());

        assert_eq!(manager.state(), ConsentState::AcceptedAll);
        assert!(!manager.banner_visible());
        assert_eq!(record.preferences, ConsentPreferences::ALL);
        assert_eq!(stored(manager.storage()), ConsentPreferences::ALL);
    }

    #[test]
    fn test_reject_all_ignores_toggles() {
        let mut manager = ConsentManager::load(MemoryStorage::new());
        manager.set_analytics(true);
        manager.set_marketing(true);

        manager.reject_all(context(), now());

        assert_eq!(manager.state(), ConsentState::RejectedAll);
        assert_eq!(stored(manager.storage()), ConsentPreferences::NECESSARY_ONLY);
    }

    #[test]
    fn test_accept_selected_persists_toggles() {
        let mut manager = ConsentManager::load(MemoryStorage::new());
        manager.set_marketing(true);

        manager.accept_selected(context(), now());

        assert_eq!(manager.state(), ConsentState::AcceptedSelected);
        assert_eq!(stored(manager.storage()), ConsentPreferences::new(false, true));
    }

    #[test]
    fn test_decision_writes_iso_date() {
        let mut manager = ConsentManager::load(MemoryStorage::new());
        manager.accept_all(context(), now());
        assert_eq!(
            manager.storage().get(CONSENT_DATE_KEY).as_deref(),
            Some("2026-03-14T09:26:53.000Z")
        );
    }

    #[test]
    fn test_each_decision_appends_one_record() {
        let mut storage = MemoryStorage::new();

        for n in 1..=4 {
            let mut manager = ConsentManager::load(&mut storage);
            match n % 3 {
                0 => manager.reject_all(context(), now()),
                1 => manager.accept_all(context(), now()),
                _ => manager.accept_selected(context(), now()),
            };
            assert_eq!(manager.records().len(), n);
        }

        let records = stored_records(&storage);
        assert_eq!(records.len(), 4);
        let first = records.first().unwrap();
        assert_eq!(first.decision, ConsentDecision::AcceptAll);
        assert_eq!(first.page_path, "/products/bpc-157");
        assert_eq!(first.timezone, "Europe/Berlin");
        assert_eq!(first.timestamp, now());
    }

    #[test]
    fn test_record_json_shape() {
        let mut manager = ConsentManager::load(MemoryStorage::new());
        manager.reject_all(context(), now());

        let raw = manager.storage().get(CONSENT_RECORDS_KEY).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        let entry = &value[0];
        assert_eq!(entry["decision"], "reject_all");
        assert_eq!(entry["userAgent"], "Mozilla/5.0 (X11; Linux x86_64)");
        assert_eq!(entry["pagePath"], "/products/bpc-157");
        assert_eq!(entry["preferences"]["analytics"], false);
    }

    #[test]
    fn test_malformed_records_are_replaced_on_next_decision() {
        let storage = MemoryStorage::with_entries([(CONSENT_RECORDS_KEY, "oops")]);
        let mut manager = ConsentManager::load(storage);
        assert!(manager.records().is_empty());

        manager.accept_all(context(), now());
        assert_eq!(manager.records().len(), 1);
    }

    #[test]
    fn test_close_banner_persists_nothing() {
        let mut manager = ConsentManager::load(MemoryStorage::new());
        manager.set_analytics(true);
        manager.close_banner();

        assert_eq!(manager.state(), ConsentState::Closed);
        assert!(!manager.banner_visible());

        let mut storage = manager.into_storage();
        assert!(storage.take_changes().is_empty());

        // Next visit shows the banner again
        let manager = ConsentManager::load(storage);
        assert!(manager.banner_visible());
    }

    #[test]
    fn test_close_does_not_override_restored_state() {
        let storage = MemoryStorage::with_entries([(
            CONSENT_KEY,
            r#"{"necessary":true,"analytics":false,"marketing":false}"#,
        )]);
        let mut manager = ConsentManager::load(storage);
        manager.close_banner();
        assert_eq!(manager.state(), ConsentState::Restored);
    }
}
