//! Age verification gate and terms-of-sale banner.
//!
//! Both overlays persist a `"true"` flag plus the ISO-8601 time it was set.
//! Any other stored value (missing, `"false"`, garbage) reads as not yet
//! confirmed, so the overlay is shown again.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::storage::KeyValueStore;

/// Storage key set once the visitor confirms they are of legal age.
pub const AGE_VERIFIED_KEY: &str = "age_verified";
pub const AGE_VERIFIED_DATE_KEY: &str = "age_verified_date";

/// Storage key set once the visitor accepts the research-use terms.
pub const TERMS_ACCEPTED_KEY: &str = "terms_accepted";
pub const TERMS_ACCEPTED_DATE_KEY: &str = "terms_accepted_date";

const TRUE: &str = "true";

fn flag_set(storage: &impl KeyValueStore, key: &str) -> bool {
    match storage.get(key) {
        Some(value) if value == TRUE => true,
        Some(value) => {
            tracing::warn!(key, value = %value, "Ignoring unexpected stored compliance flag");
            false
        }
        None => false,
    }
}

fn set_flag(storage: &mut impl KeyValueStore, key: &str, date_key: &str, now: DateTime<Utc>) {
    storage.set(key, TRUE.to_string());
    storage.set(date_key, now.to_rfc3339_opts(SecondsFormat::Millis, true));
}

/// Result of answering the age gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgeGateOutcome {
    /// The visitor confirmed; the site is unlocked.
    Verified,
    /// The visitor is under age; nothing is stored and access is refused.
    Denied,
}

/// Blocking overlay asking the visitor to confirm their age.
#[derive(Debug)]
pub struct AgeGate<S> {
    storage: S,
    verified: bool,
}

impl<S: KeyValueStore> AgeGate<S> {
    pub fn load(storage: S) -> Self {
        let verified = flag_set(&storage, AGE_VERIFIED_KEY);
        Self { storage, verified }
    }

    #[must_use]
    pub const fn is_verified(&self) -> bool {
        self.verified
    }

    /// Whether the overlay must be displayed.
    #[must_use]
    pub const fn gate_visible(&self) -> bool {
        !self.verified
    }

    pub fn confirm(&mut self, now: DateTime<Utc>) -> AgeGateOutcome {
        set_flag(&mut self.storage, AGE_VERIFIED_KEY, AGE_VERIFIED_DATE_KEY, now);
        self.verified = true;
        AgeGateOutcome::Verified
    }

    /// Refuse entry. The answer is not remembered, so the gate asks again on
    /// the next visit.
    #[must_use]
    pub const fn deny(&self) -> AgeGateOutcome {
        AgeGateOutcome::Denied
    }

    #[must_use]
    pub fn into_storage(self) -> S {
        self.storage
    }
}

/// Non-blocking banner asking the visitor to accept the terms of sale.
#[derive(Debug)]
pub struct TermsBanner<S> {
    storage: S,
    accepted: bool,
}

impl<S: KeyValueStore> TermsBanner<S> {
    pub fn load(storage: S) -> Self {
        let accepted = flag_set(&storage, TERMS_ACCEPTED_KEY);
        Self { storage, accepted }
    }

    #[must_use]
    pub const fn is_accepted(&self) -> bool {
        self.accepted
    }

    #[must_use]
    pub const fn banner_visible(&self) -> bool {
        !self.accepted
    }

    pub fn accept(&mut self, now: DateTime<Utc>) {
        set_flag(
            &mut self.storage,
            TERMS_ACCEPTED_KEY,
            TERMS_ACCEPTED_DATE_KEY,
            now,
        );
        self.accepted = true;
    }

    #[must_use]
    pub fn into_storage(self) -> S {
        self.storage
    }
}
