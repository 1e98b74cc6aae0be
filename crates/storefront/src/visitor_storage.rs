//! Per-visitor storage backed by the session.
//!
//! The compliance overlays and the cart keep the state a browser would hold
//! in local storage. Here that state lives in the visitor's `tower-sessions`
//! session: a request loads the known keys into a [`MemoryStorage`], runs the
//! domain operation against it, then commits only the keys that changed.

use helix_research_core::compliance::{
    AGE_VERIFIED_DATE_KEY, AGE_VERIFIED_KEY, TERMS_ACCEPTED_DATE_KEY, TERMS_ACCEPTED_KEY,
};
use helix_research_core::consent::{CONSENT_DATE_KEY, CONSENT_KEY, CONSENT_RECORDS_KEY};
use helix_research_core::{CartState, CartStore, MemoryStorage, StorageChange};
use tower_sessions::Session;
use tower_sessions::session::Error as SessionError;

/// Session key holding the serialised cart.
pub const CART_KEY: &str = "cart";

/// Keys mirrored between the session and [`MemoryStorage`].
pub const STORAGE_KEYS: &[&str] = &[
    CONSENT_KEY,
    CONSENT_DATE_KEY,
    CONSENT_RECORDS_KEY,
    AGE_VERIFIED_KEY,
    AGE_VERIFIED_DATE_KEY,
    TERMS_ACCEPTED_KEY,
    TERMS_ACCEPTED_DATE_KEY,
];

/// Load the visitor's stored values.
///
/// Values that are not strings are skipped with a warning, which the
/// components then treat as unset.
///
/// # Errors
///
/// Returns an error if the session store cannot be read.
pub async fn load(session: &Session) -> Result<MemoryStorage, SessionError> {
    let mut entries = Vec::with_capacity(STORAGE_KEYS.len());
    for &key in STORAGE_KEYS {
        match session.get_value(key).await? {
            Some(serde_json::Value::String(value)) => entries.push((key, value)),
            Some(other) => {
                tracing::warn!(key, kind = ?other, "Ignoring non-string visitor storage value");
            }
            None => {}
        }
    }
    Ok(MemoryStorage::with_entries(entries))
}

/// Write back the keys changed since `storage` was loaded.
///
/// # Errors
///
/// Returns an error if the session store cannot be written.
pub async fn commit(session: &Session, storage: &mut MemoryStorage) -> Result<(), SessionError> {
    for change in storage.take_changes() {
        match change {
            StorageChange::Set { key, value } => session.insert(&key, value).await?,
            StorageChange::Removed { key } => {
                session.remove_value(&key).await?;
            }
        }
    }
    Ok(())
}

/// Load the visitor's cart. A missing or unreadable cart is empty.
///
/// # Errors
///
/// Returns an error if the session store cannot be read.
pub async fn load_cart(session: &Session) -> Result<CartStore, SessionError> {
    let state = match session.get_value(CART_KEY).await? {
        Some(value) => serde_json::from_value::<CartState>(value).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Discarding unreadable cart");
            CartState::default()
        }),
        None => CartState::default(),
    };
    Ok(CartStore::from_state(state))
}

/// Persist the visitor's cart.
///
/// # Errors
///
/// Returns an error if the session store cannot be written.
pub async fn save_cart(session: &Session, cart: &CartStore) -> Result<(), SessionError> {
    session.insert(CART_KEY, cart.state()).await
}
