//! Application state shared across handlers.

use std::sync::Arc;

use helix_research_core::{Catalog, CatalogError};

use crate::config::StorefrontConfig;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`. Everything in it is immutable
/// after startup; per-visitor state lives in the session.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    catalog: Catalog,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: StorefrontConfig, catalog: Catalog) -> Self {
        Self {
            inner: Arc::new(AppStateInner { config, catalog }),
        }
    }

    /// Create application state, loading the catalog named by the
    /// configuration or the built-in one.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be read or is invalid.
    pub fn from_config(config: StorefrontConfig) -> Result<Self, CatalogError> {
        let catalog = match &config.catalog_path {
            Some(path) => {
                tracing::info!(path = %path.display(), "Loading catalog from file");
                Catalog::load(path)?
            }
            None => Catalog::builtin()?,
        };
        tracing::info!(products = catalog.len(), "Catalog loaded");
        Ok(Self::new(config, catalog))
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the product catalog.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }
}
