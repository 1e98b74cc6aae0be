//! Static product catalog.
//!
//! The catalog is a read-only, ordered list of [`Product`] records loaded once
//! at startup. The built-in catalog is embedded in the crate; a JSON document
//! with the same shape can replace it (see [`Catalog::load`]).

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::types::{Price, ProductId};

/// The catalog compiled into the crate.
const BUILTIN_CATALOG: &str = include_str!("../data/catalog.json");

/// Errors raised while loading or querying the catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// No product has the requested id.
    #[error("product not found: {0}")]
    NotFound(String),

    /// The catalog document is not valid JSON or has the wrong shape.
    #[error("invalid catalog document: {0}")]
    Parse(#[from] serde_json::Error),

    /// The catalog file could not be read.
    #[error("failed to read catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Two products share an id.
    #[error("duplicate product id: {0}")]
    DuplicateId(ProductId),

    /// A product has a price below zero.
    #[error("product {0} has a negative price")]
    NegativePrice(ProductId),
}

/// Chemical metadata shown on the product detail page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChemicalProfile {
    /// Purity grade, e.g. `≥99%`.
    pub purity: String,
    /// Amino-acid sequence, for peptides.
    #[serde(default)]
    pub sequence: Option<String>,
    pub cas_number: String,
    pub molecular_weight: String,
    /// Storage instructions.
    pub storage: String,
}

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Price,
    /// Image path or URL.
    pub image: String,
    /// Category label used for grouping on listing pages.
    pub category: String,
    pub chemical: ChemicalProfile,
}

/// Ordered, immutable collection of products keyed by id.
#[derive(Debug, Clone)]
pub struct Catalog {
    products: Vec<Product>,
    index: HashMap<ProductId, usize>,
}

impl Catalog {
    /// Parse the catalog embedded in this crate.
    ///
    /// # Errors
    ///
    /// Returns an error only if the embedded document is invalid, which the
    /// tests in this module rule out.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json(BUILTIN_CATALOG)
    }

    /// Parse a catalog from a JSON array of products.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Parse` for malformed documents or invalid ids,
    /// `DuplicateId` if two products share an id and `NegativePrice` for
    /// prices below zero.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let products: Vec<Product> = serde_json::from_str(json)?;
        Self::from_products(products)
    }

    /// Read and parse a catalog file.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Io` if the file cannot be read, otherwise the
    /// same errors as [`Catalog::from_json`].
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let json = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Build a catalog from already-parsed products, validating them.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateId` or `NegativePrice` on invalid input.
    pub fn from_products(products: Vec<Product>) -> Result<Self, CatalogError> {
        let mut index = HashMap::with_capacity(products.len());

        for (position, product) in products.iter().enumerate() {
            if product.price.is_negative() {
                return Err(CatalogError::NegativePrice(product.id.clone()));
            }
            if index.insert(product.id.clone(), position).is_some() {
                return Err(CatalogError::DuplicateId(product.id.clone()));
            }
        }

        Ok(Self { products, index })
    }

    /// Look up a product by id.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if no product has this id.
    pub fn get(&self, id: &str) -> Result<&Product, CatalogError> {
        ProductId::parse(id)
            .ok()
            .and_then(|id| self.index.get(&id))
            .and_then(|&position| self.products.get(position))
            .ok_or_else(|| CatalogError::NotFound(id.to_string()))
    }

    /// All products in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &Product> {
        self.products.iter()
    }

    /// Every product id, in catalog order.
    pub fn ids(&self) -> impl Iterator<Item = &ProductId> {
        self.products.iter().map(|p| &p.id)
    }

    /// Distinct category labels in order of first appearance.
    #[must_use]
    pub fn categories(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for product in &self.products {
            if !seen.contains(&product.category.as_str()) {
                seen.push(&product.category);
            }
        }
        seen
    }

    /// Products whose category matches `label` (case-insensitive).
    pub fn in_category<'a>(&'a self, label: &'a str) -> impl Iterator<Item = &'a Product> {
        self.products
            .iter()
            .filter(move |p| p.category.eq_ignore_ascii_case(label))
    }

    /// The first `n` products, for the home page.
    #[must_use]
    pub fn featured(&self, n: usize) -> &[Product] {
        self.products.get(..n.min(self.products.len())).unwrap_or(&[])
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product_json(id: &str, price: &str) -> String {
        format!(
            r#"{{
                "id": "{id}",
                "name": "Test {id}",
                "description": "desc",
                "price": "{price}",
                "image": "/static/x.webp",
                "category": "Peptides",
                "chemical": {{
                    "purity": "99%",
                    "cas_number": "0-0-0",
                    "molecular_weight": "1 g/mol",
                    "storage": "cold"
                }}
            }}"#
        )
    }

    #[test]
    fn test_builtin_catalog_parses() {
        let catalog = Catalog::builtin().unwrap();
        assert!(!catalog.is_empty());
        assert_eq!(catalog.ids().count(), catalog.len());
    }

    #[test]
    fn test_builtin_ids_are_unique_and_ordered() {
        let catalog = Catalog::builtin().unwrap();
        let ids: Vec<&str> = catalog.ids().map(ProductId::as_str).collect();
        assert_eq!(ids.first(), Some(&"bpc-157"));
        let mut deduped = ids.clone();
        deduped.sort_unstable();
        deduped.dedup();
        assert_eq!(deduped.len(), ids.len());
    }

    #[test]
    fn test_get_existing_product() {
        let catalog = Catalog::builtin().unwrap();
        let product = catalog.get("tb-500").unwrap();
        assert_eq!(product.name, "TB-500");
        assert_eq!(product.price, Price::from_cents(5499));
        assert_eq!(product.chemical.cas_number, "77591-33-4");
    }

    #[test]
    fn test_get_missing_product_is_not_found() {
        let catalog = Catalog::builtin().unwrap();
        assert!(matches!(
            catalog.get("does-not-exist"),
            Err(CatalogError::NotFound(id)) if id == "does-not-exist"
        ));
        // Ids that are not even valid slugs are simply not found
        assert!(matches!(
            catalog.get("../secret"),
            Err(CatalogError::NotFound(_))
        ));
    }

    #[test]
    fn test_categories_first_appearance_order() {
        let catalog = Catalog::builtin().unwrap();
        assert_eq!(catalog.categories(), vec!["Peptides", "Coenzymes", "Supplies"]);
        assert_eq!(catalog.in_category("peptides").count(), 4);
        assert_eq!(catalog.in_category("unknown").count(), 0);
    }

    #[test]
    fn test_featured_clamps_to_len() {
        let catalog = Catalog::builtin().unwrap();
        assert_eq!(catalog.featured(2).len(), 2);
        assert_eq!(catalog.featured(1000).len(), catalog.len());
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let json = format!("[{}, {}]", product_json("a", "1.00"), product_json("a", "2.00"));
        assert!(matches!(
            Catalog::from_json(&json),
            Err(CatalogError::DuplicateId(id)) if id.as_str() == "a"
        ));
    }

    #[test]
    fn test_negative_price_rejected() {
        let json = format!("[{}]", product_json("a", "-1.00"));
        assert!(matches!(
            Catalog::from_json(&json),
            Err(CatalogError::NegativePrice(_))
        ));
    }

    #[test]
    fn test_invalid_id_rejected() {
        let json = format!("[{}]", product_json("Not A Slug", "1.00"));
        assert!(matches!(Catalog::from_json(&json), Err(CatalogError::Parse(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let result = Catalog::load(Path::new("/nonexistent/catalog.json"));
        assert!(matches!(result, Err(CatalogError::Io { .. })));
    }
}
