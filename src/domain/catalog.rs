//! Catalog shapes and the normalization boundary.
//!
//! The catalog API returns records with optional and nested category fields.
//! `RawProduct::normalize` flattens those into `CatalogProduct`, the canonical
//! shape the basket engine consumes, so nothing downstream handles a missing
//! field defensively.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::Money;

/// Canonical product record: fully resolved, no optional fields the engine
/// would have to guard against.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CatalogProduct {
    pub id: String,
    pub name: String,
    pub price: Money,
    pub image: String,
    pub category_id: Option<String>,
    pub subcategory_id: Option<String>,
    pub featured: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Subcategory {
    pub id: String,
    pub name: String,
    pub category_id: String,
}

/// Wire shape as the catalog endpoint actually sends it. Category may arrive
/// as a bare id or a nested `{ id, name }` object, image may be absent.
#[derive(Clone, Debug, Deserialize)]
pub struct RawProduct {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
    pub price: Decimal,
    pub image: Option<String>,
    pub category: Option<RawCategoryRef>,
    pub subcategory: Option<RawCategoryRef>,
    #[serde(default)]
    pub featured: bool,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum RawCategoryRef {
    Id(String),
    Nested { #[serde(alias = "_id")] id: String },
}

impl RawCategoryRef {
    fn id(&self) -> &str {
        match self {
            Self::Id(id) => id,
            Self::Nested { id } => id,
        }
    }
}

impl RawProduct {
    pub fn normalize(self, currency: &str) -> CatalogProduct {
        CatalogProduct {
            id: self.id,
            name: self.name,
            price: Money::new(self.price, currency),
            image: self.image.unwrap_or_default(),
            category_id: self.category.as_ref().map(|c| c.id().to_string()),
            subcategory_id: self.subcategory.as_ref().map(|c| c.id().to_string()),
            featured: self.featured,
        }
    }
}

/// Read-only filter over the normalized catalog, driving the product grid
/// that feeds basket selection.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct CatalogFilter {
    pub category_id: Option<String>,
    pub subcategory_id: Option<String>,
    #[serde(default)]
    pub featured_only: bool,
}

impl CatalogFilter {
    pub fn matches(&self, product: &CatalogProduct) -> bool {
        if let Some(cat) = &self.category_id {
            if product.category_id.as_deref() != Some(cat.as_str()) { return false; }
        }
        if let Some(sub) = &self.subcategory_id {
            if product.subcategory_id.as_deref() != Some(sub.as_str()) { return false; }
        }
        if self.featured_only && !product.featured { return false; }
        true
    }

    pub fn apply<'a>(&self, products: &'a [CatalogProduct]) -> Vec<&'a CatalogProduct> {
        products.iter().filter(|p| self.matches(p)).collect()
    }
}
