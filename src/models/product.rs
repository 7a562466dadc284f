//! Menu models: products and add-ons.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::{Collection, Record};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    EspressoBased,
    NoCaffeine,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddonType {
    Shot,
    Syrup,
}

/// Drink on the menu.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(skip)]
    pub id: String,
    #[serde(skip)]
    pub revision: i64,

    pub name: String,

    /// Always positive.
    pub base_price_cents: i64,

    pub category: Category,

    pub available: bool,

    #[serde(default)]
    pub description: String,

    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,

    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

impl Record for Product {
    const COLLECTION: Collection = Collection::Products;

    fn assign_identity(&mut self, id: String, revision: i64) {
        self.id = id;
        self.revision = revision;
    }
}

/// Extra shot or syrup that can be added to a drink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Addon {
    #[serde(skip)]
    pub id: String,
    #[serde(skip)]
    pub revision: i64,

    pub name: String,

    pub price_cents: i64,

    #[serde(rename = "type")]
    pub addon_type: AddonType,

    pub available: bool,
}

impl Record for Addon {
    const COLLECTION: Collection = Collection::Addons;

    fn assign_identity(&mut self, id: String, revision: i64) {
        self.id = id;
        self.revision = revision;
    }
}

/// Request body for creating a product.
///
/// # JSON Example
///
/// ```json
/// {
///   "name": "Spanish Latte",
///   "base_price_cents": 14000,
///   "category": "espresso-based",
///   "description": "Condensed milk and espresso"
/// }
/// ```
#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    pub base_price_cents: i64,
    pub category: Category,
    #[serde(default = "default_available")]
    pub available: bool,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub base_price_cents: Option<i64>,
    pub category: Option<Category>,
    pub available: Option<bool>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateAddonRequest {
    pub name: String,
    pub price_cents: i64,
    #[serde(rename = "type")]
    pub addon_type: AddonType,
    #[serde(default = "default_available")]
    pub available: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateAddonRequest {
    pub name: Option<String>,
    pub price_cents: Option<i64>,
    #[serde(rename = "type")]
    pub addon_type: Option<AddonType>,
    pub available: Option<bool>,
}

/// New menu entries are orderable unless stated otherwise.
fn default_available() -> bool {
    true
}

/// Product as returned by the API, timestamps in RFC 3339.
#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub id: String,
    pub name: String,
    pub base_price_cents: i64,
    pub category: Category,
    pub available: bool,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Product> for ProductResponse {
    fn from(product: Product) -> Self {
        Self {
            id: product.id,
            name: product.name,
            base_price_cents: product.base_price_cents,
            category: product.category,
            available: product.available,
            description: product.description,
            created_at: product.created_at,
            updated_at: product.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AddonResponse {
    pub id: String,
    #[serde(flatten)]
    pub addon: Addon,
}

impl From<Addon> for AddonResponse {
    fn from(addon: Addon) -> Self {
        Self {
            id: addon.id.clone(),
            addon,
        }
    }
}

/// Orderable part of the menu, shown on the customer link page.
#[derive(Debug, Serialize)]
pub struct MenuResponse {
    pub products: Vec<ProductResponse>,
    pub addons: Vec<AddonResponse>,
}
