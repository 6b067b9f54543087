//! Product Model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

fn default_unit() -> String {
    "un".to_string()
}

fn default_true() -> bool {
    true
}

/// Nutrition table row (`{"label": "Proteína", "value": "12g"}`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NutritionFact {
    pub label: String,
    pub value: String,
}

/// Product entity
///
/// A product whose `client_id` is the global catalog tenant is a global
/// product and never carries a `parent_product_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Product {
    pub id: Uuid,
    /// Owning client (tenant)
    pub client_id: Uuid,
    pub name: String,
    /// Unique within a client
    pub slug: String,
    /// Free-text category label (case-sensitive)
    pub category: Option<String>,
    pub emoji: Option<String>,
    pub description: Option<String>,
    /// Per-client price
    pub price: f64,
    /// Canonical market price, meaningful on the global copy
    pub market_price: Option<f64>,
    #[serde(default = "default_unit")]
    pub unit: String,
    pub image: Option<String>,
    #[serde(default)]
    #[cfg_attr(feature = "db", sqlx(json))]
    pub images: Vec<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub views: i32,
    #[serde(default)]
    pub favorites_count: i32,
    #[serde(default)]
    pub nutrition_interactions: i32,
    #[serde(default)]
    #[cfg_attr(feature = "db", sqlx(json))]
    pub nutrition: Vec<NutritionFact>,
    #[serde(default)]
    #[cfg_attr(feature = "db", sqlx(json))]
    pub benefits: Vec<String>,
    #[serde(default)]
    #[cfg_attr(feature = "db", sqlx(json))]
    pub tags: Vec<String>,
    #[serde(default)]
    #[cfg_attr(feature = "db", sqlx(json))]
    pub helps_with: Vec<String>,
    /// Global-catalog product this copy mirrors (weak reference)
    pub parent_product_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Build a new active product with zeroed counters
    pub fn new(client_id: Uuid, name: impl Into<String>, slug: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            client_id,
            name: name.into(),
            slug: slug.into(),
            category: None,
            emoji: None,
            description: None,
            price: 0.0,
            market_price: None,
            unit: default_unit(),
            image: None,
            images: Vec::new(),
            is_active: true,
            views: 0,
            favorites_count: 0,
            nutrition_interactions: 0,
            nutrition: Vec::new(),
            benefits: Vec::new(),
            tags: Vec::new(),
            helps_with: Vec::new(),
            parent_product_id: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Create-or-update payload for a client's product
///
/// The slug is always derived from `name`. `client_price` takes precedence
/// over `price` when both are sent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductInput {
    pub name: String,
    pub category: Option<String>,
    pub emoji: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub client_price: Option<f64>,
    pub market_price: Option<f64>,
    pub unit: Option<String>,
    pub image: Option<String>,
    pub images: Option<Vec<String>>,
    pub is_active: Option<bool>,
    pub nutrition: Option<Vec<NutritionFact>>,
    pub benefits: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
    pub helps_with: Option<Vec<String>>,
    /// Global product to link to
    pub parent_product_id: Option<Uuid>,
}

/// Update product payload (partial merge)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub category: Option<String>,
    pub emoji: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub market_price: Option<f64>,
    pub unit: Option<String>,
    pub image: Option<String>,
    pub images: Option<Vec<String>>,
    pub is_active: Option<bool>,
    pub nutrition: Option<Vec<NutritionFact>>,
    pub benefits: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
    pub helps_with: Option<Vec<String>>,
}

impl ProductUpdate {
    /// Price-only update
    pub fn price(price: f64) -> Self {
        Self {
            price: Some(price),
            ..Default::default()
        }
    }
}

/// Live notification body for product mutations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductChange {
    pub action: ProductAction,
    pub product: Product,
}

/// Kind of product mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductAction {
    Create,
    Update,
    Delete,
}
