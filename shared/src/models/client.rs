//! Client (tenant) Model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::product::ProductInput;

/// Slug of the tenant holding the canonical catalog
pub const GLOBAL_CATALOG_SLUG: &str = "global-catalog";

/// Display name used when the global tenant is created lazily
pub const GLOBAL_CATALOG_NAME: &str = "Global Catalog";

fn default_theme_color() -> String {
    "#1E40AF".to_string()
}

fn default_true() -> bool {
    true
}

/// Client entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Client {
    pub id: Uuid,
    pub name: String,
    /// Unique across all clients
    pub slug: String,
    pub description: Option<String>,
    pub logo: Option<String>,
    pub cover_image: Option<String>,
    #[serde(default = "default_theme_color")]
    pub theme_color: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    /// Storefront visit counter
    #[serde(default)]
    pub views: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Client {
    /// Build a new active client with default presentation settings
    pub fn new(name: impl Into<String>, slug: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            slug: slug.into(),
            description: None,
            logo: None,
            cover_image: None,
            theme_color: default_theme_color(),
            is_active: true,
            views: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Create client payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientCreate {
    pub name: String,
    /// Explicit slug; derived from `name` when absent
    pub slug: Option<String>,
    pub description: Option<String>,
    pub logo: Option<String>,
    pub cover_image: Option<String>,
    pub theme_color: Option<String>,
    pub is_active: Option<bool>,
}

/// Update client payload (partial merge)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientUpdate {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub logo: Option<String>,
    pub cover_image: Option<String>,
    pub theme_color: Option<String>,
    pub is_active: Option<bool>,
}

/// Client with its product count (listing view)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientSummary {
    #[serde(flatten)]
    pub client: Client,
    pub product_count: i64,
}

/// One tenant in a bulk import request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientImport {
    pub name: String,
    pub slug: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub products: Vec<ProductInput>,
}

/// Outcome of one bulk import entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportStatus {
    Success,
    Error,
}

/// Per-entry bulk import result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportResult {
    pub name: String,
    pub status: ImportStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Products written for this entry
    #[serde(default)]
    pub products: usize,
}

impl ImportResult {
    pub fn success(name: impl Into<String>, products: usize) -> Self {
        Self {
            name: name.into(),
            status: ImportStatus::Success,
            error: None,
            products,
        }
    }

    pub fn error(name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: ImportStatus::Error,
            error: Some(error.into()),
            products: 0,
        }
    }
}
