//! Catalog persistence
//!
//! `CatalogStore` is the only shared mutable resource of the service. Each
//! call is one statement against the backing store; flows that touch several
//! rows (propagation, mirroring) are sequences of independent calls.
//!
//! ```text
//! services ──► Arc<dyn CatalogStore>
//!                 ├── MemoryStore  (parking_lot maps, tests / dev)
//!                 └── PgStore      (sqlx + QueryBuilder)
//! ```

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use shared::models::{
    Category, CategoryUpdate, Client, ClientUpdate, InteractionKind, InteractionStat,
    NutritionFact, Product, ProductInput, ProductInteraction, ProductUpdate,
};
use thiserror::Error;
use uuid::Uuid;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Store-layer errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound("row".into()),
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StoreError::Duplicate(db.message().to_string())
            }
            other => StoreError::Database(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for StoreError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        StoreError::Database(err.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

// ════════════════════════════════════════════════════════════════
// Predicates
// ════════════════════════════════════════════════════════════════

/// Filterable / orderable column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Id,
    ClientId,
    Name,
    Slug,
    Category,
    Emoji,
    ParentProductId,
    IsActive,
    CreatedAt,
}

impl Column {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Column::Id => "id",
            Column::ClientId => "client_id",
            Column::Name => "name",
            Column::Slug => "slug",
            Column::Category => "category",
            Column::Emoji => "emoji",
            Column::ParentProductId => "parent_product_id",
            Column::IsActive => "is_active",
            Column::CreatedAt => "created_at",
        }
    }
}

/// Scalar operand of a predicate
#[derive(Debug, Clone, PartialEq, PartialOrd)]
pub enum Value {
    Uuid(Uuid),
    Text(String),
    Bool(bool),
    Time(chrono::DateTime<chrono::Utc>),
}

impl Value {
    /// Group key rendering (uuid and text as their string form)
    pub fn to_key(&self) -> String {
        match self {
            Value::Uuid(id) => id.to_string(),
            Value::Text(s) => s.clone(),
            Value::Bool(b) => b.to_string(),
            Value::Time(t) => t.to_rfc3339(),
        }
    }
}

impl From<Uuid> for Value {
    fn from(v: Uuid) -> Self {
        Value::Uuid(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

/// Row predicate
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    All,
    Eq(Column, Value),
    /// NULL-safe inequality (`IS DISTINCT FROM`)
    Ne(Column, Value),
    IsNull(Column),
    /// Case-insensitive substring match
    ILike(Column, String),
    In(Column, Vec<Value>),
    And(Vec<Filter>),
    Or(Vec<Filter>),
}

impl Filter {
    pub fn eq(column: Column, value: impl Into<Value>) -> Self {
        Filter::Eq(column, value.into())
    }

    pub fn ne(column: Column, value: impl Into<Value>) -> Self {
        Filter::Ne(column, value.into())
    }

    pub fn id(id: Uuid) -> Self {
        Filter::eq(Column::Id, id)
    }

    pub fn client(client_id: Uuid) -> Self {
        Filter::eq(Column::ClientId, client_id)
    }

    /// `self AND other`, flattening nested conjunctions
    pub fn and(self, other: Filter) -> Self {
        match (self, other) {
            (Filter::All, f) | (f, Filter::All) => f,
            (Filter::And(mut a), Filter::And(b)) => {
                a.extend(b);
                Filter::And(a)
            }
            (Filter::And(mut a), f) => {
                a.push(f);
                Filter::And(a)
            }
            (f, other) => Filter::And(vec![f, other]),
        }
    }

    /// Evaluate against an in-memory record
    pub fn matches<R: Record>(&self, record: &R) -> bool {
        match self {
            Filter::All => true,
            Filter::Eq(col, v) => record.field(*col).as_ref() == Some(v),
            Filter::Ne(col, v) => record.field(*col).as_ref() != Some(v),
            Filter::IsNull(col) => record.field(*col).is_none(),
            Filter::ILike(col, needle) => match record.field(*col) {
                Some(Value::Text(s)) => s.to_lowercase().contains(&needle.to_lowercase()),
                _ => false,
            },
            Filter::In(col, values) => record
                .field(*col)
                .is_some_and(|field| values.contains(&field)),
            Filter::And(filters) => filters.iter().all(|f| f.matches(record)),
            Filter::Or(filters) => filters.iter().any(|f| f.matches(record)),
        }
    }
}

/// Column access for in-memory predicate evaluation
pub trait Record {
    /// `None` for NULL or a column the entity does not carry
    fn field(&self, column: Column) -> Option<Value>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Asc(Column),
    Desc(Column),
}

/// Filter + ordering + limit
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub filter: Filter,
    pub order: Option<Order>,
    pub limit: Option<i64>,
}

impl Query {
    pub fn new(filter: Filter) -> Self {
        Self {
            filter,
            order: None,
            limit: None,
        }
    }

    pub fn all() -> Self {
        Self::new(Filter::All)
    }

    pub fn order_by(mut self, order: Order) -> Self {
        self.order = Some(order);
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// One row of a grouped count
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupCount {
    /// Group value rendered as text, `None` for the NULL group
    pub key: Option<String>,
    pub count: i64,
}

/// Denormalized product counter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductCounter {
    Views,
    FavoritesCount,
    NutritionInteractions,
}

impl ProductCounter {
    pub fn as_sql(&self) -> &'static str {
        match self {
            ProductCounter::Views => "views",
            ProductCounter::FavoritesCount => "favorites_count",
            ProductCounter::NutritionInteractions => "nutrition_interactions",
        }
    }
}

impl From<InteractionKind> for ProductCounter {
    fn from(kind: InteractionKind) -> Self {
        match kind {
            InteractionKind::View => ProductCounter::Views,
            InteractionKind::Favorite => ProductCounter::FavoritesCount,
            InteractionKind::Nutrition => ProductCounter::NutritionInteractions,
        }
    }
}

// ════════════════════════════════════════════════════════════════
// Product patch
// ════════════════════════════════════════════════════════════════

/// Partial product write; only `Some` fields are applied
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductPatch {
    pub client_id: Option<Uuid>,
    pub name: Option<String>,
    pub slug: Option<String>,
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
    pub parent_product_id: Option<Uuid>,
}

impl ProductPatch {
    pub fn price(price: f64) -> Self {
        Self {
            price: Some(price),
            ..Default::default()
        }
    }

    /// Global-controlled metadata carried from a global product to its copies
    pub fn propagated_from(global: &Product) -> Self {
        Self {
            description: global.description.clone(),
            nutrition: Some(global.nutrition.clone()),
            benefits: Some(global.benefits.clone()),
            tags: Some(global.tags.clone()),
            helps_with: Some(global.helps_with.clone()),
            emoji: global.emoji.clone(),
            category: global.category.clone(),
            market_price: global.market_price,
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn apply(&self, product: &mut Product) {
        macro_rules! set {
            ($($field:ident),*) => {
                $(if let Some(v) = &self.$field {
                    product.$field = v.clone();
                })*
            };
        }
        macro_rules! set_opt {
            ($($field:ident),*) => {
                $(if let Some(v) = &self.$field {
                    product.$field = Some(v.clone());
                })*
            };
        }
        set!(client_id, name, slug, price, unit, images, is_active, nutrition, benefits, tags, helps_with);
        set_opt!(category, emoji, description, market_price, image, parent_product_id);
    }
}

impl From<ProductUpdate> for ProductPatch {
    fn from(u: ProductUpdate) -> Self {
        Self {
            name: u.name,
            category: u.category,
            emoji: u.emoji,
            description: u.description,
            price: u.price,
            market_price: u.market_price,
            unit: u.unit,
            image: u.image,
            images: u.images,
            is_active: u.is_active,
            nutrition: u.nutrition,
            benefits: u.benefits,
            tags: u.tags,
            helps_with: u.helps_with,
            ..Default::default()
        }
    }
}

impl From<&ProductInput> for ProductPatch {
    fn from(input: &ProductInput) -> Self {
        Self {
            name: Some(input.name.trim().to_string()),
            category: input.category.clone(),
            emoji: input.emoji.clone(),
            description: input.description.clone(),
            price: input.client_price.or(input.price),
            market_price: input.market_price,
            unit: input.unit.clone(),
            image: input.image.clone(),
            images: input.images.clone(),
            is_active: input.is_active,
            nutrition: input.nutrition.clone(),
            benefits: input.benefits.clone(),
            tags: input.tags.clone(),
            helps_with: input.helps_with.clone(),
            ..Default::default()
        }
    }
}

/// New interaction log row
#[derive(Debug, Clone)]
pub struct NewInteraction {
    pub product_id: Uuid,
    pub kind: InteractionKind,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

// ════════════════════════════════════════════════════════════════
// Store trait
// ════════════════════════════════════════════════════════════════

#[async_trait]
pub trait CatalogStore: Send + Sync {
    // ── Clients ──

    async fn find_client(&self, filter: &Filter) -> StoreResult<Option<Client>>;
    async fn list_clients(&self, query: &Query) -> StoreResult<Vec<Client>>;
    /// Fails with `Duplicate` when the slug is taken
    async fn create_client(&self, client: Client) -> StoreResult<Client>;
    async fn update_client(&self, id: Uuid, patch: &ClientUpdate) -> StoreResult<Client>;
    async fn increment_client_views(&self, id: Uuid) -> StoreResult<Client>;

    // ── Products ──

    async fn find_product(&self, filter: &Filter) -> StoreResult<Option<Product>>;
    async fn list_products(&self, query: &Query) -> StoreResult<Vec<Product>>;
    /// Fails with `Duplicate` when `(client_id, slug)` is taken
    async fn create_product(&self, product: Product) -> StoreResult<Product>;
    async fn update_product(&self, id: Uuid, patch: &ProductPatch) -> StoreResult<Product>;
    /// Returns the number of rows written
    async fn update_products_where(&self, filter: &Filter, patch: &ProductPatch)
    -> StoreResult<u64>;
    async fn delete_product(&self, id: Uuid) -> StoreResult<()>;
    async fn count_products(&self, filter: &Filter) -> StoreResult<i64>;
    async fn group_count_products(
        &self,
        filter: &Filter,
        by: Column,
    ) -> StoreResult<Vec<GroupCount>>;
    async fn increment_product_counter(
        &self,
        id: Uuid,
        counter: ProductCounter,
    ) -> StoreResult<Product>;

    // ── Categories ──

    async fn find_category(&self, filter: &Filter) -> StoreResult<Option<Category>>;
    async fn list_categories(&self, query: &Query) -> StoreResult<Vec<Category>>;
    /// Fails with `Duplicate` when `(client_id, name)` is taken
    async fn create_category(&self, category: Category) -> StoreResult<Category>;
    async fn update_category(&self, id: Uuid, patch: &CategoryUpdate) -> StoreResult<Category>;
    async fn update_categories_where(
        &self,
        filter: &Filter,
        patch: &CategoryUpdate,
    ) -> StoreResult<u64>;
    async fn delete_category(&self, id: Uuid) -> StoreResult<()>;

    // ── Interactions (append-only) ──

    async fn append_interaction(&self, new: NewInteraction) -> StoreResult<ProductInteraction>;
    /// Counts per interaction type for one product (types with no rows omitted)
    async fn count_interactions(&self, product_id: Uuid) -> StoreResult<Vec<InteractionStat>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_and_flattens() {
        let f = Filter::client(Uuid::nil())
            .and(Filter::eq(Column::Slug, "chia"))
            .and(Filter::All)
            .and(Filter::IsNull(Column::ParentProductId));
        match f {
            Filter::And(parts) => assert_eq!(parts.len(), 3),
            other => panic!("unexpected filter {other:?}"),
        }
        assert_eq!(Filter::All.and(Filter::id(Uuid::nil())), Filter::id(Uuid::nil()));
    }

    #[test]
    fn test_patch_apply_only_present_fields() {
        let mut product = Product::new(Uuid::new_v4(), "Chia", "chia");
        product.description = Some("Sementes".into());
        product.price = 10.0;

        let patch = ProductPatch {
            emoji: Some("🌱".into()),
            tags: Some(vec!["omega-3".into()]),
            ..Default::default()
        };
        patch.apply(&mut product);

        assert_eq!(product.emoji.as_deref(), Some("🌱"));
        assert_eq!(product.tags, vec!["omega-3".to_string()]);
        assert_eq!(product.description.as_deref(), Some("Sementes"));
        assert_eq!(product.price, 10.0);
    }

    #[test]
    fn test_propagated_fields_exclude_price() {
        let mut global = Product::new(Uuid::new_v4(), "Chia", "chia");
        global.price = 99.0;
        global.market_price = Some(42.0);
        global.category = Some("Sementes".into());

        let patch = ProductPatch::propagated_from(&global);
        assert!(patch.price.is_none());
        assert!(patch.parent_product_id.is_none());
        assert_eq!(patch.market_price, Some(42.0));
        assert_eq!(patch.category.as_deref(), Some("Sementes"));
    }

    #[test]
    fn test_input_prefers_client_price() {
        let input = ProductInput {
            name: "  Chia ".into(),
            price: Some(10.0),
            client_price: Some(8.5),
            ..Default::default()
        };
        let patch = ProductPatch::from(&input);
        assert_eq!(patch.price, Some(8.5));
        assert_eq!(patch.name.as_deref(), Some("Chia"));
    }
}
