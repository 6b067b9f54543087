//! In-memory `CatalogStore` (tests and database-less development runs)

use async_trait::async_trait;
use parking_lot::RwLock;
use shared::models::{
    Category, CategoryUpdate, Client, ClientUpdate, InteractionStat, Product, ProductInteraction,
};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use uuid::Uuid;

use super::{
    CatalogStore, Column, Filter, GroupCount, NewInteraction, Order, ProductCounter, ProductPatch,
    Query, Record, StoreError, StoreResult, Value,
};

#[derive(Default)]
struct Tables {
    clients: Vec<Client>,
    products: Vec<Product>,
    categories: Vec<Category>,
    interactions: Vec<ProductInteraction>,
}

/// Table scans over `parking_lot::RwLock`-guarded vectors
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Record for Client {
    fn field(&self, column: Column) -> Option<Value> {
        match column {
            Column::Id => Some(self.id.into()),
            Column::Name => Some(self.name.as_str().into()),
            Column::Slug => Some(self.slug.as_str().into()),
            Column::IsActive => Some(self.is_active.into()),
            Column::CreatedAt => Some(Value::Time(self.created_at)),
            _ => None,
        }
    }
}

impl Record for Product {
    fn field(&self, column: Column) -> Option<Value> {
        match column {
            Column::Id => Some(self.id.into()),
            Column::ClientId => Some(self.client_id.into()),
            Column::Name => Some(self.name.as_str().into()),
            Column::Slug => Some(self.slug.as_str().into()),
            Column::Category => self.category.as_deref().map(Value::from),
            Column::Emoji => self.emoji.as_deref().map(Value::from),
            Column::ParentProductId => self.parent_product_id.map(Value::from),
            Column::IsActive => Some(self.is_active.into()),
            Column::CreatedAt => Some(Value::Time(self.created_at)),
        }
    }
}

impl Record for Category {
    fn field(&self, column: Column) -> Option<Value> {
        match column {
            Column::Id => Some(self.id.into()),
            Column::ClientId => Some(self.client_id.into()),
            Column::Name => Some(self.name.as_str().into()),
            Column::Emoji => Some(self.emoji.as_str().into()),
            Column::CreatedAt => Some(Value::Time(self.created_at)),
            _ => None,
        }
    }
}

fn compare<R: Record>(a: &R, b: &R, column: Column) -> Ordering {
    a.field(column)
        .partial_cmp(&b.field(column))
        .unwrap_or(Ordering::Equal)
}

fn select<R: Record + Clone>(rows: &[R], query: &Query) -> Vec<R> {
    let mut out: Vec<R> = rows
        .iter()
        .filter(|r| query.filter.matches(*r))
        .cloned()
        .collect();
    match query.order {
        Some(Order::Asc(col)) => out.sort_by(|a, b| compare(a, b, col)),
        Some(Order::Desc(col)) => out.sort_by(|a, b| compare(b, a, col)),
        None => {}
    }
    if let Some(limit) = query.limit {
        out.truncate(limit.max(0) as usize);
    }
    out
}

fn apply_client_update(client: &mut Client, patch: &ClientUpdate) {
    if let Some(v) = &patch.name {
        client.name = v.clone();
    }
    if let Some(v) = &patch.slug {
        client.slug = v.clone();
    }
    if let Some(v) = &patch.description {
        client.description = Some(v.clone());
    }
    if let Some(v) = &patch.logo {
        client.logo = Some(v.clone());
    }
    if let Some(v) = &patch.cover_image {
        client.cover_image = Some(v.clone());
    }
    if let Some(v) = &patch.theme_color {
        client.theme_color = v.clone();
    }
    if let Some(v) = patch.is_active {
        client.is_active = v;
    }
    client.updated_at = shared::util::now();
}

fn apply_category_update(category: &mut Category, patch: &CategoryUpdate) {
    if let Some(v) = &patch.name {
        category.name = v.clone();
    }
    if let Some(v) = &patch.emoji {
        category.emoji = v.clone();
    }
    category.updated_at = shared::util::now();
}

impl Tables {
    fn product_slug_taken(&self, client_id: Uuid, slug: &str, except: Option<Uuid>) -> bool {
        self.products
            .iter()
            .any(|p| p.client_id == client_id && p.slug == slug && Some(p.id) != except)
    }

    fn category_name_taken(&self, client_id: Uuid, name: &str, except: Option<Uuid>) -> bool {
        self.categories
            .iter()
            .any(|c| c.client_id == client_id && c.name == name && Some(c.id) != except)
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn find_client(&self, filter: &Filter) -> StoreResult<Option<Client>> {
        let tables = self.tables.read();
        Ok(tables.clients.iter().find(|c| filter.matches(*c)).cloned())
    }

    async fn list_clients(&self, query: &Query) -> StoreResult<Vec<Client>> {
        Ok(select(&self.tables.read().clients, query))
    }

    async fn create_client(&self, client: Client) -> StoreResult<Client> {
        let mut tables = self.tables.write();
        if tables.clients.iter().any(|c| c.slug == client.slug) {
            return Err(StoreError::Duplicate(format!("client slug '{}'", client.slug)));
        }
        tables.clients.push(client.clone());
        Ok(client)
    }

    async fn update_client(&self, id: Uuid, patch: &ClientUpdate) -> StoreResult<Client> {
        let mut tables = self.tables.write();
        if let Some(slug) = &patch.slug
            && tables.clients.iter().any(|c| &c.slug == slug && c.id != id)
        {
            return Err(StoreError::Duplicate(format!("client slug '{slug}'")));
        }
        let client = tables
            .clients
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("client {id}")))?;
        apply_client_update(client, patch);
        Ok(client.clone())
    }

    async fn increment_client_views(&self, id: Uuid) -> StoreResult<Client> {
        let mut tables = self.tables.write();
        let client = tables
            .clients
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("client {id}")))?;
        client.views += 1;
        Ok(client.clone())
    }

    async fn find_product(&self, filter: &Filter) -> StoreResult<Option<Product>> {
        let tables = self.tables.read();
        Ok(tables.products.iter().find(|p| filter.matches(*p)).cloned())
    }

    async fn list_products(&self, query: &Query) -> StoreResult<Vec<Product>> {
        Ok(select(&self.tables.read().products, query))
    }

    async fn create_product(&self, product: Product) -> StoreResult<Product> {
        let mut tables = self.tables.write();
        if tables.product_slug_taken(product.client_id, &product.slug, None) {
            return Err(StoreError::Duplicate(format!(
                "product slug '{}' for client {}",
                product.slug, product.client_id
            )));
        }
        tables.products.push(product.clone());
        Ok(product)
    }

    async fn update_product(&self, id: Uuid, patch: &ProductPatch) -> StoreResult<Product> {
        let mut tables = self.tables.write();
        let current = tables
            .products
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("product {id}")))?;
        let client_id = patch.client_id.unwrap_or(current.client_id);
        let slug = patch.slug.clone().unwrap_or_else(|| current.slug.clone());
        if tables.product_slug_taken(client_id, &slug, Some(id)) {
            return Err(StoreError::Duplicate(format!(
                "product slug '{slug}' for client {client_id}"
            )));
        }

        let product = tables
            .products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("product {id}")))?;
        patch.apply(product);
        product.updated_at = shared::util::now();
        Ok(product.clone())
    }

    async fn update_products_where(
        &self,
        filter: &Filter,
        patch: &ProductPatch,
    ) -> StoreResult<u64> {
        let mut tables = self.tables.write();
        let now = shared::util::now();
        let mut written = 0;
        for product in tables.products.iter_mut().filter(|p| filter.matches(&**p)) {
            patch.apply(product);
            product.updated_at = now;
            written += 1;
        }
        Ok(written)
    }

    async fn delete_product(&self, id: Uuid) -> StoreResult<()> {
        let mut tables = self.tables.write();
        let before = tables.products.len();
        tables.products.retain(|p| p.id != id);
        if tables.products.len() == before {
            return Err(StoreError::NotFound(format!("product {id}")));
        }
        Ok(())
    }

    async fn count_products(&self, filter: &Filter) -> StoreResult<i64> {
        let tables = self.tables.read();
        Ok(tables.products.iter().filter(|p| filter.matches(*p)).count() as i64)
    }

    async fn group_count_products(
        &self,
        filter: &Filter,
        by: Column,
    ) -> StoreResult<Vec<GroupCount>> {
        let tables = self.tables.read();
        let mut groups: BTreeMap<Option<String>, i64> = BTreeMap::new();
        for product in tables.products.iter().filter(|p| filter.matches(*p)) {
            let key = product.field(by).map(|v| v.to_key());
            *groups.entry(key).or_default() += 1;
        }
        Ok(groups
            .into_iter()
            .map(|(key, count)| GroupCount { key, count })
            .collect())
    }

    async fn increment_product_counter(
        &self,
        id: Uuid,
        counter: ProductCounter,
    ) -> StoreResult<Product> {
        let mut tables = self.tables.write();
        let product = tables
            .products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("product {id}")))?;
        match counter {
            ProductCounter::Views => product.views += 1,
            ProductCounter::FavoritesCount => product.favorites_count += 1,
            ProductCounter::NutritionInteractions => product.nutrition_interactions += 1,
        }
        Ok(product.clone())
    }

    async fn find_category(&self, filter: &Filter) -> StoreResult<Option<Category>> {
        let tables = self.tables.read();
        Ok(tables.categories.iter().find(|c| filter.matches(*c)).cloned())
    }

    async fn list_categories(&self, query: &Query) -> StoreResult<Vec<Category>> {
        Ok(select(&self.tables.read().categories, query))
    }

    async fn create_category(&self, category: Category) -> StoreResult<Category> {
        let mut tables = self.tables.write();
        if tables.category_name_taken(category.client_id, &category.name, None) {
            return Err(StoreError::Duplicate(format!(
                "category '{}' for client {}",
                category.name, category.client_id
            )));
        }
        tables.categories.push(category.clone());
        Ok(category)
    }

    async fn update_category(&self, id: Uuid, patch: &CategoryUpdate) -> StoreResult<Category> {
        let mut tables = self.tables.write();
        let client_id = tables
            .categories
            .iter()
            .find(|c| c.id == id)
            .map(|c| c.client_id)
            .ok_or_else(|| StoreError::NotFound(format!("category {id}")))?;
        if let Some(name) = &patch.name
            && tables.category_name_taken(client_id, name, Some(id))
        {
            return Err(StoreError::Duplicate(format!(
                "category '{name}' for client {client_id}"
            )));
        }
        let category = tables
            .categories
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("category {id}")))?;
        apply_category_update(category, patch);
        Ok(category.clone())
    }

    async fn update_categories_where(
        &self,
        filter: &Filter,
        patch: &CategoryUpdate,
    ) -> StoreResult<u64> {
        let mut tables = self.tables.write();
        let mut written = 0;
        for category in tables.categories.iter_mut().filter(|c| filter.matches(&**c)) {
            apply_category_update(category, patch);
            written += 1;
        }
        Ok(written)
    }

    async fn delete_category(&self, id: Uuid) -> StoreResult<()> {
        let mut tables = self.tables.write();
        let before = tables.categories.len();
        tables.categories.retain(|c| c.id != id);
        if tables.categories.len() == before {
            return Err(StoreError::NotFound(format!("category {id}")));
        }
        Ok(())
    }

    async fn append_interaction(&self, new: NewInteraction) -> StoreResult<ProductInteraction> {
        let mut tables = self.tables.write();
        let row = ProductInteraction {
            id: tables.interactions.len() as i64 + 1,
            product_id: new.product_id,
            kind: new.kind,
            ip_address: new.ip_address,
            user_agent: new.user_agent,
            created_at: shared::util::now(),
        };
        tables.interactions.push(row.clone());
        Ok(row)
    }

    async fn count_interactions(&self, product_id: Uuid) -> StoreResult<Vec<InteractionStat>> {
        let tables = self.tables.read();
        let mut counts: BTreeMap<&'static str, InteractionStat> = BTreeMap::new();
        for row in tables
            .interactions
            .iter()
            .filter(|i| i.product_id == product_id)
        {
            counts
                .entry(row.kind.as_str())
                .or_insert(InteractionStat {
                    kind: row.kind,
                    count: 0,
                })
                .count += 1;
        }
        Ok(counts.into_values().collect())
    }
}
