//! PostgreSQL `CatalogStore`
//!
//! Predicates are compiled with `sqlx::QueryBuilder`; column names come from
//! the closed `Column` enum, every operand is a bind parameter.

use async_trait::async_trait;
use shared::models::{
    Category, CategoryUpdate, Client, ClientUpdate, InteractionStat, Product, ProductInteraction,
};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{
    CatalogStore, Column, Filter, GroupCount, NewInteraction, Order, ProductCounter, ProductPatch,
    Query, StoreError, StoreResult, Value,
};

const CLIENT_COLUMNS: &str = "id, name, slug, description, logo, cover_image, theme_color, \
     is_active, views, created_at, updated_at";

const PRODUCT_COLUMNS: &str = "id, client_id, name, slug, category, emoji, description, price, \
     market_price, unit, image, images, is_active, views, favorites_count, \
     nutrition_interactions, nutrition, benefits, tags, helps_with, parent_product_id, \
     created_at, updated_at";

const CATEGORY_COLUMNS: &str = "id, client_id, name, emoji, created_at, updated_at";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect and run embedded migrations
    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        let pool = PgPool::connect(database_url).await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

// ── Query compilation ──

fn push_value(qb: &mut QueryBuilder<'_, Postgres>, value: &Value) {
    match value {
        Value::Uuid(v) => qb.push_bind(*v),
        Value::Text(v) => qb.push_bind(v.clone()),
        Value::Bool(v) => qb.push_bind(*v),
        Value::Time(v) => qb.push_bind(*v),
    };
}

/// `%needle%` with LIKE metacharacters escaped
fn like_pattern(needle: &str) -> String {
    let escaped = needle
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &Filter) {
    match filter {
        Filter::All => {
            qb.push("TRUE");
        }
        Filter::Eq(col, v) => {
            qb.push(col.as_sql()).push(" = ");
            push_value(qb, v);
        }
        Filter::Ne(col, v) => {
            qb.push(col.as_sql()).push(" IS DISTINCT FROM ");
            push_value(qb, v);
        }
        Filter::IsNull(col) => {
            qb.push(col.as_sql()).push(" IS NULL");
        }
        Filter::ILike(col, needle) => {
            qb.push(col.as_sql())
                .push(" ILIKE ")
                .push_bind(like_pattern(needle));
        }
        Filter::In(_, values) if values.is_empty() => {
            qb.push("FALSE");
        }
        Filter::In(col, values) => {
            qb.push(col.as_sql()).push(" IN (");
            for (i, v) in values.iter().enumerate() {
                if i > 0 {
                    qb.push(", ");
                }
                push_value(qb, v);
            }
            qb.push(")");
        }
        Filter::And(parts) if parts.is_empty() => {
            qb.push("TRUE");
        }
        Filter::Or(parts) if parts.is_empty() => {
            qb.push("FALSE");
        }
        Filter::And(parts) | Filter::Or(parts) => {
            let joiner = if matches!(filter, Filter::And(_)) {
                " AND "
            } else {
                " OR "
            };
            qb.push("(");
            for (i, part) in parts.iter().enumerate() {
                if i > 0 {
                    qb.push(joiner);
                }
                push_filter(qb, part);
            }
            qb.push(")");
        }
    }
}

fn push_query(qb: &mut QueryBuilder<'_, Postgres>, query: &Query) {
    qb.push(" WHERE ");
    push_filter(qb, &query.filter);
    match query.order {
        Some(Order::Asc(col)) => {
            qb.push(" ORDER BY ").push(col.as_sql()).push(" ASC");
        }
        Some(Order::Desc(col)) => {
            qb.push(" ORDER BY ").push(col.as_sql()).push(" DESC");
        }
        None => {}
    }
    if let Some(limit) = query.limit {
        qb.push(" LIMIT ").push_bind(limit);
    }
}

fn select(table: &str, columns: &str, query: &Query) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!("SELECT {columns} FROM {table}"));
    push_query(&mut qb, query);
    qb
}

/// Appends `, col = $n` for every present patch field
fn push_product_patch(qb: &mut QueryBuilder<'_, Postgres>, patch: &ProductPatch) {
    macro_rules! set {
        ($($field:ident),*) => {
            $(if let Some(v) = &patch.$field {
                qb.push(concat!(", ", stringify!($field), " = ")).push_bind(v.clone());
            })*
        };
    }
    macro_rules! set_json {
        ($($field:ident),*) => {
            $(if let Some(v) = &patch.$field {
                qb.push(concat!(", ", stringify!($field), " = ")).push_bind(Json(v.clone()));
            })*
        };
    }
    set!(
        client_id,
        name,
        slug,
        category,
        emoji,
        description,
        price,
        market_price,
        unit,
        image,
        is_active,
        parent_product_id
    );
    set_json!(images, nutrition, benefits, tags, helps_with);
}

fn push_category_patch(qb: &mut QueryBuilder<'_, Postgres>, patch: &CategoryUpdate) {
    if let Some(name) = &patch.name {
        qb.push(", name = ").push_bind(name.clone());
    }
    if let Some(emoji) = &patch.emoji {
        qb.push(", emoji = ").push_bind(emoji.clone());
    }
}

fn not_found(what: &str, id: Uuid) -> StoreError {
    StoreError::NotFound(format!("{what} {id}"))
}

#[async_trait]
impl CatalogStore for PgStore {
    async fn find_client(&self, filter: &Filter) -> StoreResult<Option<Client>> {
        let query = Query::new(filter.clone()).limit(1);
        let client = select("clients", CLIENT_COLUMNS, &query)
            .build_query_as::<Client>()
            .fetch_optional(&self.pool)
            .await?;
        Ok(client)
    }

    async fn list_clients(&self, query: &Query) -> StoreResult<Vec<Client>> {
        let clients = select("clients", CLIENT_COLUMNS, query)
            .build_query_as::<Client>()
            .fetch_all(&self.pool)
            .await?;
        Ok(clients)
    }

    async fn create_client(&self, client: Client) -> StoreResult<Client> {
        let row = sqlx::query_as::<_, Client>(&format!(
            r#"
            INSERT INTO clients (
                id, name, slug, description, logo, cover_image, theme_color,
                is_active, views, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {CLIENT_COLUMNS}
            "#
        ))
        .bind(client.id)
        .bind(&client.name)
        .bind(&client.slug)
        .bind(&client.description)
        .bind(&client.logo)
        .bind(&client.cover_image)
        .bind(&client.theme_color)
        .bind(client.is_active)
        .bind(client.views)
        .bind(client.created_at)
        .bind(client.updated_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn update_client(&self, id: Uuid, patch: &ClientUpdate) -> StoreResult<Client> {
        let mut qb = QueryBuilder::<Postgres>::new("UPDATE clients SET updated_at = NOW()");
        if let Some(v) = &patch.name {
            qb.push(", name = ").push_bind(v.clone());
        }
        if let Some(v) = &patch.slug {
            qb.push(", slug = ").push_bind(v.clone());
        }
        if let Some(v) = &patch.description {
            qb.push(", description = ").push_bind(v.clone());
        }
        if let Some(v) = &patch.logo {
            qb.push(", logo = ").push_bind(v.clone());
        }
        if let Some(v) = &patch.cover_image {
            qb.push(", cover_image = ").push_bind(v.clone());
        }
        if let Some(v) = &patch.theme_color {
            qb.push(", theme_color = ").push_bind(v.clone());
        }
        if let Some(v) = patch.is_active {
            qb.push(", is_active = ").push_bind(v);
        }
        qb.push(" WHERE id = ")
            .push_bind(id)
            .push(" RETURNING ")
            .push(CLIENT_COLUMNS);
        qb.build_query_as::<Client>()
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| not_found("client", id))
    }

    async fn increment_client_views(&self, id: Uuid) -> StoreResult<Client> {
        sqlx::query_as::<_, Client>(&format!(
            "UPDATE clients SET views = views + 1 WHERE id = $1 RETURNING {CLIENT_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| not_found("client", id))
    }

    async fn find_product(&self, filter: &Filter) -> StoreResult<Option<Product>> {
        let query = Query::new(filter.clone()).limit(1);
        let product = select("products", PRODUCT_COLUMNS, &query)
            .build_query_as::<Product>()
            .fetch_optional(&self.pool)
            .await?;
        Ok(product)
    }

    async fn list_products(&self, query: &Query) -> StoreResult<Vec<Product>> {
        let products = select("products", PRODUCT_COLUMNS, query)
            .build_query_as::<Product>()
            .fetch_all(&self.pool)
            .await?;
        Ok(products)
    }

    async fn create_product(&self, p: Product) -> StoreResult<Product> {
        let row = sqlx::query_as::<_, Product>(&format!(
            r#"
            INSERT INTO products (
                id, client_id, name, slug, category, emoji, description, price,
                market_price, unit, image, images, is_active, views, favorites_count,
                nutrition_interactions, nutrition, benefits, tags, helps_with,
                parent_product_id, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15,
                    $16, $17, $18, $19, $20, $21, $22, $23)
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(p.id)
        .bind(p.client_id)
        .bind(&p.name)
        .bind(&p.slug)
        .bind(&p.category)
        .bind(&p.emoji)
        .bind(&p.description)
        .bind(p.price)
        .bind(p.market_price)
        .bind(&p.unit)
        .bind(&p.image)
        .bind(Json(&p.images))
        .bind(p.is_active)
        .bind(p.views)
        .bind(p.favorites_count)
        .bind(p.nutrition_interactions)
        .bind(Json(&p.nutrition))
        .bind(Json(&p.benefits))
        .bind(Json(&p.tags))
        .bind(Json(&p.helps_with))
        .bind(p.parent_product_id)
        .bind(p.created_at)
        .bind(p.updated_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn update_product(&self, id: Uuid, patch: &ProductPatch) -> StoreResult<Product> {
        let mut qb = QueryBuilder::<Postgres>::new("UPDATE products SET updated_at = NOW()");
        push_product_patch(&mut qb, patch);
        qb.push(" WHERE id = ")
            .push_bind(id)
            .push(" RETURNING ")
            .push(PRODUCT_COLUMNS);
        qb.build_query_as::<Product>()
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| not_found("product", id))
    }

    async fn update_products_where(
        &self,
        filter: &Filter,
        patch: &ProductPatch,
    ) -> StoreResult<u64> {
        let mut qb = QueryBuilder::<Postgres>::new("UPDATE products SET updated_at = NOW()");
        push_product_patch(&mut qb, patch);
        qb.push(" WHERE ");
        push_filter(&mut qb, filter);
        let result = qb.build().execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn delete_product(&self, id: Uuid) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(not_found("product", id));
        }
        Ok(())
    }

    async fn count_products(&self, filter: &Filter) -> StoreResult<i64> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM products WHERE ");
        push_filter(&mut qb, filter);
        let (count,): (i64,) = qb.build_query_as().fetch_one(&self.pool).await?;
        Ok(count)
    }

    async fn group_count_products(
        &self,
        filter: &Filter,
        by: Column,
    ) -> StoreResult<Vec<GroupCount>> {
        let column = by.as_sql();
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {column}::text AS key, COUNT(*) AS count FROM products WHERE "
        ));
        push_filter(&mut qb, filter);
        qb.push(" GROUP BY ").push(column);
        let rows: Vec<(Option<String>, i64)> =
            qb.build_query_as().fetch_all(&self.pool).await?;
        Ok(rows
            .into_iter()
            .map(|(key, count)| GroupCount { key, count })
            .collect())
    }

    async fn increment_product_counter(
        &self,
        id: Uuid,
        counter: ProductCounter,
    ) -> StoreResult<Product> {
        let column = counter.as_sql();
        sqlx::query_as::<_, Product>(&format!(
            "UPDATE products SET {column} = {column} + 1 WHERE id = $1 RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| not_found("product", id))
    }

    async fn find_category(&self, filter: &Filter) -> StoreResult<Option<Category>> {
        let query = Query::new(filter.clone()).limit(1);
        let category = select("categories", CATEGORY_COLUMNS, &query)
            .build_query_as::<Category>()
            .fetch_optional(&self.pool)
            .await?;
        Ok(category)
    }

    async fn list_categories(&self, query: &Query) -> StoreResult<Vec<Category>> {
        let categories = select("categories", CATEGORY_COLUMNS, query)
            .build_query_as::<Category>()
            .fetch_all(&self.pool)
            .await?;
        Ok(categories)
    }

    async fn create_category(&self, c: Category) -> StoreResult<Category> {
        let row = sqlx::query_as::<_, Category>(&format!(
            r#"
            INSERT INTO categories (id, client_id, name, emoji, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {CATEGORY_COLUMNS}
            "#
        ))
        .bind(c.id)
        .bind(c.client_id)
        .bind(&c.name)
        .bind(&c.emoji)
        .bind(c.created_at)
        .bind(c.updated_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn update_category(&self, id: Uuid, patch: &CategoryUpdate) -> StoreResult<Category> {
        let mut qb = QueryBuilder::<Postgres>::new("UPDATE categories SET updated_at = NOW()");
        push_category_patch(&mut qb, patch);
        qb.push(" WHERE id = ")
            .push_bind(id)
            .push(" RETURNING ")
            .push(CATEGORY_COLUMNS);
        qb.build_query_as::<Category>()
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| not_found("category", id))
    }

    async fn update_categories_where(
        &self,
        filter: &Filter,
        patch: &CategoryUpdate,
    ) -> StoreResult<u64> {
        let mut qb = QueryBuilder::<Postgres>::new("UPDATE categories SET updated_at = NOW()");
        push_category_patch(&mut qb, patch);
        qb.push(" WHERE ");
        push_filter(&mut qb, filter);
        let result = qb.build().execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn delete_category(&self, id: Uuid) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(not_found("category", id));
        }
        Ok(())
    }

    async fn append_interaction(&self, new: NewInteraction) -> StoreResult<ProductInteraction> {
        let row = sqlx::query_as::<_, ProductInteraction>(
            r#"
            INSERT INTO product_interactions (product_id, kind, ip_address, user_agent)
            VALUES ($1, $2, $3, $4)
            RETURNING id, product_id, kind, ip_address, user_agent, created_at
            "#,
        )
        .bind(new.product_id)
        .bind(new.kind)
        .bind(&new.ip_address)
        .bind(&new.user_agent)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn count_interactions(&self, product_id: Uuid) -> StoreResult<Vec<InteractionStat>> {
        let rows: Vec<(shared::models::InteractionKind, i64)> = sqlx::query_as(
            r#"
            SELECT kind, COUNT(*) FROM product_interactions
            WHERE product_id = $1
            GROUP BY kind
            ORDER BY kind
            "#,
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|(kind, count)| InteractionStat { kind, count })
            .collect())
    }
}
