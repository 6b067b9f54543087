//! Product propagation engine
//!
//! Two tiers of products:
//! - **global**: rows owned by the global catalog client, the metadata source
//! - **local**: per-client copies, linked to a global row by
//!   `parent_product_id` or, for legacy rows without a link, by equal slug
//!
//! ```text
//! upsert_product(client, input)
//!   ├── write local row (parent metadata seeded when linking)
//!   ├── mirror into the global catalog          (best effort)
//!   ├── reconcile categories                    (best effort)
//!   └── live: product:updated
//!
//! update_product(id, update)
//!   ├── market_price on a local row ──► update the linked global row's price
//!   ├── merge update into the row
//!   ├── row is global ──► push metadata to linked + legacy copies (best effort)
//!   └── live: product:updated
//! ```
//!
//! Primary writes are awaited and their failures returned. Everything after
//! the primary write is a follow-up step: failures are logged as
//! `ServiceError::Propagation` and never reach the caller, and nothing is
//! retried. Nothing here is transactional across rows.

use shared::error::ErrorCode;
use shared::models::{Product, ProductAction, ProductInput, ProductUpdate};
use shared::util::non_blank;
use std::collections::BTreeSet;
use uuid::Uuid;

use crate::error::{ServiceError, ServiceResult};
use crate::services::category_sync;
use crate::services::global::GlobalClientId;
use crate::state::AppState;
use crate::store::{CatalogStore, Column, Filter, Order, ProductPatch, Query};

fn log_side_effect(err: ServiceError) {
    tracing::warn!(error = %err, "Catalog side effect failed");
}

/// Copy the shared metadata of a global product onto a write payload
fn seed_from_parent(patch: &mut ProductPatch, parent: &Product) {
    if parent.description.is_some() {
        patch.description = parent.description.clone();
    }
    if parent.category.is_some() {
        patch.category = parent.category.clone();
    }
    if parent.emoji.is_some() {
        patch.emoji = parent.emoji.clone();
    }
    if parent.image.is_some() {
        patch.image = parent.image.clone();
    }
    patch.nutrition = Some(parent.nutrition.clone());
    patch.benefits = Some(parent.benefits.clone());
    patch.tags = Some(parent.tags.clone());
    patch.helps_with = Some(parent.helps_with.clone());
    patch.parent_product_id = Some(parent.id);
}

/// Look up the product a link request points at; only global products qualify
async fn find_parent(
    store: &dyn CatalogStore,
    global: Option<GlobalClientId>,
    parent_id: Uuid,
) -> ServiceResult<Option<Product>> {
    let Some(parent) = store.find_product(&Filter::id(parent_id)).await? else {
        tracing::warn!(parent_product_id = %parent_id, "Parent product not found, creating unlinked");
        return Ok(None);
    };
    if !global.is_some_and(|g| g.is(parent.client_id)) {
        tracing::warn!(
            parent_product_id = %parent_id,
            client_id = %parent.client_id,
            "Parent product is not in the global catalog, creating unlinked"
        );
        return Ok(None);
    }
    Ok(Some(parent))
}

/// Create or update the product `(client_id, slugify(name))`
pub async fn upsert_product(
    state: &AppState,
    client_id: Uuid,
    input: ProductInput,
) -> ServiceResult<Product> {
    let store = state.store();

    let name = non_blank(Some(&input.name)).ok_or_else(|| {
        ServiceError::Validation(ErrorCode::ProductNameInvalid, "Product name is required".into())
    })?;
    let slug = shared::slugify(name)
        .map_err(|e| ServiceError::invalid_name(ErrorCode::ProductNameInvalid, e))?;

    store
        .find_client(&Filter::id(client_id))
        .await?
        .ok_or_else(|| ServiceError::client_not_found(client_id))?;

    let global = state.global.find(store).await?;
    let target_is_global = global.is_some_and(|g| g.is(client_id));

    let existing = store
        .find_product(&Filter::client(client_id).and(Filter::eq(Column::Slug, slug.as_str())))
        .await?;

    let mut patch = ProductPatch::from(&input);
    patch.slug = Some(slug.clone());

    // Linking: only when the local row is new or still unlinked
    if let Some(parent_id) = input.parent_product_id
        && !target_is_global
        && existing.as_ref().is_none_or(|p| p.parent_product_id.is_none())
        && let Some(parent) = find_parent(store, global, parent_id).await?
    {
        seed_from_parent(&mut patch, &parent);
        patch.price = input
            .client_price
            .or(input.price)
            .or(existing.as_ref().map(|p| p.price))
            .or(Some(parent.price));
    }

    let (product, action) = match &existing {
        Some(local) => {
            let updated = store.update_product(local.id, &patch).await?;
            (updated, ProductAction::Update)
        }
        None => {
            let price = patch.price.ok_or_else(|| {
                ServiceError::Validation(ErrorCode::RequiredField, "Product price is required".into())
            })?;
            let mut product = Product::new(client_id, name, slug.as_str());
            patch.price = Some(price);
            patch.apply(&mut product);
            (store.create_product(product).await?, ProductAction::Create)
        }
    };

    tracing::info!(
        client_id = %client_id,
        product_id = %product.id,
        slug = %product.slug,
        action = ?action,
        "Product upserted"
    );

    // Follow-up steps
    let mut mirror_created_in = None;
    if !target_is_global {
        match ensure_global_mirror(state, &product, input.market_price).await {
            Ok(created) => mirror_created_in = created,
            Err(e) => log_side_effect(ServiceError::propagation("global mirror", e)),
        }
    }

    if let Err(e) = category_sync::reconcile(state, client_id).await {
        log_side_effect(ServiceError::propagation("category sync", e));
    }
    if let Some(global_id) = mirror_created_in
        && let Err(e) = category_sync::reconcile(state, global_id).await
    {
        log_side_effect(ServiceError::propagation("global category sync", e));
    }

    state.live.product_changed(action, &product);
    Ok(product)
}

/// Make sure the global catalog has a product with `source.slug`.
///
/// Returns the global client id when a mirror row was created.
async fn ensure_global_mirror(
    state: &AppState,
    source: &Product,
    market_price: Option<f64>,
) -> ServiceResult<Option<Uuid>> {
    let store = state.store();
    let global = state.global.resolve(store).await?;

    let mirror = store
        .find_product(&Filter::client(global.0).and(Filter::eq(Column::Slug, source.slug.as_str())))
        .await?;

    match mirror {
        None => {
            let mut mirror = Product::new(global.0, source.name.as_str(), source.slug.as_str());
            mirror.category = source.category.clone();
            mirror.emoji = source.emoji.clone();
            mirror.description = source.description.clone();
            mirror.unit = source.unit.clone();
            mirror.image = source.image.clone();
            mirror.images = source.images.clone();
            mirror.nutrition = source.nutrition.clone();
            mirror.benefits = source.benefits.clone();
            mirror.tags = source.tags.clone();
            mirror.helps_with = source.helps_with.clone();
            mirror.price = market_price.unwrap_or(source.price);
            mirror.market_price = market_price;

            let mirror = store.create_product(mirror).await?;
            tracing::info!(
                product_id = %mirror.id,
                slug = %mirror.slug,
                source_client_id = %source.client_id,
                "Global mirror created"
            );
            Ok(Some(global.0))
        }
        Some(mirror) => {
            if let Some(price) = market_price {
                store
                    .update_product(mirror.id, &ProductPatch::price(price))
                    .await?;
                tracing::debug!(product_id = %mirror.id, price, "Global mirror price updated");
            }
            Ok(None)
        }
    }
}

/// Merge `update` into product `id` and propagate when it is global
pub async fn update_product(
    state: &AppState,
    id: Uuid,
    update: ProductUpdate,
) -> ServiceResult<Product> {
    let store = state.store();
    let product = store
        .find_product(&Filter::id(id))
        .await?
        .ok_or_else(|| ServiceError::product_not_found(id))?;

    if let Some(name) = &update.name
        && name.trim().is_empty()
    {
        return Err(ServiceError::Validation(
            ErrorCode::ProductNameInvalid,
            "Product name must not be empty".into(),
        ));
    }

    let global = state.global.find(store).await?;
    let is_global = global.is_some_and(|g| g.is(product.client_id));

    // Market price edited from a store view edits the canonical record
    if let Some(market_price) = update.market_price
        && !is_global
        && let Some(global) = global
        && let Err(e) = edit_linked_global_price(state, global, &product, market_price).await
    {
        log_side_effect(ServiceError::propagation("global price edit", e));
    }

    let category_changed = update.category.is_some();
    let updated = store
        .update_product(id, &ProductPatch::from(update))
        .await?;

    if is_global && let Err(e) = propagate_from_global(state, &updated).await {
        log_side_effect(ServiceError::propagation("metadata propagation", e));
    }
    if category_changed && let Err(e) = category_sync::reconcile(state, updated.client_id).await {
        log_side_effect(ServiceError::propagation("category sync", e));
    }

    state.live.product_changed(ProductAction::Update, &updated);
    Ok(updated)
}

/// Global row a local product mirrors: explicit link first, then equal slug
async fn linked_global(
    store: &dyn CatalogStore,
    global: GlobalClientId,
    product: &Product,
) -> ServiceResult<Option<Product>> {
    if let Some(parent_id) = product.parent_product_id
        && let Some(parent) = store
            .find_product(&Filter::id(parent_id).and(Filter::client(global.0)))
            .await?
    {
        return Ok(Some(parent));
    }
    Ok(store
        .find_product(&Filter::client(global.0).and(Filter::eq(Column::Slug, product.slug.as_str())))
        .await?)
}

async fn edit_linked_global_price(
    state: &AppState,
    global: GlobalClientId,
    product: &Product,
    market_price: f64,
) -> ServiceResult<()> {
    let store = state.store();
    let Some(target) = linked_global(store, global, product).await? else {
        tracing::debug!(product_id = %product.id, "No global product linked, market price kept local");
        return Ok(());
    };

    let updated = store
        .update_product(target.id, &ProductPatch::price(market_price))
        .await?;
    tracing::info!(
        product_id = %updated.id,
        source_product_id = %product.id,
        price = market_price,
        "Global price updated from store view"
    );

    if let Err(e) = propagate_from_global(state, &updated).await {
        log_side_effect(ServiceError::propagation("metadata propagation", e));
    }
    state.live.product_changed(ProductAction::Update, &updated);
    Ok(())
}

/// Linked copies plus unlinked copies sharing the slug, outside the global client
fn copies_of(global: &Product) -> Filter {
    Filter::ne(Column::ClientId, global.client_id).and(Filter::Or(vec![
        Filter::eq(Column::ParentProductId, global.id),
        Filter::eq(Column::Slug, global.slug.as_str()).and(Filter::IsNull(Column::ParentProductId)),
    ]))
}

/// Push the global-controlled metadata of `global` to its copies.
///
/// Per-client `price` is never touched. Returns the number of copies written.
pub async fn propagate_from_global(state: &AppState, global: &Product) -> ServiceResult<u64> {
    let store = state.store();
    let filter = copies_of(global);

    let affected_clients: BTreeSet<Uuid> = store
        .list_products(&Query::new(filter.clone()))
        .await?
        .into_iter()
        .map(|p| p.client_id)
        .collect();
    if affected_clients.is_empty() {
        return Ok(0);
    }

    let written = store
        .update_products_where(&filter, &ProductPatch::propagated_from(global))
        .await?;
    tracing::info!(
        product_id = %global.id,
        slug = %global.slug,
        copies = written,
        clients = affected_clients.len(),
        "Global metadata propagated"
    );

    if global.category.is_some() {
        for client_id in affected_clients {
            if let Err(e) = category_sync::reconcile(state, client_id).await {
                log_side_effect(ServiceError::propagation("category sync", e));
            }
        }
    }
    Ok(written)
}

// ── Reads / deletes ──

pub async fn get_product(state: &AppState, id: Uuid) -> ServiceResult<Product> {
    state
        .store()
        .find_product(&Filter::id(id))
        .await?
        .ok_or_else(|| ServiceError::product_not_found(id))
}

/// Products of a client ordered by name
pub async fn list_products(state: &AppState, client_id: Uuid) -> ServiceResult<Vec<Product>> {
    Ok(state
        .store()
        .list_products(&Query::new(Filter::client(client_id)).order_by(Order::Asc(Column::Name)))
        .await?)
}

pub async fn list_products_by_client_slug(
    state: &AppState,
    slug: &str,
) -> ServiceResult<Vec<Product>> {
    let client = state
        .store()
        .find_client(&Filter::eq(Column::Slug, slug))
        .await?
        .ok_or_else(|| ServiceError::client_not_found(slug))?;
    list_products(state, client.id).await
}

/// Delete one product; copies linked to it keep their dangling reference
pub async fn delete_product(state: &AppState, id: Uuid) -> ServiceResult<Product> {
    let product = get_product(state, id).await?;
    state.store().delete_product(id).await?;
    tracing::info!(product_id = %id, client_id = %product.client_id, "Product deleted");
    state.live.product_changed(ProductAction::Delete, &product);
    Ok(product)
}
