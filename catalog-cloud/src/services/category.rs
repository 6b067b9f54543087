//! Category CRUD and emoji maintenance
//!
//! Category rows of the global client are the canonical emoji source. An
//! emoji edit on a global category is pushed to every non-global category
//! with the same (exact) name.

use serde::Serialize;
use shared::error::ErrorCode;
use shared::models::{Category, CategoryCreate, CategorySummary, CategoryUpdate};
use shared::util::non_blank;
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::{ServiceError, ServiceResult};
use crate::live::CATEGORY_UPDATED;
use crate::state::AppState;
use crate::store::{CatalogStore, Column, Filter, Order, Query, StoreError};

/// Category write as broadcast to live subscribers
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "lowercase")]
enum CategoryAction {
    Create,
    Update,
    Delete,
}

#[derive(Serialize)]
struct CategoryChange<'a> {
    action: CategoryAction,
    category: &'a Category,
}

fn notify(state: &AppState, action: CategoryAction, category: &Category) {
    state.live.broadcast(
        CATEGORY_UPDATED,
        Some(category.client_id),
        CategoryChange { action, category },
    );
}

fn name_taken(client_id: Uuid, name: &str) -> ServiceError {
    ServiceError::Conflict(
        ErrorCode::CategoryNameExists,
        format!("Category '{name}' already exists for client {client_id}"),
    )
}

async fn find(store: &dyn CatalogStore, id: Uuid) -> ServiceResult<Category> {
    store
        .find_category(&Filter::id(id))
        .await?
        .ok_or_else(|| ServiceError::category_not_found(id))
}

/// Categories of a client ordered by name, each with its product count
pub async fn list_categories(
    state: &AppState,
    client_id: Uuid,
) -> ServiceResult<Vec<CategorySummary>> {
    let store = state.store();
    let categories = store
        .list_categories(&Query::new(Filter::client(client_id)).order_by(Order::Asc(Column::Name)))
        .await?;

    let counts: HashMap<String, i64> = store
        .group_count_products(&Filter::client(client_id), Column::Category)
        .await?
        .into_iter()
        .filter_map(|g| g.key.map(|k| (k, g.count)))
        .collect();

    Ok(categories
        .into_iter()
        .map(|category| CategorySummary {
            products_count: counts.get(&category.name).copied().unwrap_or(0),
            category,
        })
        .collect())
}

pub async fn create_category(
    state: &AppState,
    client_id: Uuid,
    data: CategoryCreate,
) -> ServiceResult<Category> {
    let store = state.store();
    let name = non_blank(Some(&data.name)).ok_or_else(|| {
        ServiceError::Validation(ErrorCode::RequiredField, "Category name is required".into())
    })?;

    store
        .find_client(&Filter::id(client_id))
        .await?
        .ok_or_else(|| ServiceError::client_not_found(client_id))?;

    let emoji = non_blank(data.emoji.as_deref())
        .unwrap_or_else(|| shared::infer_emoji(name))
        .to_string();

    let category = match store
        .create_category(Category::new(client_id, name, emoji))
        .await
    {
        Ok(c) => c,
        Err(StoreError::Duplicate(_)) => return Err(name_taken(client_id, name)),
        Err(e) => return Err(e.into()),
    };

    tracing::info!(client_id = %client_id, category = %category.name, emoji = %category.emoji, "Category created");
    notify(state, CategoryAction::Create, &category);
    Ok(category)
}

/// Merge `data` into the category; a global emoji edit fans out by name
pub async fn update_category(
    state: &AppState,
    id: Uuid,
    mut data: CategoryUpdate,
) -> ServiceResult<Category> {
    let store = state.store();
    let current = find(store, id).await?;

    if let Some(name) = &data.name {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(ServiceError::Validation(
                ErrorCode::RequiredField,
                "Category name must not be empty".into(),
            ));
        }
        data.name = Some(trimmed.to_string());
    }

    let updated = match store.update_category(id, &data).await {
        Ok(c) => c,
        Err(StoreError::Duplicate(_)) => {
            return Err(name_taken(current.client_id, data.name.as_deref().unwrap_or_default()));
        }
        Err(e) => return Err(e.into()),
    };

    if let Some(emoji) = &data.emoji {
        match propagate_emoji(state, &updated, emoji).await {
            Ok(0) => {}
            Ok(n) => tracing::info!(category = %updated.name, emoji = %emoji, copies = n, "Global category emoji propagated"),
            Err(e) => tracing::warn!(
                error = %ServiceError::propagation("category emoji", e),
                "Catalog side effect failed"
            ),
        }
    }

    notify(state, CategoryAction::Update, &updated);
    Ok(updated)
}

/// Push `emoji` to same-named categories when `category` is global
async fn propagate_emoji(state: &AppState, category: &Category, emoji: &str) -> ServiceResult<u64> {
    let store = state.store();
    let Some(global) = state.global.find(store).await? else {
        return Ok(0);
    };
    if !global.is(category.client_id) {
        return Ok(0);
    }

    let filter = Filter::eq(Column::Name, category.name.as_str())
        .and(Filter::ne(Column::ClientId, global.0));
    let patch = CategoryUpdate {
        emoji: Some(emoji.to_string()),
        ..Default::default()
    };
    Ok(store.update_categories_where(&filter, &patch).await?)
}

pub async fn delete_category(state: &AppState, id: Uuid) -> ServiceResult<Category> {
    let store = state.store();
    let category = find(store, id).await?;
    store.delete_category(id).await?;
    tracing::info!(category_id = %id, client_id = %category.client_id, "Category deleted");
    notify(state, CategoryAction::Delete, &category);
    Ok(category)
}

/// Copy global category emojis onto non-global categories whose name matches
/// case-insensitively; returns how many rows changed
pub async fn resync_emojis_from_global(state: &AppState) -> ServiceResult<usize> {
    let store = state.store();
    let Some(global) = state.global.find(store).await? else {
        tracing::info!("No global catalog, emoji resync skipped");
        return Ok(0);
    };

    let canonical: HashMap<String, String> = store
        .list_categories(&Query::new(Filter::client(global.0)))
        .await?
        .into_iter()
        .map(|c| (c.name.to_lowercase(), c.emoji))
        .collect();
    if canonical.is_empty() {
        return Ok(0);
    }

    let locals = store
        .list_categories(&Query::new(Filter::ne(Column::ClientId, global.0)))
        .await?;

    let mut updated = 0;
    for category in locals {
        let Some(emoji) = canonical.get(&category.name.to_lowercase()) else {
            continue;
        };
        if *emoji == category.emoji {
            continue;
        }
        rewrite_emoji(state, &category, emoji).await?;
        updated += 1;
    }

    tracing::info!(updated, "Category emojis resynced from global catalog");
    Ok(updated)
}

/// Re-run inference on every category and store it when it yields a
/// non-default emoji that differs; returns how many rows changed
pub async fn repair_inferred_emojis(state: &AppState) -> ServiceResult<usize> {
    let categories = state.store().list_categories(&Query::all()).await?;

    let mut updated = 0;
    for category in categories {
        let inferred = shared::infer_emoji(&category.name);
        if inferred == shared::DEFAULT_EMOJI || inferred == category.emoji {
            continue;
        }
        rewrite_emoji(state, &category, inferred).await?;
        updated += 1;
    }

    tracing::info!(updated, "Category emojis repaired by inference");
    Ok(updated)
}

async fn rewrite_emoji(state: &AppState, category: &Category, emoji: &str) -> ServiceResult<()> {
    let patch = CategoryUpdate {
        emoji: Some(emoji.to_string()),
        ..Default::default()
    };
    let updated = state.store().update_category(category.id, &patch).await?;
    tracing::debug!(
        category_id = %updated.id,
        category = %updated.name,
        from = %category.emoji,
        to = %updated.emoji,
        "Category emoji rewritten"
    );
    notify(state, CategoryAction::Update, &updated);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::{Client, Product};

    async fn client(state: &AppState, slug: &str) -> Client {
        state.store().create_client(Client::new(slug, slug)).await.unwrap()
    }

    async fn global(state: &AppState) -> Uuid {
        state.global.resolve(state.store()).await.unwrap().0
    }

    async fn category(state: &AppState, client_id: Uuid, name: &str, emoji: &str) -> Category {
        create_category(
            state,
            client_id,
            CategoryCreate {
                name: name.into(),
                emoji: Some(emoji.into()),
            },
        )
        .await
        .unwrap()
    }

    async fn emoji_of(state: &AppState, id: Uuid) -> String {
        find(state.store(), id).await.unwrap().emoji
    }

    #[tokio::test]
    async fn test_create_infers_emoji_and_rejects_duplicates() {
        let state = AppState::in_memory();
        let a = client(&state, "loja-a").await;

        let created = create_category(
            &state,
            a.id,
            CategoryCreate {
                name: "  Chás ".into(),
                emoji: Some("   ".into()),
            },
        )
        .await
        .unwrap();
        assert_eq!(created.name, "Chás");
        assert_eq!(created.emoji, "🍵");

        let err = create_category(
            &state,
            a.id,
            CategoryCreate {
                name: "Chás".into(),
                emoji: None,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(ErrorCode::CategoryNameExists, _)));

        let err = create_category(&state, a.id, CategoryCreate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(ErrorCode::RequiredField, _)));

        let err = create_category(
            &state,
            Uuid::new_v4(),
            CategoryCreate {
                name: "Chás".into(),
                emoji: None,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(ErrorCode::ClientNotFound, _)));
    }

    #[tokio::test]
    async fn test_list_with_product_counts() {
        let state = AppState::in_memory();
        let a = client(&state, "loja-a").await;
        for (name, cat) in [("Camomila", "Chás"), ("Hortelã", "Chás"), ("Mel", "Doces")] {
            let mut p = Product::new(a.id, name, shared::slugify(name).unwrap());
            p.category = Some(cat.into());
            state.store().create_product(p).await.unwrap();
        }
        category(&state, a.id, "Doces", "🍯").await;
        category(&state, a.id, "Chás", "🍵").await;
        category(&state, a.id, "Vazia", "📦").await;

        let listed: Vec<_> = list_categories(&state, a.id)
            .await
            .unwrap()
            .into_iter()
            .map(|s| (s.category.name, s.products_count))
            .collect();
        assert_eq!(
            listed,
            [("Chás".to_string(), 2), ("Doces".to_string(), 1), ("Vazia".to_string(), 0)]
        );
    }

    #[tokio::test]
    async fn test_global_emoji_update_propagates_by_name() {
        let state = AppState::in_memory();
        let gid = global(&state).await;
        let a = client(&state, "loja-a").await;
        let b = client(&state, "loja-b").await;

        let canonical = category(&state, gid, "Chás", "🍵").await;
        let same_a = category(&state, a.id, "Chás", "🍵").await;
        let same_b = category(&state, b.id, "Chás", "☕").await;
        let other_case = category(&state, b.id, "chás", "🍵").await;

        let mut rx = state.live.subscribe(Some(gid));
        update_category(
            &state,
            canonical.id,
            CategoryUpdate {
                emoji: Some("🫖".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(emoji_of(&state, same_a.id).await, "🫖");
        assert_eq!(emoji_of(&state, same_b.id).await, "🫖");
        assert_eq!(emoji_of(&state, other_case.id).await, "🍵");

        let event = rx.recv().await.unwrap();
        assert_eq!(event.event, CATEGORY_UPDATED);
        assert_eq!(event.payload["action"], "update");
        assert_eq!(event.payload["category"]["emoji"], "🫖");
    }

    #[tokio::test]
    async fn test_local_emoji_update_stays_local() {
        let state = AppState::in_memory();
        let gid = global(&state).await;
        let a = client(&state, "loja-a").await;
        let b = client(&state, "loja-b").await;

        let canonical = category(&state, gid, "Chás", "🍵").await;
        let local_a = category(&state, a.id, "Chás", "🍵").await;
        let local_b = category(&state, b.id, "Chás", "🍵").await;

        update_category(
            &state,
            local_a.id,
            CategoryUpdate {
                emoji: Some("☕".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(emoji_of(&state, local_a.id).await, "☕");
        assert_eq!(emoji_of(&state, local_b.id).await, "🍵");
        assert_eq!(emoji_of(&state, canonical.id).await, "🍵");
    }

    #[tokio::test]
    async fn test_rename_conflict_and_delete() {
        let state = AppState::in_memory();
        let a = client(&state, "loja-a").await;
        let chas = category(&state, a.id, "Chás", "🍵").await;
        category(&state, a.id, "Temperos", "🌶️").await;

        let err = update_category(
            &state,
            chas.id,
            CategoryUpdate {
                name: Some("Temperos".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(ErrorCode::CategoryNameExists, _)));

        delete_category(&state, chas.id).await.unwrap();
        let err = delete_category(&state, chas.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(ErrorCode::CategoryNotFound, _)));
    }

    #[tokio::test]
    async fn test_resync_matches_names_case_insensitively() {
        let state = AppState::in_memory();
        let gid = global(&state).await;
        let a = client(&state, "loja-a").await;

        category(&state, gid, "Chás", "🫖").await;
        let lower = category(&state, a.id, "chás", "🍵").await;
        let already = category(&state, client(&state, "loja-b").await.id, "CHÁS", "🫖").await;
        let unrelated = category(&state, a.id, "Doces", "🍬").await;

        assert_eq!(resync_emojis_from_global(&state).await.unwrap(), 1);
        assert_eq!(emoji_of(&state, lower.id).await, "🫖");
        assert_eq!(emoji_of(&state, already.id).await, "🫖");
        assert_eq!(emoji_of(&state, unrelated.id).await, "🍬");
    }

    #[tokio::test]
    async fn test_resync_without_global_catalog() {
        let state = AppState::in_memory();
        let a = client(&state, "loja-a").await;
        category(&state, a.id, "Chás", "📦").await;
        assert_eq!(resync_emojis_from_global(&state).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_repair_only_rewrites_non_default_differences() {
        let state = AppState::in_memory();
        let a = client(&state, "loja-a").await;
        let wrong = category(&state, a.id, "Chás", "📦").await;
        let right = category(&state, a.id, "Temperos", shared::infer_emoji("Temperos")).await;
        let unknown = category(&state, a.id, "Diversos", "⭐").await;

        assert_eq!(repair_inferred_emojis(&state).await.unwrap(), 1);
        assert_eq!(emoji_of(&state, wrong.id).await, "🍵");
        assert_eq!(emoji_of(&state, right.id).await, shared::infer_emoji("Temperos"));
        assert_eq!(emoji_of(&state, unknown.id).await, "⭐");
    }
}
