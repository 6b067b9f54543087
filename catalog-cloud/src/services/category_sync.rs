//! Category sync: derive a client's Category rows from its products
//!
//! Category names are compared as exact strings: "Chás" and "chás" are two
//! categories. Existing rows are never renamed, re-emojied or pruned here.

use serde::Serialize;
use shared::models::Category;
use std::collections::{BTreeSet, HashSet};
use uuid::Uuid;

use crate::error::ServiceResult;
use crate::services::global::GlobalClientId;
use crate::state::AppState;
use crate::store::{CatalogStore, Column, Filter, Query, StoreError};

/// Create the missing categories for `client_id`; returns how many were created
pub async fn reconcile(state: &AppState, client_id: Uuid) -> ServiceResult<usize> {
    let store = state.store();

    let products = store
        .list_products(&Query::new(Filter::client(client_id)))
        .await?;
    let names: BTreeSet<String> = products
        .into_iter()
        .filter_map(|p| p.category)
        .filter(|c| !c.trim().is_empty())
        .collect();
    if names.is_empty() {
        return Ok(0);
    }

    let existing: HashSet<String> = store
        .list_categories(&Query::new(Filter::client(client_id)))
        .await?
        .into_iter()
        .map(|c| c.name)
        .collect();

    let global = state.global.find(store).await?;
    let mut created = 0;

    for name in names.into_iter().filter(|n| !existing.contains(n)) {
        let emoji = resolve_emoji(state, global, client_id, &name).await?;
        match store
            .create_category(Category::new(client_id, name.as_str(), emoji.as_str()))
            .await
        {
            Ok(_) => {
                tracing::debug!(client_id = %client_id, category = %name, emoji = %emoji, "Category created");
                created += 1;
            }
            // Concurrent reconcile already created it
            Err(StoreError::Duplicate(_)) => {}
            Err(e) => return Err(e.into()),
        }
    }

    if created > 0 {
        tracing::info!(client_id = %client_id, created, "Categories reconciled");
    }
    Ok(created)
}

/// Global category emoji when one exists under the same name, else inferred
async fn resolve_emoji(
    state: &AppState,
    global: Option<GlobalClientId>,
    client_id: Uuid,
    name: &str,
) -> ServiceResult<String> {
    if let Some(global) = global
        && !global.is(client_id)
        && let Some(category) = state
            .store()
            .find_category(&Filter::client(global.0).and(Filter::eq(Column::Name, name)))
            .await?
    {
        return Ok(category.emoji);
    }
    Ok(shared::infer_emoji(name).to_string())
}

/// Result of reconciling every client
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileSummary {
    pub clients: usize,
    pub categories_created: usize,
    pub failed: usize,
}

/// Reconcile every client; one client failing does not stop the others
pub async fn reconcile_all(state: &AppState) -> ServiceResult<ReconcileSummary> {
    let clients = state.store().list_clients(&Query::all()).await?;
    let mut summary = ReconcileSummary::default();

    for client in clients {
        summary.clients += 1;
        match reconcile(state, client.id).await {
            Ok(n) => summary.categories_created += n,
            Err(e) => {
                summary.failed += 1;
                tracing::warn!(client_id = %client.id, error = %e, "Category reconcile failed");
            }
        }
    }

    tracing::info!(
        clients = summary.clients,
        created = summary.categories_created,
        failed = summary.failed,
        "Reconciled all clients"
    );
    Ok(summary)
}
