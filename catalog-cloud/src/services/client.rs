//! Client (tenant) service

use serde::Serialize;
use shared::error::ErrorCode;
use shared::models::{
    Client, ClientCreate, ClientImport, ClientSummary, ClientUpdate, ImportResult,
};
use shared::util::non_blank;
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::{ServiceError, ServiceResult};
use crate::live::CLIENT_UPDATED;
use crate::services::propagation;
use crate::state::AppState;
use crate::store::{CatalogStore, Column, Filter, Order, Query, StoreError};

#[derive(Serialize)]
struct ClientChange<'a> {
    action: &'static str,
    client: &'a Client,
}

fn notify(state: &AppState, action: &'static str, client: &Client) {
    state
        .live
        .broadcast(CLIENT_UPDATED, Some(client.id), ClientChange { action, client });
}

fn slug_taken(slug: &str) -> ServiceError {
    ServiceError::Conflict(
        ErrorCode::ClientSlugExists,
        format!("Client slug '{slug}' already exists"),
    )
}

/// Slug from an explicit value when given, else from the name
fn client_slug(name: &str, explicit: Option<&str>) -> ServiceResult<String> {
    shared::slugify(non_blank(explicit).unwrap_or(name))
        .map_err(|e| ServiceError::invalid_name(ErrorCode::ClientNameInvalid, e))
}

async fn find_by_slug(store: &dyn CatalogStore, slug: &str) -> ServiceResult<Option<Client>> {
    Ok(store.find_client(&Filter::eq(Column::Slug, slug)).await?)
}

pub async fn create_client(state: &AppState, data: ClientCreate) -> ServiceResult<Client> {
    let store = state.store();
    let name = non_blank(Some(&data.name)).ok_or_else(|| {
        ServiceError::Validation(ErrorCode::ClientNameInvalid, "Client name is required".into())
    })?;
    let slug = client_slug(name, data.slug.as_deref())?;

    if find_by_slug(store, &slug).await?.is_some() {
        return Err(slug_taken(&slug));
    }

    let mut client = Client::new(name, slug.as_str());
    client.description = data.description;
    client.logo = data.logo;
    client.cover_image = data.cover_image;
    if let Some(color) = non_blank(data.theme_color.as_deref()) {
        client.theme_color = color.to_string();
    }
    if let Some(active) = data.is_active {
        client.is_active = active;
    }

    let client = match store.create_client(client).await {
        Ok(c) => c,
        Err(StoreError::Duplicate(_)) => return Err(slug_taken(&slug)),
        Err(e) => return Err(e.into()),
    };

    tracing::info!(client_id = %client.id, slug = %client.slug, "Client created");
    notify(state, "create", &client);
    Ok(client)
}

/// All clients ordered by name, each with its product count
pub async fn list_clients(state: &AppState) -> ServiceResult<Vec<ClientSummary>> {
    let store = state.store();
    let clients = store
        .list_clients(&Query::all().order_by(Order::Asc(Column::Name)))
        .await?;
    let counts: HashMap<String, i64> = store
        .group_count_products(&Filter::All, Column::ClientId)
        .await?
        .into_iter()
        .filter_map(|g| g.key.map(|k| (k, g.count)))
        .collect();

    Ok(clients
        .into_iter()
        .map(|client| ClientSummary {
            product_count: counts.get(&client.id.to_string()).copied().unwrap_or(0),
            client,
        })
        .collect())
}

pub async fn get_client(state: &AppState, id: Uuid) -> ServiceResult<Client> {
    state
        .store()
        .find_client(&Filter::id(id))
        .await?
        .ok_or_else(|| ServiceError::client_not_found(id))
}

pub async fn get_client_by_slug(state: &AppState, slug: &str) -> ServiceResult<Client> {
    find_by_slug(state.store(), slug)
        .await?
        .ok_or_else(|| ServiceError::client_not_found(slug))
}

/// Partial merge; the slug only changes when one is sent explicitly
pub async fn update_client(
    state: &AppState,
    id: Uuid,
    mut data: ClientUpdate,
) -> ServiceResult<Client> {
    let store = state.store();
    let current = get_client(state, id).await?;

    if let Some(name) = &data.name {
        let name = non_blank(Some(name)).ok_or_else(|| {
            ServiceError::Validation(
                ErrorCode::ClientNameInvalid,
                "Client name must not be empty".into(),
            )
        })?;
        data.name = Some(name.to_string());
    }

    if let Some(requested) = &data.slug {
        let slug = shared::slugify(requested)
            .map_err(|e| ServiceError::invalid_name(ErrorCode::ClientNameInvalid, e))?;
        if slug != current.slug {
            if current.slug == state.global.slug() {
                return Err(ServiceError::Validation(
                    ErrorCode::InvalidRequest,
                    "The global catalog slug cannot be changed".into(),
                ));
            }
            if find_by_slug(store, &slug).await?.is_some() {
                return Err(slug_taken(&slug));
            }
        }
        data.slug = Some(slug);
    }

    let client = match store.update_client(id, &data).await {
        Ok(c) => c,
        Err(StoreError::Duplicate(_)) => {
            return Err(slug_taken(data.slug.as_deref().unwrap_or_default()));
        }
        Err(e) => return Err(e.into()),
    };

    tracing::info!(client_id = %id, slug = %client.slug, "Client updated");
    notify(state, "update", &client);
    Ok(client)
}

/// Count one storefront visit
pub async fn track_visit(state: &AppState, id: Uuid) -> ServiceResult<Client> {
    match state.store().increment_client_views(id).await {
        Ok(client) => Ok(client),
        Err(StoreError::NotFound(_)) => Err(ServiceError::client_not_found(id)),
        Err(e) => Err(e.into()),
    }
}

/// Import tenants with their products; each entry succeeds or fails on its own
pub async fn bulk_import(state: &AppState, entries: Vec<ClientImport>) -> Vec<ImportResult> {
    let mut results = Vec::with_capacity(entries.len());
    for entry in entries {
        let name = entry.name.clone();
        let result = match import_one(state, entry).await {
            Ok(products) => ImportResult::success(name, products),
            Err(e) => {
                tracing::warn!(client = %name, error = %e, "Bulk import entry failed");
                ImportResult::error(name, e.to_string())
            }
        };
        results.push(result);
    }

    let failed = results
        .iter()
        .filter(|r| r.error.is_some())
        .count();
    tracing::info!(entries = results.len(), failed, "Bulk import finished");
    results
}

async fn import_one(state: &AppState, entry: ClientImport) -> ServiceResult<usize> {
    let name = non_blank(Some(&entry.name)).ok_or_else(|| {
        ServiceError::Validation(ErrorCode::ClientNameInvalid, "Client name is required".into())
    })?;
    let slug = client_slug(name, entry.slug.as_deref())?;

    let client = match find_by_slug(state.store(), &slug).await? {
        Some(client) => client,
        None => {
            create_client(
                state,
                ClientCreate {
                    name: name.to_string(),
                    slug: Some(slug),
                    description: entry.description.clone(),
                    ..Default::default()
                },
            )
            .await?
        }
    };

    let mut written = 0;
    for product in entry.products {
        propagation::upsert_product(state, client.id, product).await?;
        written += 1;
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::{ImportStatus, ProductInput};

    fn create(name: &str) -> ClientCreate {
        ClientCreate {
            name: name.into(),
            ..Default::default()
        }
    }

    fn product(name: &str, price: f64) -> ProductInput {
        ProductInput {
            name: name.into(),
            price: Some(price),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_derives_slug_and_rejects_duplicates() {
        let state = AppState::in_memory();
        let client = create_client(&state, create("Empório São João")).await.unwrap();
        assert_eq!(client.slug, "emporio-sao-joao");
        assert_eq!(client.theme_color, "#1E40AF");

        let err = create_client(&state, create("Empório  São João!")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(ErrorCode::ClientSlugExists, _)));

        let err = create_client(&state, create("  ")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(ErrorCode::ClientNameInvalid, _)));
    }

    #[tokio::test]
    async fn test_explicit_slug_is_normalized() {
        let state = AppState::in_memory();
        let client = create_client(
            &state,
            ClientCreate {
                slug: Some("Loja Central".into()),
                ..create("Empório")
            },
        )
        .await
        .unwrap();
        assert_eq!(client.slug, "loja-central");
        assert_eq!(get_client_by_slug(&state, "loja-central").await.unwrap().id, client.id);
    }

    #[tokio::test]
    async fn test_update_only_reslugs_when_asked() {
        let state = AppState::in_memory();
        let a = create_client(&state, create("Loja A")).await.unwrap();
        create_client(&state, create("Loja B")).await.unwrap();

        let renamed = update_client(
            &state,
            a.id,
            ClientUpdate {
                name: Some("Loja Alfa".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(renamed.name, "Loja Alfa");
        assert_eq!(renamed.slug, "loja-a");

        let err = update_client(
            &state,
            a.id,
            ClientUpdate {
                slug: Some("loja-b".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(ErrorCode::ClientSlugExists, _)));

        let reslugged = update_client(
            &state,
            a.id,
            ClientUpdate {
                slug: Some("Loja Alfa".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(reslugged.slug, "loja-alfa");
    }

    #[tokio::test]
    async fn test_global_slug_is_frozen() {
        let state = AppState::in_memory();
        let gid = state.global.resolve(state.store()).await.unwrap();

        let err = update_client(
            &state,
            gid.0,
            ClientUpdate {
                slug: Some("outro".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(ErrorCode::InvalidRequest, _)));

        let renamed = update_client(
            &state,
            gid.0,
            ClientUpdate {
                name: Some("Catálogo".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(renamed.slug, "global-catalog");
    }

    #[tokio::test]
    async fn test_list_with_product_counts() {
        let state = AppState::in_memory();
        let b = create_client(&state, create("Loja B")).await.unwrap();
        create_client(&state, create("Loja A")).await.unwrap();
        propagation::upsert_product(&state, b.id, product("Chia", 9.0))
            .await
            .unwrap();
        propagation::upsert_product(&state, b.id, product("Linhaça", 7.0))
            .await
            .unwrap();

        let listed: Vec<_> = list_clients(&state)
            .await
            .unwrap()
            .into_iter()
            .map(|s| (s.client.slug, s.product_count))
            .collect();
        assert_eq!(
            listed,
            [
                ("global-catalog".to_string(), 2),
                ("loja-a".to_string(), 0),
                ("loja-b".to_string(), 2),
            ]
        );
    }

    #[tokio::test]
    async fn test_track_visit() {
        let state = AppState::in_memory();
        let a = create_client(&state, create("Loja A")).await.unwrap();
        track_visit(&state, a.id).await.unwrap();
        assert_eq!(track_visit(&state, a.id).await.unwrap().views, 2);

        let err = track_visit(&state, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(ErrorCode::ClientNotFound, _)));
    }

    #[tokio::test]
    async fn test_bulk_import_isolates_failures() {
        let state = AppState::in_memory();
        let existing = create_client(&state, create("Loja A")).await.unwrap();

        let results = bulk_import(
            &state,
            vec![
                ClientImport {
                    name: "Loja A".into(),
                    products: vec![product("Chia", 9.0)],
                    ..Default::default()
                },
                ClientImport {
                    name: "   ".into(),
                    ..Default::default()
                },
                ClientImport {
                    name: "Loja Nova".into(),
                    slug: Some("nova".into()),
                    products: vec![product("Aveia", 5.0), product("Quinoa", 20.0)],
                    ..Default::default()
                },
            ],
        )
        .await;

        let statuses: Vec<_> = results.iter().map(|r| (r.status, r.products)).collect();
        assert_eq!(
            statuses,
            [
                (ImportStatus::Success, 1),
                (ImportStatus::Error, 0),
                (ImportStatus::Success, 2),
            ]
        );
        assert!(results[1].error.is_some());

        let nova = get_client_by_slug(&state, "nova").await.unwrap();
        assert_eq!(nova.name, "Loja Nova");
        assert_eq!(
            propagation::list_products(&state, existing.id).await.unwrap().len(),
            1
        );
    }
}
