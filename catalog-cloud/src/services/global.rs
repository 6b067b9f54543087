//! Global catalog tenant handle
//!
//! The global client is resolved by slug once and cached for the life of the
//! process. `resolve` creates the tenant on first use; `find` never does, so
//! read paths treat a missing global catalog as "nothing to propagate".

use shared::models::{Client, GLOBAL_CATALOG_NAME};
use std::sync::Arc;
use tokio::sync::OnceCell;
use uuid::Uuid;

use crate::error::ServiceResult;
use crate::store::{CatalogStore, Column, Filter, StoreError};

/// Id of the global catalog client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GlobalClientId(pub Uuid);

impl GlobalClientId {
    pub fn is(&self, client_id: Uuid) -> bool {
        self.0 == client_id
    }
}

#[derive(Clone)]
pub struct GlobalCatalog {
    slug: Arc<str>,
    id: Arc<OnceCell<GlobalClientId>>,
}

impl GlobalCatalog {
    pub fn new(slug: &str) -> Self {
        Self {
            slug: Arc::from(slug),
            id: Arc::new(OnceCell::new()),
        }
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    /// Global client id, creating the tenant if it does not exist yet
    pub async fn resolve(&self, store: &dyn CatalogStore) -> ServiceResult<GlobalClientId> {
        let id = self.id.get_or_try_init(|| self.find_or_create(store)).await?;
        Ok(*id)
    }

    /// Global client id if the tenant exists; never creates it
    pub async fn find(&self, store: &dyn CatalogStore) -> ServiceResult<Option<GlobalClientId>> {
        if let Some(id) = self.id.get() {
            return Ok(Some(*id));
        }
        let Some(client) = self.lookup(store).await? else {
            return Ok(None);
        };
        let id = GlobalClientId(client.id);
        let _ = self.id.set(id);
        Ok(Some(id))
    }

    async fn find_or_create(&self, store: &dyn CatalogStore) -> ServiceResult<GlobalClientId> {
        if let Some(client) = self.lookup(store).await? {
            return Ok(GlobalClientId(client.id));
        }
        match store
            .create_client(Client::new(GLOBAL_CATALOG_NAME, self.slug()))
            .await
        {
            Ok(created) => {
                tracing::info!(client_id = %created.id, slug = %created.slug, "Global catalog client created");
                Ok(GlobalClientId(created.id))
            }
            // Lost a creation race; the row exists now
            Err(StoreError::Duplicate(_)) => self
                .lookup(store)
                .await?
                .map(|client| GlobalClientId(client.id))
                .ok_or_else(|| StoreError::NotFound(format!("client {}", self.slug())).into()),
            Err(e) => Err(e.into()),
        }
    }

    async fn lookup(&self, store: &dyn CatalogStore) -> ServiceResult<Option<Client>> {
        Ok(store
            .find_client(&Filter::eq(Column::Slug, self.slug()))
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, Query};

    #[tokio::test]
    async fn test_find_does_not_create() {
        let store = MemoryStore::new();
        let global = GlobalCatalog::new("global-catalog");
        assert!(global.find(&store).await.unwrap().is_none());
        assert!(store.list_clients(&Query::all()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_resolve_creates_once() {
        let store = MemoryStore::new();
        let global = GlobalCatalog::new("global-catalog");

        let first = global.resolve(&store).await.unwrap();
        let second = global.resolve(&store).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(global.find(&store).await.unwrap(), Some(first));

        let clients = store.list_clients(&Query::all()).await.unwrap();
        assert_eq!(clients.len(), 1);
        assert_eq!(clients[0].slug, "global-catalog");
    }

    #[tokio::test]
    async fn test_resolve_reuses_existing_client() {
        let store = MemoryStore::new();
        let existing = store
            .create_client(Client::new("Catálogo Global", "global-catalog"))
            .await
            .unwrap();

        let global = GlobalCatalog::new("global-catalog");
        assert_eq!(global.resolve(&store).await.unwrap(), GlobalClientId(existing.id));
    }
}
