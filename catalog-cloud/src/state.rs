//! Application state for catalog-cloud

use std::sync::Arc;

use crate::config::Config;
use crate::email::{CodeSender, LogCodeSender};
use crate::live::LiveHub;
use crate::services::global::GlobalCatalog;
use crate::store::{CatalogStore, MemoryStore, PgStore};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Catalog persistence (PostgreSQL or in-memory)
    pub store: Arc<dyn CatalogStore>,
    /// Cached handle to the global catalog tenant
    pub global: GlobalCatalog,
    /// Live update fan-out
    pub live: LiveHub,
    /// Outbound verification code delivery, for the external sign-in flow
    pub code_sender: Arc<dyn CodeSender>,
}

impl AppState {
    /// Create a new AppState
    pub async fn new(config: &Config) -> Result<Self, BoxError> {
        let store: Arc<dyn CatalogStore> = match &config.database_url {
            Some(url) => {
                let store = PgStore::connect(url).await?;
                tracing::info!("PostgreSQL catalog store ready");
                Arc::new(store)
            }
            None => {
                tracing::warn!("DATABASE_URL not set, using in-memory catalog store");
                Arc::new(MemoryStore::new())
            }
        };
        Ok(Self::with_store(store, config))
    }

    pub fn with_store(store: Arc<dyn CatalogStore>, config: &Config) -> Self {
        Self {
            store,
            global: GlobalCatalog::new(&config.global_catalog_slug),
            live: LiveHub::new(config.live_channel_capacity),
            code_sender: Arc::new(LogCodeSender),
        }
    }

    /// Fresh in-memory state with default configuration
    pub fn in_memory() -> Self {
        Self::with_store(Arc::new(MemoryStore::new()), &Config::default())
    }

    pub fn store(&self) -> &dyn CatalogStore {
        self.store.as_ref()
    }
}
