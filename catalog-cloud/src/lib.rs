//! catalog-cloud - multi-tenant product catalog service
//!
//! One distinguished tenant (the global catalog) holds canonical product
//! templates; every other tenant keeps its own copies, linked to a template
//! by `parent_product_id` or by equal slug.
//!
//! ```text
//! catalog-cloud/src/
//! ├── api/        # HTTP routes and handlers, live WebSocket
//! ├── services/   # propagation engine, category sync, CRUD services
//! ├── store/      # CatalogStore trait, PostgreSQL and in-memory backends
//! ├── live/       # broadcast hub for change notifications
//! ├── email/      # verification code delivery interface
//! ├── config.rs
//! ├── error.rs
//! └── state.rs
//! ```

pub mod api;
pub mod config;
pub mod email;
pub mod error;
pub mod live;
pub mod services;
pub mod state;
pub mod store;

pub use config::Config;
pub use error::{ServiceError, ServiceResult};
pub use state::AppState;
pub use store::{CatalogStore, MemoryStore, PgStore};
