//! Data models
//!
//! Shared between the cloud service and API consumers.
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All entity IDs are UUID v4; interaction log rows use a BIGSERIAL id.

pub mod category;
pub mod client;
pub mod interaction;
pub mod product;

// Re-exports
pub use category::*;
pub use client::*;
pub use interaction::*;
pub use product::*;
