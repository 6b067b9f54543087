//! Shared types for the catalog platform
//!
//! Models, error types and the pure catalog helpers (slug generation and
//! emoji inference) used by the cloud service and its tests.

pub mod emoji;
pub mod error;
pub mod models;
pub mod slug;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};

pub use emoji::{DEFAULT_EMOJI, infer_emoji};
pub use slug::{InvalidNameError, slugify};
