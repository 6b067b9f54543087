//! Catalog business logic
//!
//! Services are free functions over `&AppState`. Primary writes return their
//! errors; follow-up work (mirroring, propagation, category sync) is logged
//! and swallowed.

pub mod category;
pub mod category_sync;
pub mod client;
pub mod global;
pub mod interaction;
pub mod propagation;
