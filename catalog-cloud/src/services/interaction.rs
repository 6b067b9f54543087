//! Interaction tracking
//!
//! The log row is appended first, then the product's counter is bumped.
//! The two writes are separate; a failure between them leaves the counter
//! one behind the log.

use shared::error::ErrorCode;
use shared::models::{InteractionKind, InteractionStat, Product, ProductInteraction};
use uuid::Uuid;

use crate::error::{ServiceError, ServiceResult};
use crate::state::AppState;
use crate::store::{CatalogStore, Filter, NewInteraction, ProductCounter, StoreError};

/// Request metadata stored with an interaction
#[derive(Debug, Clone, Default)]
pub struct RequestInfo {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// Parse the wire name of an interaction type
pub fn parse_kind(raw: &str) -> ServiceResult<InteractionKind> {
    raw.trim()
        .parse()
        .map_err(|msg| ServiceError::Validation(ErrorCode::InteractionTypeInvalid, msg))
}

pub async fn record_interaction(
    state: &AppState,
    product_id: Uuid,
    kind: InteractionKind,
    info: RequestInfo,
) -> ServiceResult<(ProductInteraction, Product)> {
    let store = state.store();
    store
        .find_product(&Filter::id(product_id))
        .await?
        .ok_or_else(|| ServiceError::product_not_found(product_id))?;

    let row = store
        .append_interaction(NewInteraction {
            product_id,
            kind,
            ip_address: info.ip_address,
            user_agent: info.user_agent,
        })
        .await?;

    let product = match store
        .increment_product_counter(product_id, ProductCounter::from(kind))
        .await
    {
        Ok(p) => p,
        Err(StoreError::NotFound(_)) => return Err(ServiceError::product_not_found(product_id)),
        Err(e) => return Err(e.into()),
    };

    tracing::debug!(product_id = %product_id, kind = %kind, "Interaction recorded");
    Ok((row, product))
}

/// Count per interaction type, zero for types never recorded
pub async fn interaction_stats(
    state: &AppState,
    product_id: Uuid,
) -> ServiceResult<Vec<InteractionStat>> {
    let store = state.store();
    store
        .find_product(&Filter::id(product_id))
        .await?
        .ok_or_else(|| ServiceError::product_not_found(product_id))?;

    let counted = store.count_interactions(product_id).await?;
    Ok(InteractionKind::ALL
        .into_iter()
        .map(|kind| InteractionStat {
            kind,
            count: counted
                .iter()
                .find(|s| s.kind == kind)
                .map_or(0, |s| s.count),
        })
        .collect())
}
