//! Product endpoints

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use http::HeaderMap;
use shared::models::{
    InteractionInput, InteractionStat, Product, ProductInteraction, ProductUpdate,
};
use uuid::Uuid;

use super::{ApiResult, request_info};
use crate::services::{interaction, propagation};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/products/{id}",
            get(get_by_id).put(update).delete(delete),
        )
        .route(
            "/api/products/{id}/interactions",
            get(interaction_stats).post(record_interaction),
        )
}

/// GET /api/products/{id}
pub async fn get_by_id(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Product> {
    Ok(Json(propagation::get_product(&state, id).await?))
}

/// PUT /api/products/{id}
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ProductUpdate>,
) -> ApiResult<Product> {
    Ok(Json(propagation::update_product(&state, id, payload).await?))
}

/// DELETE /api/products/{id}
pub async fn delete(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Product> {
    Ok(Json(propagation::delete_product(&state, id).await?))
}

/// POST /api/products/{id}/interactions
pub async fn record_interaction(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(payload): Json<InteractionInput>,
) -> ApiResult<ProductInteraction> {
    let kind = interaction::parse_kind(&payload.kind)?;
    let (row, _) =
        interaction::record_interaction(&state, id, kind, request_info(&headers)).await?;
    Ok(Json(row))
}

/// GET /api/products/{id}/interactions
pub async fn interaction_stats(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Vec<InteractionStat>> {
    Ok(Json(interaction::interaction_stats(&state, id).await?))
}
