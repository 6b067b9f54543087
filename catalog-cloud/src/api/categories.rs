//! Category endpoints addressed by category id

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::put,
};
use shared::models::{Category, CategoryUpdate};
use uuid::Uuid;

use super::ApiResult;
use crate::services::category;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/categories/{id}", put(update).delete(delete))
}

/// PUT /api/categories/{id}
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CategoryUpdate>,
) -> ApiResult<Category> {
    Ok(Json(category::update_category(&state, id, payload).await?))
}

/// DELETE /api/categories/{id}
pub async fn delete(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Category> {
    Ok(Json(category::delete_category(&state, id).await?))
}
