//! Catalog-wide maintenance jobs

use axum::{Json, Router, extract::State, routing::post};

use super::ApiResult;
use crate::services::category;
use crate::services::category_sync::{self, ReconcileSummary};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/maintenance/reconcile", post(reconcile_all))
        .route("/api/maintenance/emojis/resync", post(resync_emojis))
        .route("/api/maintenance/emojis/repair", post(repair_emojis))
}

/// POST /api/maintenance/reconcile
pub async fn reconcile_all(State(state): State<AppState>) -> ApiResult<ReconcileSummary> {
    Ok(Json(category_sync::reconcile_all(&state).await?))
}

/// POST /api/maintenance/emojis/resync
pub async fn resync_emojis(State(state): State<AppState>) -> ApiResult<serde_json::Value> {
    let updated = category::resync_emojis_from_global(&state).await?;
    Ok(Json(serde_json::json!({ "updated": updated })))
}

/// POST /api/maintenance/emojis/repair
pub async fn repair_emojis(State(state): State<AppState>) -> ApiResult<serde_json::Value> {
    let updated = category::repair_inferred_emojis(&state).await?;
    Ok(Json(serde_json::json!({ "updated": updated })))
}
