//! Client endpoints, including the per-client product and category collections

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post, put},
};
use shared::models::{
    Category, CategoryCreate, CategorySummary, Client, ClientCreate, ClientImport, ClientSummary,
    ClientUpdate, ImportResult, Product, ProductInput,
};
use uuid::Uuid;

use super::ApiResult;
use crate::services::{category, category_sync, client, propagation};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/clients", get(list).post(create))
        .route("/api/clients/bulk", post(bulk_import))
        .route("/api/clients/by-slug/{slug}", get(get_by_slug))
        .route("/api/clients/by-slug/{slug}/products", get(list_products_by_slug))
        .route("/api/clients/{id}", put(update))
        .route("/api/clients/{id}/visit", post(visit))
        .route(
            "/api/clients/{id}/products",
            get(list_products).post(upsert_product),
        )
        .route(
            "/api/clients/{id}/categories",
            get(list_categories).post(create_category),
        )
        .route("/api/clients/{id}/categories/sync", post(sync_categories))
}

/// GET /api/clients
pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<ClientSummary>> {
    Ok(Json(client::list_clients(&state).await?))
}

/// POST /api/clients
pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<ClientCreate>,
) -> ApiResult<Client> {
    Ok(Json(client::create_client(&state, payload).await?))
}

/// POST /api/clients/bulk - per-entry results, never fails as a whole
pub async fn bulk_import(
    State(state): State<AppState>,
    Json(entries): Json<Vec<ClientImport>>,
) -> ApiResult<Vec<ImportResult>> {
    Ok(Json(client::bulk_import(&state, entries).await))
}

/// GET /api/clients/by-slug/{slug}
pub async fn get_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Client> {
    Ok(Json(client::get_client_by_slug(&state, &slug).await?))
}

/// GET /api/clients/by-slug/{slug}/products
pub async fn list_products_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Vec<Product>> {
    Ok(Json(
        propagation::list_products_by_client_slug(&state, &slug).await?,
    ))
}

/// PUT /api/clients/{id}
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ClientUpdate>,
) -> ApiResult<Client> {
    Ok(Json(client::update_client(&state, id, payload).await?))
}

/// POST /api/clients/{id}/visit
pub async fn visit(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Client> {
    Ok(Json(client::track_visit(&state, id).await?))
}

/// GET /api/clients/{id}/products
pub async fn list_products(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Vec<Product>> {
    Ok(Json(propagation::list_products(&state, id).await?))
}

/// POST /api/clients/{id}/products - create or update by name slug
pub async fn upsert_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ProductInput>,
) -> ApiResult<Product> {
    Ok(Json(propagation::upsert_product(&state, id, payload).await?))
}

/// GET /api/clients/{id}/categories
pub async fn list_categories(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Vec<CategorySummary>> {
    Ok(Json(category::list_categories(&state, id).await?))
}

/// POST /api/clients/{id}/categories
pub async fn create_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CategoryCreate>,
) -> ApiResult<Category> {
    Ok(Json(category::create_category(&state, id, payload).await?))
}

/// POST /api/clients/{id}/categories/sync
pub async fn sync_categories(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<serde_json::Value> {
    client::get_client(&state, id).await?;
    let created = category_sync::reconcile(&state, id).await?;
    Ok(Json(serde_json::json!({ "created": created })))
}
