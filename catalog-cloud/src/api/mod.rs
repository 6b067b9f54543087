//! API routes for catalog-cloud
//!
//! Handlers are thin: extract, call one service function, wrap the result
//! in `Json`. `ServiceError` converts to `AppError` at the `?`.

pub mod categories;
pub mod clients;
pub mod health;
pub mod live_ws;
pub mod maintenance;
pub mod products;

use axum::Json;
use axum::Router;
use http::HeaderMap;
use shared::error::AppError;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::services::interaction::RequestInfo;
use crate::state::AppState;

type ApiResult<T> = Result<Json<T>, AppError>;

/// Create the combined router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(clients::router())
        .merge(products::router())
        .merge(categories::router())
        .merge(maintenance::router())
        .merge(live_ws::router())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Client address (first `X-Forwarded-For` hop) and user agent of a request
fn request_info(headers: &HeaderMap) -> RequestInfo {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    RequestInfo {
        ip_address: header("x-forwarded-for")
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string),
        user_agent: header("user-agent").map(str::to_string),
    }
}
