//! Unified service-layer error type for catalog-cloud
//!
//! `ServiceError` bridges store errors and the API-layer error (`AppError`),
//! so services use `?` everywhere and handlers convert once at the boundary.

use axum::response::IntoResponse;
use shared::InvalidNameError;
use shared::error::{AppError, ErrorCode};
use thiserror::Error;
use uuid::Uuid;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// Referenced entity is absent
    #[error("{1}")]
    NotFound(ErrorCode, String),

    /// Missing or malformed input
    #[error("{1}")]
    Validation(ErrorCode, String),

    /// Unique key already taken
    #[error("{1}")]
    Conflict(ErrorCode, String),

    /// Side-channel failure (mirror, propagation, category sync); logged, never surfaced
    #[error("Propagation failed: {0}")]
    Propagation(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ServiceError {
    pub fn client_not_found(key: impl std::fmt::Display) -> Self {
        Self::NotFound(ErrorCode::ClientNotFound, format!("Client {key} not found"))
    }

    pub fn product_not_found(id: Uuid) -> Self {
        Self::NotFound(ErrorCode::ProductNotFound, format!("Product {id} not found"))
    }

    pub fn category_not_found(id: Uuid) -> Self {
        Self::NotFound(
            ErrorCode::CategoryNotFound,
            format!("Category {id} not found"),
        )
    }

    /// Wrap a side-channel failure with the step it came from
    pub fn propagation(step: &str, err: impl std::fmt::Display) -> Self {
        Self::Propagation(format!("{step}: {err}"))
    }

    pub fn invalid_name(code: ErrorCode, err: InvalidNameError) -> Self {
        Self::Validation(code, err.to_string())
    }
}

impl From<InvalidNameError> for ServiceError {
    fn from(err: InvalidNameError) -> Self {
        Self::Validation(ErrorCode::ValidationFailed, err.to_string())
    }
}

impl From<ServiceError> for AppError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::NotFound(code, msg)
            | ServiceError::Validation(code, msg)
            | ServiceError::Conflict(code, msg) => AppError::with_message(code, msg),
            ServiceError::Propagation(msg) => {
                AppError::with_message(ErrorCode::PropagationFailed, msg)
            }
            ServiceError::Store(StoreError::NotFound(what)) => AppError::not_found(what),
            ServiceError::Store(StoreError::Duplicate(what)) => {
                AppError::conflict(format!("Duplicate {what}"))
            }
            ServiceError::Store(StoreError::Database(err)) => {
                tracing::error!(error = %err, "Service database error");
                AppError::new(ErrorCode::DatabaseError)
            }
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> axum::response::Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
