//! Unified error codes for the catalog platform
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Client (tenant) errors
//! - 2xxx: Product errors
//! - 3xxx: Category errors
//! - 4xxx: Interaction errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility (Rust, TypeScript, etc.)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,
    /// Required field missing
    RequiredField = 7,

    // ==================== 1xxx: Client ====================
    /// Client not found
    ClientNotFound = 1001,
    /// Client slug already taken
    ClientSlugExists = 1002,
    /// Client name is empty
    ClientNameInvalid = 1003,

    // ==================== 2xxx: Product ====================
    /// Product not found
    ProductNotFound = 2001,
    /// Product name is empty
    ProductNameInvalid = 2002,
    /// Product slug already exists for this client
    ProductSlugExists = 2003,
    /// Referenced parent product not found
    ParentProductNotFound = 2004,

    // ==================== 3xxx: Category ====================
    /// Category not found
    CategoryNotFound = 3001,
    /// Category name already exists for this client
    CategoryNameExists = 3002,

    // ==================== 4xxx: Interaction ====================
    /// Unknown interaction type
    InteractionTypeInvalid = 4001,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Configuration error
    ConfigError = 9005,
    /// Propagation to linked records failed
    PropagationFailed = 9101,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::RequiredField => "Required field is missing",

            // Client
            ErrorCode::ClientNotFound => "Client not found",
            ErrorCode::ClientSlugExists => "Client slug already exists",
            ErrorCode::ClientNameInvalid => "Client name must not be empty",

            // Product
            ErrorCode::ProductNotFound => "Product not found",
            ErrorCode::ProductNameInvalid => "Product name must not be empty",
            ErrorCode::ProductSlugExists => "Product slug already exists for this client",
            ErrorCode::ParentProductNotFound => "Parent product not found in global catalog",

            // Category
            ErrorCode::CategoryNotFound => "Category not found",
            ErrorCode::CategoryNameExists => "Category name already exists",

            // Interaction
            ErrorCode::InteractionTypeInvalid => "Unknown interaction type",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::ConfigError => "Configuration error",
            ErrorCode::PropagationFailed => "Propagation to linked records failed",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            5 => Ok(ErrorCode::InvalidRequest),
            7 => Ok(ErrorCode::RequiredField),

            // Client
            1001 => Ok(ErrorCode::ClientNotFound),
            1002 => Ok(ErrorCode::ClientSlugExists),
            1003 => Ok(ErrorCode::ClientNameInvalid),

            // Product
            2001 => Ok(ErrorCode::ProductNotFound),
            2002 => Ok(ErrorCode::ProductNameInvalid),
            2003 => Ok(ErrorCode::ProductSlugExists),
            2004 => Ok(ErrorCode::ParentProductNotFound),

            // Category
            3001 => Ok(ErrorCode::CategoryNotFound),
            3002 => Ok(ErrorCode::CategoryNameExists),

            // Interaction
            4001 => Ok(ErrorCode::InteractionTypeInvalid),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9005 => Ok(ErrorCode::ConfigError),
            9101 => Ok(ErrorCode::PropagationFailed),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}
