use http::StatusCode;
use sea_orm::error::DbErr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::OrderStatus;

/// Stable error categories the presentation layer translates into a
/// protocol-specific response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ErrorCategory {
    NotFound,
    InvalidInput,
    InvalidState,
    InvalidTransaction,
    ExternalFailure,
    SignatureMismatch,
}

/// Error body handed to whatever transport sits in front of the services.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Category tag, e.g. "not_found" or "invalid_state"
    pub error: ErrorCategory,
    /// Human-readable error description
    pub message: String,
    /// ISO 8601 timestamp when the error was rendered
    pub timestamp: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] DbErr),

    #[error("User {0} not found")]
    UserNotFound(Uuid),

    #[error("Table {0} not found")]
    TableNotFound(Uuid),

    #[error("Menu {0} not found")]
    MenuNotFound(Uuid),

    #[error("Transaction not found: {0}")]
    TransactionNotFound(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid quantity: {0}")]
    InvalidQuantity(i64),

    #[error("Invalid price: {0}")]
    InvalidPrice(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid order status: transaction is {current}, expected {expected}")]
    InvalidOrderStatus {
        current: OrderStatus,
        expected: OrderStatus,
    },

    #[error("Invalid transaction: {0}")]
    InvalidTransaction(String),

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("External service error: {0}")]
    ExternalServiceError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

impl ServiceError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::UserNotFound(_)
            | Self::TableNotFound(_)
            | Self::MenuNotFound(_)
            | Self::TransactionNotFound(_)
            | Self::NotFound(_) => ErrorCategory::NotFound,
            Self::InvalidQuantity(_)
            | Self::InvalidPrice(_)
            | Self::InvalidInput(_)
            | Self::ValidationError(_) => ErrorCategory::InvalidInput,
            Self::InvalidOrderStatus { .. } => ErrorCategory::InvalidState,
            Self::InvalidTransaction(_) => ErrorCategory::InvalidTransaction,
            Self::DatabaseError(_) | Self::ExternalServiceError(_) | Self::InternalError(_) => {
                ErrorCategory::ExternalFailure
            }
            Self::InvalidSignature => ErrorCategory::SignatureMismatch,
        }
    }

    /// Returns the HTTP status code for this error.
    /// This is the single source of truth for error-to-status mapping.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::DatabaseError(_) | Self::InvalidTransaction(_) | Self::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::UserNotFound(_)
            | Self::TableNotFound(_)
            | Self::MenuNotFound(_)
            | Self::TransactionNotFound(_)
            | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidQuantity(_)
            | Self::InvalidPrice(_)
            | Self::InvalidInput(_)
            | Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::InvalidOrderStatus { .. } => StatusCode::CONFLICT,
            Self::InvalidSignature => StatusCode::UNAUTHORIZED,
            Self::ExternalServiceError(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Returns the error message suitable for responses.
    /// Internal errors return generic messages to avoid leaking implementation details.
    pub fn response_message(&self) -> String {
        match self {
            Self::DatabaseError(_) => "Database error".to_string(),
            Self::InvalidTransaction(_) | Self::InternalError(_) => {
                "Internal server error".to_string()
            }
            Self::ExternalServiceError(_) => "Payment gateway unavailable".to_string(),
            _ => self.to_string(),
        }
    }

    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            error: self.category(),
            message: self.response_message(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

pub type AppError = ServiceError;
