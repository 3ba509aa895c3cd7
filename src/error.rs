//! Error handling module
//!
//! Centralized error types and HTTP response conversion. Domain errors keep
//! their closed taxonomy; this layer only maps them onto status codes.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::domain::DomainError;

/// Application-wide Result type
pub type AppResult<T> = Result<T, AppError>;

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Missing or invalid identity header: {0}")]
    Unauthenticated(&'static str),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code, details) = match &self {
            // 401 Unauthorized
            AppError::Unauthenticated(header) => (
                StatusCode::UNAUTHORIZED,
                "unauthenticated",
                Some(header.to_string()),
            ),

            AppError::Domain(domain_err) => match domain_err {
                // 400 Bad Request: the request itself is malformed
                DomainError::Validation(err) => (
                    StatusCode::BAD_REQUEST,
                    "validation_error",
                    Some(err.to_string()),
                ),
                DomainError::SelfTransfer => {
                    (StatusCode::BAD_REQUEST, "self_transfer", None)
                }

                // 422 Unprocessable Entity: well-formed but rejected by a
                // business rule
                DomainError::InsufficientBalance { .. } => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "insufficient_balance",
                    Some(domain_err.to_string()),
                ),
                DomainError::DailyLimitExceeded { .. } => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "daily_limit_exceeded",
                    Some(domain_err.to_string()),
                ),
                DomainError::MonthlyLimitExceeded { .. } => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "monthly_limit_exceeded",
                    Some(domain_err.to_string()),
                ),
                DomainError::InvalidTransferStatus { .. } => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "invalid_transfer_status",
                    Some(domain_err.to_string()),
                ),
                DomainError::AccountNotActive { .. } => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "account_not_active",
                    Some(domain_err.to_string()),
                ),
                DomainError::BillAlreadyPaid => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "bill_already_paid", None)
                }
                DomainError::BillCancelled => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "bill_cancelled", None)
                }

                // 403 Forbidden
                DomainError::NotOwner => (StatusCode::FORBIDDEN, "not_owner", None),

                // 404 Not Found
                DomainError::TransferNotFound(id) => (
                    StatusCode::NOT_FOUND,
                    "transfer_not_found",
                    Some(id.to_string()),
                ),
                DomainError::AccountNotFound(id) => (
                    StatusCode::NOT_FOUND,
                    "account_not_found",
                    Some(id.to_string()),
                ),
                DomainError::RecipientNotFound(id) => (
                    StatusCode::NOT_FOUND,
                    "recipient_not_found",
                    Some(id.to_string()),
                ),
                DomainError::BillNotFound(id) => (
                    StatusCode::NOT_FOUND,
                    "bill_not_found",
                    Some(id.to_string()),
                ),

                // 409 Conflict
                DomainError::DuplicateBarcode => {
                    (StatusCode::CONFLICT, "duplicate_barcode", None)
                }

                // 500 Internal Server Error
                DomainError::Storage(e) => {
                    tracing::error!("Storage error: {:?}", e);
                    (StatusCode::INTERNAL_SERVER_ERROR, "storage_error", None)
                }
            },

            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
            AppError::Config(e) => {
                tracing::error!("Config error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "config_error", None)
            }
        };

        let body = ErrorResponse {
            error: self.to_string(),
            error_code: error_code.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}
