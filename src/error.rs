//! Error types and HTTP error response handling.
//!
//! This module defines all application errors and how they are converted
//! into HTTP responses with appropriate status codes and JSON bodies.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::{
    models::customer_token::InvalidReason, services::auth_service::AuthError, store::StoreError,
};

/// Application-wide error type.
///
/// # Error Categories
///
/// - **Validation Errors**: missing fields, empty item lists, bad amounts.
///   Always reported before anything is written.
/// - **Not Found**: order, product, add-on, or token record absent
/// - **Conflict**: the document changed since the caller read it
/// - **Customer Link**: the link is unknown, used, or expired
/// - **Auth Errors**: propagated from the auth provider
/// - **Store Errors**: backend unavailable; never retried here
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Request data breaks a business rule.
    ///
    /// Returns HTTP 400 Bad Request.
    #[error("{0}")]
    Validation(String),

    /// Returns HTTP 404 Not Found.
    #[error("{0} not found")]
    NotFound(String),

    /// Stale revision on a read-modify-write.
    ///
    /// Returns HTTP 409 Conflict. The caller should re-fetch and retry.
    #[error("{0}")]
    Conflict(String),

    /// Customer link cannot be used.
    ///
    /// Returns HTTP 404 for unknown links and 410 Gone for used or
    /// expired ones.
    #[error("Customer link {0}")]
    CustomerLink(InvalidReason),

    /// Returns HTTP 401 Unauthorized, or 500 when the provider itself failed.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Returns HTTP 500 Internal Server Error (hides details from client).
    #[error(transparent)]
    Store(StoreError),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        AppError::NotFound(what.into())
    }
}

/// Store-level not-found and conflict outcomes map onto their own
/// categories; everything else stays a store failure.
impl From<StoreError> for AppError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFound { collection, id } => {
                AppError::NotFound(format!("{} {}", singular(collection.as_str()), id))
            }
            StoreError::Conflict { .. } => AppError::Conflict(
                "The record was changed by someone else; reload and try again".to_string(),
            ),
            other => AppError::Store(other),
        }
    }
}

fn internal_error() -> (StatusCode, &'static str, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "internal_error",
        "An internal error occurred".to_string(),
    )
}

fn singular(collection: &str) -> &str {
    match collection {
        "customer_tokens" => "Customer link",
        "orders" => "Order",
        "products" => "Product",
        "addons" => "Add-on",
        "sessions" => "Session",
        _ => "Record",
    }
}

/// Convert AppError into an HTTP response.
///
/// # Response Format
///
/// All errors return JSON in this format:
/// ```json
/// {
///   "error": {
///     "code": "error_type",
///     "message": "Human-readable error message"
///   }
/// }
/// ```
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Map each error variant to (HTTP status, error code, message)
        let (status, code, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "validation_error", msg.clone()),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found", self.to_string()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg.clone()),
            AppError::CustomerLink(reason) => {
                let status = match reason {
                    InvalidReason::NotFound => StatusCode::NOT_FOUND,
                    InvalidReason::AlreadyUsed | InvalidReason::Expired => StatusCode::GONE,
                };
                (status, "invalid_customer_link", self.to_string())
            }
            AppError::Auth(AuthError::Store(e)) | AppError::Store(e) => {
                tracing::error!(error = %e, "Store failure");
                internal_error()
            }
            AppError::Auth(AuthError::PasswordHash(e)) => {
                tracing::error!(error = %e, "Password hashing failure");
                internal_error()
            }
            AppError::Auth(e @ AuthError::SessionTtl(_)) => {
                tracing::error!(error = %e, "Session could not be created");
                internal_error()
            }
            AppError::Auth(e) => (StatusCode::UNAUTHORIZED, "unauthorized", e.to_string()),
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
