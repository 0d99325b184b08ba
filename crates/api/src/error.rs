//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server errors to Sentry
//! before responding to the client. All route handlers return
//! `Result<T, AppError>`; domain errors convert in via `From`.
//!
//! Status mapping follows the error taxonomy: 404 for absent entities, 400
//! for invalid or conflicting state (empty cart, already paid, bad
//! signature), 503 for transient store failures the caller may retry, 500
//! for everything terminal on the server side.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;
use crate::services::checkout::CheckoutError;
use crate::services::payments::PaymentError;
use crate::services::provider::ProviderError;

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed or out-of-range request data.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Checkout attempted on a cart with no lines.
    #[error("Cart is empty")]
    EmptyCart,

    /// Payment attempted on an already-paid order.
    #[error("Order already paid")]
    AlreadyPaid,

    /// Webhook signature verification failed.
    #[error("Invalid signature")]
    InvalidSignature,

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Payment provider call failed.
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<CheckoutError> for AppError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::CartNotFound => Self::NotFound("cart".to_owned()),
            CheckoutError::EmptyCart => Self::EmptyCart,
            CheckoutError::CorruptQuantity(q) => Self::Database(RepositoryError::DataCorruption(
                format!("invalid cart line quantity: {q}"),
            )),
            CheckoutError::Database(e) => Self::Database(RepositoryError::Database(e)),
        }
    }
}

impl From<PaymentError> for AppError {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::OrderNotFound => Self::NotFound("order".to_owned()),
            PaymentError::AlreadyPaid => Self::AlreadyPaid,
            PaymentError::InvalidSignature => Self::InvalidSignature,
            PaymentError::MalformedEvent(e) => Self::InvalidInput(format!("malformed event: {e}")),
            PaymentError::Database(e) => Self::Database(RepositoryError::Database(e)),
        }
    }
}

impl AppError {
    /// The HTTP status this error maps to.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidInput(_) | Self::EmptyCart | Self::AlreadyPaid | Self::InvalidSignature => {
                StatusCode::BAD_REQUEST
            }
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                AuthError::UserAlreadyExists => StatusCode::CONFLICT,
                AuthError::WeakPassword(_)
                | AuthError::InvalidEmail(_)
                | AuthError::InvalidResetToken => StatusCode::BAD_REQUEST,
                AuthError::Repository(_) | AuthError::PasswordHash => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Provider(_) => StatusCode::BAD_GATEWAY,
            Self::Database(err) if err.is_transient() => StatusCode::SERVICE_UNAVAILABLE,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to expose to the client.
    fn client_message(&self) -> String {
        match self {
            Self::Database(err) if err.is_transient() => {
                "Service temporarily unavailable".to_owned()
            }
            Self::Database(_) | Self::Internal(_) => "Internal server error".to_owned(),
            Self::Provider(_) => "Payment provider error".to_owned(),
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => "Invalid credentials".to_owned(),
                AuthError::UserAlreadyExists => {
                    "An account with this email already exists".to_owned()
                }
                AuthError::WeakPassword(msg) => msg.clone(),
                AuthError::InvalidEmail(_) => "Invalid email address".to_owned(),
                AuthError::InvalidResetToken => "Invalid or expired reset token".to_owned(),
                AuthError::Repository(_) | AuthError::PasswordHash => {
                    "Authentication error".to_owned()
                }
            },
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.status_code().is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = self.status_code();
        let body = Json(json!({ "error": self.client_message() }));

        (status, body).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("order".to_string());
        assert_eq!(err.to_string(), "Not found: order");

        let err = AppError::InvalidInput("quantity must be >= 1".to_string());
        assert_eq!(err.to_string(), "Invalid input: quantity must be >= 1");
    }

    #[test]
    fn test_not_found_is_404() {
        assert_eq!(
            AppError::NotFound("cart".to_string()).status_code(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_precondition_violations_are_400() {
        assert_eq!(AppError::EmptyCart.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::AlreadyPaid.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::InvalidSignature.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::InvalidInput("bad".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_unauthorized_is_401() {
        assert_eq!(
            AppError::Unauthorized("login required".to_string()).status_code(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn test_transient_store_failure_is_503() {
        let err = AppError::Database(RepositoryError::Database(sqlx::Error::PoolTimedOut));
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_terminal_store_failure_is_500() {
        let err = AppError::Database(RepositoryError::DataCorruption("bad row".to_string()));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_checkout_error_mapping() {
        assert_eq!(
            AppError::from(CheckoutError::CartNotFound).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::from(CheckoutError::EmptyCart).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::from(CheckoutError::CorruptQuantity(-1)).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_payment_error_mapping() {
        assert_eq!(
            AppError::from(PaymentError::OrderNotFound).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::from(PaymentError::AlreadyPaid).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::from(PaymentError::InvalidSignature).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_auth_error_mapping() {
        assert_eq!(
            AppError::Auth(AuthError::InvalidCredentials).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Auth(AuthError::UserAlreadyExists).status_code(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_internal_details_not_exposed() {
        let err = AppError::Database(RepositoryError::DataCorruption(
            "secret table details".to_string(),
        ));
        assert_eq!(err.client_message(), "Internal server error");
    }
}
