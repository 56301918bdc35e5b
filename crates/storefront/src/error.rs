//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//!
//! Every error body is JSON: `{"error": "..."}`, plus a `fields` map of
//! per-field messages for validation failures.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use voltio_core::cart::CartError;
use voltio_core::validation::FieldErrors;

use crate::db::RepositoryError;
use crate::db::orders::OrderError;
use crate::db::settings::SettingsError;
use crate::db::tickets::TicketError;
use crate::services::auth::AuthError;
use crate::services::checkout::CheckoutError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Settings document could not be read or written.
    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Checkout failed.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Order update failed.
    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    /// Ticket update failed.
    #[error("Ticket error: {0}")]
    Ticket(#[from] TicketError),

    /// Cart change rejected.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// One or more fields failed validation.
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// User is authenticated but lacks permission.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Body, query string or path could not be decoded.
    #[error("Malformed request: {message}")]
    Malformed { status: StatusCode, message: String },

    /// Rate limited.
    #[error("Rate limited")]
    RateLimited,

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<FieldErrors> for AppError {
    fn from(errors: FieldErrors) -> Self {
        Self::Validation(errors)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Malformed {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Malformed {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::Malformed {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<tower_sessions::session::Error> for AppError {
    fn from(err: tower_sessions::session::Error) -> Self {
        Self::Internal(format!("session error: {err}"))
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<&'a FieldErrors>,
}

const INTERNAL_MESSAGE: &str = "Internal server error";

fn repository_parts(err: &RepositoryError) -> (StatusCode, String) {
    match err {
        RepositoryError::NotFound => (StatusCode::NOT_FOUND, "Not found".to_string()),
        RepositoryError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
        RepositoryError::Database(_) | RepositoryError::DataCorruption(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE.to_string())
        }
    }
}

impl AppError {
    /// Status code, client-safe message and optional field errors.
    fn parts(&self) -> (StatusCode, String, Option<&FieldErrors>) {
        let (status, message) = match self {
            Self::Database(err) => repository_parts(err),
            Self::Settings(_) | Self::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE.to_string())
            }
            Self::Auth(err) => match err {
                AuthError::Validation(fields) => {
                    return (
                        StatusCode::UNPROCESSABLE_ENTITY,
                        "Please correct the highlighted fields".to_string(),
                        Some(fields),
                    );
                }
                AuthError::InvalidCredentials => {
                    (StatusCode::UNAUTHORIZED, "Invalid email or password".to_string())
                }
                AuthError::UserNotFound => (StatusCode::NOT_FOUND, "User not found".to_string()),
                AuthError::UserAlreadyExists => (StatusCode::CONFLICT, err.to_string()),
                AuthError::Repository(e) => repository_parts(e),
                AuthError::PasswordHash => {
                    (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE.to_string())
                }
            },
            Self::Checkout(err) => match err {
                CheckoutError::Validation(fields) => {
                    return (
                        StatusCode::UNPROCESSABLE_ENTITY,
                        "Please correct the highlighted fields".to_string(),
                        Some(fields),
                    );
                }
                CheckoutError::Maintenance => (StatusCode::SERVICE_UNAVAILABLE, err.to_string()),
                CheckoutError::EmptyCart => (StatusCode::BAD_REQUEST, err.to_string()),
                CheckoutError::ProductUnavailable { .. }
                | CheckoutError::InsufficientStock { .. } => (StatusCode::CONFLICT, err.to_string()),
                CheckoutError::Repository(e) => repository_parts(e),
                CheckoutError::Settings(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE.to_string())
                }
            },
            Self::Order(err) => match err {
                OrderError::Repository(e) => repository_parts(e),
                OrderError::EmptyCart => (StatusCode::BAD_REQUEST, err.to_string()),
                OrderError::ProductUnavailable { .. }
                | OrderError::InsufficientStock { .. }
                | OrderError::Transition(_) => (StatusCode::CONFLICT, err.to_string()),
            },
            Self::Ticket(err) => match err {
                TicketError::Repository(e) => repository_parts(e),
                TicketError::Transition(_) => (StatusCode::CONFLICT, err.to_string()),
            },
            Self::Cart(err) => match err {
                CartError::ZeroQuantity | CartError::LineLimit => {
                    (StatusCode::UNPROCESSABLE_ENTITY, err.to_string())
                }
                CartError::TooManyLines | CartError::InsufficientStock { .. } => {
                    (StatusCode::CONFLICT, err.to_string())
                }
                CartError::NotInCart => (StatusCode::NOT_FOUND, err.to_string()),
            },
            Self::Validation(fields) => {
                return (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "Please correct the highlighted fields".to_string(),
                    Some(fields),
                );
            }
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, format!("Not found: {msg}")),
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            Self::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::Malformed { status, message } => (*status, message.clone()),
            Self::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                "Too many requests, please slow down".to_string(),
            ),
        };
        (status, message, None)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, fields) = self.parts();

        // Capture server errors to Sentry
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else if status.is_client_error() {
            tracing::debug!(error = %self, status = %status, "Request rejected");
        }

        let body = ErrorBody {
            error: message,
            fields,
        };
        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added to cart", Some(&[("product_id", "12")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::to_bytes;
    use voltio_core::TransitionError;

    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    async fn body_json(err: AppError) -> serde_json::Value {
        let body = to_bytes(err.into_response().into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product 123".to_string());
        assert_eq!(err.to_string(), "Not found: product 123");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Forbidden("test".to_string())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(AppError::RateLimited),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(CheckoutError::Maintenance.into()),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            get_status(RepositoryError::Conflict("taken".to_string()).into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::Order(OrderError::Transition(TransitionError {
                from: "entregado",
                to: "pendiente",
            }))),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(CartError::ZeroQuantity.into()),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[tokio::test]
    async fn test_validation_body_lists_fields() {
        let mut fields = FieldErrors::new();
        fields.add("email", "enter a valid email address");
        let body = body_json(fields.into()).await;

        assert_eq!(body["fields"]["email"], "enter a valid email address");
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_internal_details_are_hidden() {
        let body = body_json(AppError::Internal("pool exhausted".to_string())).await;
        assert_eq!(body["error"], "Internal server error");
        assert!(body.get("fields").is_none());
    }
}
