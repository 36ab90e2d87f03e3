//! Error types for the HTTP API.
//!
//! Every failure leaves the server as `{"error": "<message>"}` with a status
//! derived from the error kind. Storage failures are logged and reported with
//! a generic message.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use shelf_core::{CoreError, ValidationError};
use shelf_db::DbError;
use tracing::error;

/// API errors.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Db(#[from] DbError),

    #[error(transparent)]
    Domain(#[from] CoreError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Db(err) => db_status(err),
            ApiError::Domain(err) => domain_status(err),
            ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn domain_status(err: &CoreError) -> StatusCode {
    match err {
        CoreError::BookNotFound(_) | CoreError::NotInCart { .. } => StatusCode::NOT_FOUND,
        CoreError::InsufficientStock { .. } | CoreError::InvalidOrderTransition { .. } => {
            StatusCode::CONFLICT
        }
        CoreError::EmptyCart
        | CoreError::QuantityTooLarge { .. }
        | CoreError::TotalTooLarge
        | CoreError::Validation(_) => StatusCode::BAD_REQUEST,
    }
}

fn db_status(err: &DbError) -> StatusCode {
    match err {
        DbError::NotFound { .. } => StatusCode::NOT_FOUND,
        DbError::Domain(inner) => domain_status(inner),
        DbError::UniqueViolation { .. }
        | DbError::ForeignKeyViolation { .. }
        | DbError::CheckViolation { .. } => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Don't expose storage details to clients
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(error = %self, "Request failed");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}
