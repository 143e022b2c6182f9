use axum::{
    extract::rejection::{PathRejection, QueryRejection},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::users::repo::StoreError;

pub const UNAUTHORIZED_DETAIL: &str = "Invalid credentials or expired token";
pub const INVALID_CREDENTIALS_DETAIL: &str = "Incorrect email or password";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    /// Query string or path segment that could not be decoded.
    #[error("{0}")]
    Malformed(String),

    #[error("{0}")]
    Conflict(String),

    /// Missing, invalid or expired bearer token, or a subject that no longer exists.
    #[error("unauthorized")]
    Unauthorized,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate => AppError::Conflict("Record already exists".into()),
            StoreError::Database(e) => AppError::Internal(e.into()),
        }
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Malformed(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::Malformed(rejection.body_text())
    }
}

impl AppError {
    /// A uniqueness violation becomes a user-visible conflict with `message`; anything else is internal.
    pub fn from_store(err: StoreError, message: &str) -> Self {
        match err {
            StoreError::Duplicate => AppError::Conflict(message.into()),
            other => other.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Validation(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "detail": errors })),
            )
                .into_response(),
            AppError::Malformed(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "detail": msg })),
            )
                .into_response(),
            AppError::Conflict(msg) | AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "detail": msg }))).into_response()
            }
            AppError::Unauthorized => {
                let mut res = (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({ "detail": UNAUTHORIZED_DETAIL })),
                )
                    .into_response();
                res.headers_mut()
                    .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
                res
            }
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "detail": INVALID_CREDENTIALS_DETAIL })),
            )
                .into_response(),
            AppError::NotFound(msg) => {
                (StatusCode::NOT_FOUND, Json(json!({ "detail": msg }))).into_response()
            }
            AppError::Internal(e) => {
                error!(error = ?e, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "detail": "Internal server error" })),
                )
                    .into_response()
            }
        }
    }
}
