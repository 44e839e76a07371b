use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use sea_orm::DbErr;
use thiserror::Error;

use crate::routes::paths;

/// Application-level error type.
///
/// Form validation failures are not errors: handlers re-render the form
/// with its [`FormErrors`](crate::models::shared::FormErrors) instead.
#[derive(Debug, Error)]
pub enum AppError {
    /// An anonymous visitor hit a login-only route. Carries the original
    /// path so login can send them back.
    #[error("login required for {next}")]
    LoginRequired { next: String },
    #[error("Invalid login details supplied.")]
    InvalidCredentials,
    #[error("Your Rango account is disabled.")]
    AccountDisabled,
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::LoginRequired { next } => {
                Redirect::to(&paths::login_with_next(&next)).into_response()
            }
            AppError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, self.to_string()).into_response()
            }
            AppError::AccountDisabled => (StatusCode::FORBIDDEN, self.to_string()).into_response(),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An unexpected error occurred",
                )
                    .into_response()
            }
        }
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<tera::Error> for AppError {
    fn from(err: tera::Error) -> Self {
        // tera nests the useful part of the message in `source()`.
        let mut detail = err.to_string();
        let mut source = std::error::Error::source(&err);
        while let Some(cause) = source {
            detail.push_str(": ");
            detail.push_str(&cause.to_string());
            source = cause.source();
        }
        AppError::Internal(format!("Template error: {detail}"))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal(format!("I/O error: {err}"))
    }
}
