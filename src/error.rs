use axum::{
    extract::rejection::{FormRejection, JsonRejection},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use crate::db::StoreError;

pub const CREDENTIALS_MESSAGE: &str = "Could not validate credentials";
pub const LOGIN_MESSAGE: &str = "Incorrect email or password";
pub const EMAIL_TAKEN_MESSAGE: &str = "An account with this email already exists.";

/// Errors surfaced by handlers. Internal detail stays in the logs.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Conflict(String),
    #[error("invalid login credentials")]
    InvalidCredentials,
    #[error("missing, invalid or expired token")]
    Unauthorized,
    #[error("storage failure")]
    Storage(#[source] StoreError),
    #[error("internal failure")]
    Internal(#[from] anyhow::Error),
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub detail: String,
}

/// A conflict reaching this point was not anticipated by the caller, so it is
/// a server error like any other storage failure.
impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        AppError::Storage(e)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(format!("body: {}", rejection.body_text()))
    }
}

impl From<FormRejection> for AppError {
    fn from(rejection: FormRejection) -> Self {
        AppError::Validation(format!("form: {}", rejection.body_text()))
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::InvalidCredentials | AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Storage(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match &self {
            AppError::Validation(msg) | AppError::Conflict(msg) => msg.clone(),
            AppError::InvalidCredentials => LOGIN_MESSAGE.into(),
            AppError::Unauthorized => CREDENTIALS_MESSAGE.into(),
            AppError::Storage(e) => {
                error!(error = %e, "storage error");
                "A database error occurred.".into()
            }
            AppError::Internal(e) => {
                error!(error = ?e, "internal error");
                "Internal server error.".into()
            }
        };

        let mut response = (status, Json(ErrorBody { detail })).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}
