//! The single error type every handler returns, and its mapping to HTTP.

use axum::Json;
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

use folio_types::api::ErrorResponse;

use crate::middleware::AuthError;
use crate::upload::{ALLOWED_EXTENSIONS, MAX_IMAGE_BYTES};

#[derive(Debug, Error)]
pub enum ApiError {
    // 401
    #[error("No token provided")]
    MissingToken,
    #[error("Invalid authorization header")]
    MalformedHeader,
    #[error("Invalid auth scheme")]
    UnsupportedScheme,
    #[error("Invalid or expired token")]
    InvalidToken,
    #[error("Invalid credentials")]
    InvalidCredentials,

    // 400
    #[error("Invalid {0} id")]
    InvalidIdFormat(&'static str),
    #[error("{0}")]
    Validation(String),
    #[error("Unsupported file type")]
    UnsupportedFileType,
    #[error("File too large")]
    FileTooLarge,

    // 404
    #[error("{0} not found")]
    NotFound(&'static str),

    // 500
    #[error("image storage failed: {0}")]
    StorageBackend(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingToken
            | Self::MalformedHeader
            | Self::UnsupportedScheme
            | Self::InvalidToken
            | Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::InvalidIdFormat(_)
            | Self::Validation(_)
            | Self::UnsupportedFileType
            | Self::FileTooLarge => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::StorageBackend(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingToken => "MISSING_TOKEN",
            Self::MalformedHeader => "MALFORMED_HEADER",
            Self::UnsupportedScheme => "UNSUPPORTED_SCHEME",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::InvalidIdFormat(_) => "INVALID_ID",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::UnsupportedFileType => "UNSUPPORTED_FILE_TYPE",
            Self::FileTooLarge => "FILE_TOO_LARGE",
            Self::NotFound(_) => "NOT_FOUND",
            Self::StorageBackend(_) => "STORAGE_BACKEND_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// What the client sees. Server-side failure text stays in the logs.
    pub fn detail(&self) -> String {
        match self {
            Self::UnsupportedFileType => format!(
                "Unsupported file type. Allowed: {}",
                ALLOWED_EXTENSIONS.join(", ")
            ),
            Self::FileTooLarge => format!(
                "File too large. Maximum size is {} MiB",
                MAX_IMAGE_BYTES / (1024 * 1024)
            ),
            Self::StorageBackend(_) => "Image storage failed".to_string(),
            Self::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(code = self.code(), "{}", self);
        }

        let body = ErrorResponse {
            detail: self.detail(),
            code: self.code().to_string(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::MissingToken => Self::MissingToken,
            AuthError::MalformedHeader => Self::MalformedHeader,
            AuthError::UnsupportedScheme => Self::UnsupportedScheme,
            AuthError::InvalidToken => Self::InvalidToken,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<MultipartError> for ApiError {
    fn from(e: MultipartError) -> Self {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::FileTooLarge
        } else {
            Self::Validation(e.body_text())
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        Self::Internal(format!("{:#}", e))
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(e: tokio::task::JoinError) -> Self {
        Self::Internal(format!("blocking task failed: {}", e))
    }
}
