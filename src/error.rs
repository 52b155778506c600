//! Typed errors and HTTP mapping.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Startup-time configuration failures. Any of these aborts the process.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing reference: {kind} '{id}' (from {from})")]
    MissingReference {
        kind: &'static str,
        id: String,
        from: String,
    },
    #[error("resource '{resource}' has no primary key column")]
    MissingPrimaryKey { resource: String },
    #[error("resource '{resource}' has more than one primary key column: {columns:?}")]
    DuplicatePrimaryKey { resource: String, columns: Vec<String> },
    #[error("resource '{resource}' declares column '{column}' more than once")]
    DuplicateColumn { resource: String, column: String },
    #[error("resource id '{0}' is declared more than once")]
    DuplicateResource(String),
    #[error("resource '{resource}': required column '{column}' cannot be supplied on create")]
    UnsuppliableRequired { resource: String, column: String },
    #[error("invalid rate limit '{0}' (expected <count>/<n><s|m|h|d>)")]
    RateLimit(String),
    #[error("missing environment variable {0}")]
    MissingEnv(&'static str),
    #[error("validation: {0}")]
    Validation(String),
}

/// Failures raised by a plugin attachment. Isolated to the attempt that triggered them.
#[derive(Error, Debug)]
pub enum PluginError {
    #[error("resource '{0}' has no upload plugin for column '{1}'")]
    NoUploadTarget(String, String),
    #[error("file extension '{extension}' is not allowed (allowed: {allowed})")]
    ExtensionNotAllowed { extension: String, allowed: String },
    #[error("file is {size} bytes, larger than the {max} byte limit")]
    FileTooLarge { size: u64, max: u64 },
    #[error("invalid file name: {0}")]
    InvalidFileName(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Plugin(#[from] PluginError),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("validation: {0}")]
    Validation(String),
    #[error("{0}")]
    Rejected(String),
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error"),
            AppError::Plugin(_) => (StatusCode::UNPROCESSABLE_ENTITY, "plugin_error"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "validation"),
            AppError::Rejected(_) => (StatusCode::BAD_REQUEST, "rejected"),
            AppError::Db(e) => {
                if let sqlx::Error::RowNotFound = e {
                    (StatusCode::NOT_FOUND, "not_found")
                } else {
                    (StatusCode::INTERNAL_SERVER_ERROR, "database_error")
                }
            }
            AppError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            AppError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "unauthorized"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
                details: None,
            },
        };
        if let AppError::Unauthorized(_) = self {
            return (
                status,
                [(header::WWW_AUTHENTICATE, r#"Basic realm="admin""#)],
                Json(body),
            )
                .into_response();
        }
        (status, Json(body)).into_response()
    }
}
