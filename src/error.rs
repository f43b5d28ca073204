//! Typed errors and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Errors raised while wiring the server: missing env settings, registry
/// misuse, malformed cron expressions. These surface at startup or from
/// registration calls, not from request handling.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("environment settings for service '{0}' are not set")]
    MissingService(&'static str),
    #[error("middleware with name '{0}' already exists")]
    MiddlewareExists(String),
    #[error("middleware '{0}' not found in the server")]
    MiddlewareNotFound(String),
    #[error("CRUD routes for entity '{0}' not found, are you sure you created them with make_crud?")]
    CrudNotRegistered(String),
    #[error("invalid cron expression: {0}")]
    Cron(String),
    #[error("service '{0}' failed to connect: {1}")]
    Connect(&'static str, String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("validation: {0}")]
    Validation(String),
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("service '{0}' is not enabled on this server")]
    ServiceNotEnabled(&'static str),
    #[error("smtp: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
    #[error("mail: {0}")]
    Mail(String),
    #[error("redis: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("mongo: {0}")]
    Mongo(#[from] mongodb::error::Error),
    #[error("token: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
    #[error("password hash: {0}")]
    Hash(#[from] bcrypt::BcryptError),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("internal: {0}")]
    Internal(String),
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

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AppError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "validation_error"),
            AppError::Db(e) => {
                if let sqlx::Error::RowNotFound = e {
                    (StatusCode::NOT_FOUND, "not_found")
                } else {
                    (StatusCode::INTERNAL_SERVER_ERROR, "database_error")
                }
            }
            AppError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            AppError::Unauthorized(_) | AppError::Token(_) => {
                (StatusCode::UNAUTHORIZED, "unauthorized")
            }
            AppError::Forbidden(_) => (StatusCode::FORBIDDEN, "forbidden"),
            AppError::ServiceNotEnabled(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "service_unavailable")
            }
            AppError::Smtp(_) | AppError::Mail(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "mail_error")
            }
            AppError::Redis(_) => (StatusCode::INTERNAL_SERVER_ERROR, "cache_error"),
            AppError::Mongo(_) => (StatusCode::INTERNAL_SERVER_ERROR, "document_store_error"),
            AppError::Hash(_) | AppError::Io(_) | AppError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
            }
        };
        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
                details: None,
            },
        };
        (status, Json(body)).into_response()
    }
}
