use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Per-field validation messages, keyed by field id.
pub type FieldErrors = BTreeMap<String, String>;

/// Message shown to clients for failures whose details stay in server logs.
pub const GENERIC_FAILURE: &str = "Something went wrong. Please try again.";

#[derive(Debug)]
pub enum AppError {
    Db(sqlx::Error),
    Template(askama::Error),
    Hash(String),
    Mail(String),
    Internal(String),
    NotFound,
    BadRequest(String),
    Validation(FieldErrors),
    Unauthorized(String),
    Forbidden(String),
    Conflict(String),
    RateLimited,
}

/// JSON error body: `{ "error": ..., "details"?: ..., "fields"?: {...} }`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<FieldErrors>,
}

impl ErrorBody {
    pub fn message(error: impl Into<String>) -> Self {
        Self { error: error.into(), details: None, fields: None }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Db(e) => write!(f, "Database error: {e}"),
            AppError::Template(e) => write!(f, "Template error: {e}"),
            AppError::Hash(e) => write!(f, "Hash error: {e}"),
            AppError::Mail(e) => write!(f, "Mail error: {e}"),
            AppError::Internal(e) => write!(f, "Internal error: {e}"),
            AppError::NotFound => write!(f, "Not found"),
            AppError::BadRequest(msg) => write!(f, "{msg}"),
            AppError::Validation(fields) => write!(f, "Validation failed ({} fields)", fields.len()),
            AppError::Unauthorized(msg) => write!(f, "{msg}"),
            AppError::Forbidden(msg) => write!(f, "{msg}"),
            AppError::Conflict(msg) => write!(f, "{msg}"),
            AppError::RateLimited => write!(f, "Too many attempts. Please try again later."),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) | AppError::Validation(_) | AppError::Conflict(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            AppError::NotFound => ErrorBody::message("Not found"),
            AppError::Validation(fields) => ErrorBody {
                error: "Validation failed".to_string(),
                details: None,
                fields: Some(fields.clone()),
            },
            AppError::BadRequest(_)
            | AppError::Unauthorized(_)
            | AppError::Forbidden(_)
            | AppError::Conflict(_)
            | AppError::RateLimited => ErrorBody::message(self.to_string()),
            _ => {
                log::error!("{self}");
                ErrorBody::message(GENERIC_FAILURE)
            }
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::Db(e)
    }
}

impl From<askama::Error> for AppError {
    fn from(e: askama::Error) -> Self {
        AppError::Template(e)
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(e: sqlx::migrate::MigrateError) -> Self {
        AppError::Db(sqlx::Error::Migrate(Box::new(e)))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::Internal(format!("JSON error: {e}"))
    }
}
