//! Error types for the homebuilder site service

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use std::fmt;

/// Startup failures
#[derive(Debug)]
pub enum SiteError {
    Config(String),
    Storage(homebuilder_storage::StorageError),
    Dictionary(homebuilder_i18n::DictionaryError),
    Io(Box<std::io::Error>),
}

impl fmt::Display for SiteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SiteError::Config(msg) => write!(f, "Configuration error: {}", msg),
            SiteError::Storage(err) => write!(f, "Storage error: {}", err),
            SiteError::Dictionary(err) => write!(f, "Dictionary source error: {}", err),
            SiteError::Io(err) => write!(f, "IO error: {}", err),
        }
    }
}

impl std::error::Error for SiteError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SiteError::Storage(err) => Some(err),
            SiteError::Dictionary(err) => Some(err),
            SiteError::Io(err) => Some(err.as_ref()),
            SiteError::Config(_) => None,
        }
    }
}

impl From<homebuilder_storage::StorageError> for SiteError {
    fn from(err: homebuilder_storage::StorageError) -> Self {
        SiteError::Storage(err)
    }
}

impl From<homebuilder_i18n::DictionaryError> for SiteError {
    fn from(err: homebuilder_i18n::DictionaryError) -> Self {
        SiteError::Dictionary(err)
    }
}

impl From<std::io::Error> for SiteError {
    fn from(err: std::io::Error) -> Self {
        SiteError::Io(Box::new(err))
    }
}

impl From<tracing_subscriber::filter::ParseError> for SiteError {
    fn from(err: tracing_subscriber::filter::ParseError) -> Self {
        SiteError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SiteError>;

/// Request errors that convert to HTTP responses
#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".into(),
                )
            }
        };

        (status, axum::Json(json!({ "error": message }))).into_response()
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(e: tokio::task::JoinError) -> Self {
        AppError::Internal(e.to_string())
    }
}
