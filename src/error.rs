use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Request timeout after {0} seconds")]
    Timeout(u64),

    #[error("Browser error: {0}")]
    BrowserError(String),

    #[error("Fetch error: {0}")]
    FetchError(String),

    #[error("HTTP {0} returned by target")]
    HttpStatus(u16),

    #[error("Invalid issue: {0}")]
    InvalidIssue(String),

    #[error("Check {check} failed: {reason}")]
    CheckFailed { check: String, reason: String },

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Export error: {0}")]
    Export(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl AppError {
    /// Whether a failed page acquisition is worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::Timeout(_) | AppError::BrowserError(_) | AppError::FetchError(_) => true,
            AppError::HttpStatus(code) => *code >= 500,
            _ => false,
        }
    }
}

impl From<csv::Error> for AppError {
    fn from(e: csv::Error) -> Self {
        AppError::Export(e.to_string())
    }
}

impl From<config::ConfigError> for AppError {
    fn from(e: config::ConfigError) -> Self {
        AppError::ConfigError(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::InvalidUrl(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::Timeout(_) => (StatusCode::GATEWAY_TIMEOUT, self.to_string()),
            AppError::BrowserError(_) => (StatusCode::BAD_GATEWAY, self.to_string()),
            AppError::FetchError(_) => (StatusCode::BAD_GATEWAY, self.to_string()),
            AppError::HttpStatus(_) => (StatusCode::BAD_GATEWAY, self.to_string()),
            AppError::InvalidIssue(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
            AppError::CheckFailed { .. } => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
            AppError::Serialization(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
            AppError::Export(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
            AppError::ConfigError(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
            AppError::IoError(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
        };

        let body = Json(json!({
            "error": error_message,
            "code": status.as_u16()
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
