use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::reports::ReportError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Report(#[from] ReportError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Malformed document: {0}")]
    Document(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// The connection mutex is only poisoned if a handler panicked while
    /// holding it.
    pub fn lock() -> Self {
        AppError::Internal("database lock poisoned".to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) | AppError::Report(_) => StatusCode::BAD_REQUEST,
            AppError::Database(_) | AppError::Document(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, self.to_string()).into_response()
    }
}
