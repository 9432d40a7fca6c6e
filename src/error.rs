//! Error types shared by the store, cache, query and admin layers.
//!
//! Translation failures are deliberately absent from `FaqError`: they are
//! recovered inside the orchestrator and never reach a caller. Cache failures
//! are likewise absorbed by the cache wrappers.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::model::FaqId;

/// Errors surfaced to callers of the query and admin services.
#[derive(Debug, Error)]
pub enum FaqError {
    /// No record with this id exists (or it is inactive, for public reads).
    #[error("FAQ {0} not found")]
    NotFound(FaqId),

    /// Client supplied content that breaks a record invariant.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The record store failed.
    #[error("storage error: {0:#}")]
    Storage(#[from] anyhow::Error),
}

impl FaqError {
    /// Stable machine-readable code for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            FaqError::NotFound(_) => "NOT_FOUND",
            FaqError::Validation(_) => "VALIDATION_FAILED",
            FaqError::Storage(_) => "STORAGE_ERROR",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            FaqError::NotFound(_) => StatusCode::NOT_FOUND,
            FaqError::Validation(_) => StatusCode::BAD_REQUEST,
            FaqError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Errors from a cache backend. Callers treat every variant as a miss.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),

    #[error("cached payload could not be decoded: {0}")]
    Corrupt(#[from] serde_json::Error),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl IntoResponse for FaqError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }

        // Storage details stay in the log, not in the response body
        let message = match &self {
            FaqError::Storage(_) => "internal storage error".to_string(),
            other => other.to_string(),
        };

        let body = ErrorBody {
            error: self.code(),
            message,
        };

        (status, Json(body)).into_response()
    }
}
