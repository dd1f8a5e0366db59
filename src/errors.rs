use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ApiResponse;

/// Failures raised by the emission engine.
/// Both are client-input errors: never retried, never logged as faults.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EmissionError {
    #[error("Unknown category: {category}")]
    UnknownCategory { category: String },

    #[error("Unknown subcategory: {subcategory} for {category}")]
    UnknownSubcategory {
        category: String,
        subcategory: String,
        /// Closest known subcategory, if one is reasonably similar
        suggestion: Option<String>,
    },
}

/// Errors surfaced by the HTTP layer
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Emission(#[from] EmissionError),

    #[error("Invalid date format. Use YYYY-MM-DD")]
    InvalidDate,

    #[error("Month must be between 1 and 12")]
    InvalidMonth,

    #[error("Quantity must produce a finite CO2 value")]
    InvalidQuantity,

    #[error("Emission entry not found")]
    EntryNotFound,

    #[error("Not authorized to modify this entry")]
    Forbidden,

    #[error(transparent)]
    Storage(#[from] StoreError),
}

/// Failures reading or writing the entry log
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Entry log I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt entry log line {line}: {source}")]
    Corrupt {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode log event: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("Entry log task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Emission(_)
            | ApiError::InvalidDate
            | ApiError::InvalidMonth
            | ApiError::InvalidQuantity => StatusCode::BAD_REQUEST,
            ApiError::EntryNotFound => StatusCode::NOT_FOUND,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, "rejected request");
        }

        let data = match &self {
            ApiError::Emission(EmissionError::UnknownSubcategory {
                suggestion: Some(suggestion),
                ..
            }) => Some(serde_json::json!({ "did_you_mean": suggestion })),
            _ => None,
        };

        let body = ApiResponse {
            status: "error".to_string(),
            message: self.to_string(),
            data,
        };
        (status, Json(body)).into_response()
    }
}
