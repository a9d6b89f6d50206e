use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::store::StoreError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required field is missing or empty.
    #[error("{0}")]
    Validation(String),

    /// Input that cannot be shaped into a routine, or a score that cannot be computed.
    #[error("{0}")]
    Processing(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Processing(_) | AppError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            AppError::Validation(msg) => tracing::debug!("Rejected request: {msg}"),
            AppError::Processing(msg) => tracing::error!("Processing error: {msg}"),
            AppError::Store(e) => tracing::error!("Store error: {e}"),
        }

        // Store failures are surfaced verbatim.
        let body = Json(json!({ "error": self.to_string() }));

        (
            status,
            [(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")],
            body,
        )
            .into_response()
    }
}
