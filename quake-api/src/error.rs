use axum::extract::rejection::QueryRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use quake_common::{QueryError, StoreError};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: &'static str,
    pub message: String,
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Invalid request: {0}")]
    InvalidQuery(#[from] QueryError),
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::BadRequest(_) | ApiError::InvalidQuery(_) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    error: "bad_request",
                    message: self.to_string(),
                },
            ),
            ApiError::Store(e) => {
                error!("earthquake store failed: {}", e);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    ErrorResponse {
                        error: "service_unavailable",
                        message: "earthquake storage is unavailable, try again later".to_owned(),
                    },
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
