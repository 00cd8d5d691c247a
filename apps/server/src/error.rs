use std::io::Error as IoError;

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use pulsewatch::StoreError;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

/// Startup failures
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0:#}")]
    Io(#[from] IoError),
    #[error("Address parsing error: {0}")]
    AddrParse(#[from] std::net::AddrParseError),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Request failures, rendered as `{"message": ...}`
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Monitor {0} not found")]
    MonitorNotFound(Uuid),
    #[error("{0}")]
    BadRequest(String),
    #[error("Failed to read monitor data")]
    Store(#[from] StoreError),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::MonitorNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let ApiError::Store(e) = self {
            tracing::error!("Store failure while serving request: {}", e);
        }
        HttpResponse::build(self.status_code()).json(json!({ "message": self.to_string() }))
    }
}
