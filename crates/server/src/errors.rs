use axum::extract::rejection::QueryRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use common::types::StatusBody;
use service::errors::ServiceError;
use tracing::error;

/// Caller-facing error: a status code plus the `{status, message}` body.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status, message: message.into() }
    }
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::Unauthorized => Self::new(StatusCode::UNAUTHORIZED, "Invalid API Key"),
            ServiceError::MissingParameters(names) => Self::new(
                StatusCode::BAD_REQUEST,
                format!("Missing parameters. Required: {}", names.join(", ")),
            ),
            ServiceError::MissingParameter(name) => {
                Self::new(StatusCode::BAD_REQUEST, format!("Missing parameter: {name}"))
            }
            ServiceError::InvalidDuration(_) => Self::new(
                StatusCode::BAD_REQUEST,
                "Invalid duration format. Use 'Xday' or 'Xmon'.",
            ),
            ServiceError::NotFound(email) => {
                Self::new(StatusCode::NOT_FOUND, format!("Email '{email}' not found."))
            }
            ServiceError::Storage(msg) | ServiceError::StorageUnreadable(msg) => {
                error!(error = %msg, "registry storage failure");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal storage error")
            }
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(e: QueryRejection) -> Self {
        Self::new(StatusCode::BAD_REQUEST, e.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(StatusBody::error(self.message))).into_response()
    }
}
