//! Mapping engine errors onto HTTP responses

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use kanban_ordering::OrderingError;
use serde_json::json;

/// A failed request on its way out as `{"error": "..."}`
#[derive(Debug)]
pub enum ApiError {
    /// The engine refused or failed the command
    Engine(OrderingError),
    /// The request body was not the JSON the route expects
    Body(JsonRejection),
}

impl From<OrderingError> for ApiError {
    fn from(error: OrderingError) -> Self {
        Self::Engine(error)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Body(rejection)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        let error = match self {
            Self::Engine(error) => error,
            Self::Body(rejection) => return rejection.status(),
        };
        match error {
            OrderingError::ItemNotFound { .. } | OrderingError::ContainerNotFound { .. } => {
                StatusCode::NOT_FOUND
            }
            OrderingError::OutOfRange { .. }
            | OrderingError::KindMismatch { .. }
            | OrderingError::InvalidValue { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            OrderingError::Conflict { .. }
            | OrderingError::Torn { .. }
            | OrderingError::DuplicateId { .. }
            | OrderingError::Unsettled { .. }
            | OrderingError::LockTimeout { .. } => StatusCode::CONFLICT,
            OrderingError::Sqlite(_) | OrderingError::Io(_) | OrderingError::Json(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (message, retryable) = match &self {
            Self::Engine(error) => (error.to_string(), error.is_retryable()),
            Self::Body(rejection) => (rejection.body_text(), false),
        };
        if status.is_server_error() {
            tracing::error!(error = %message, "request failed");
        } else {
            tracing::debug!(error = %message, status = status.as_u16(), "request rejected");
        }

        let mut body = json!({ "error": message });
        if retryable {
            body["retryable"] = json!(true);
        }
        (status, Json(body)).into_response()
    }
}
