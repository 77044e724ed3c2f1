use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use common::domain::DomainError;
use serde::Serialize;
use tracing::error;

/// Body of every failed operator request.
#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub error_code: u16,
    pub error_message: String,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        if err.is_invalid_argument() {
            return ApiError::bad_request(err.to_string());
        }
        error!(error = %err, "operator request failed");
        match err {
            DomainError::CommandDispatchFailed { .. } => {
                ApiError::internal("failed to deliver command to device")
            }
            DomainError::ConfigUpdateFailed { .. } => {
                ApiError::internal("failed to update device configuration")
            }
            _ => ApiError::internal("internal error"),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorEnvelope {
            error_code: self.status.as_u16(),
            error_message: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_argument_maps_to_bad_request() {
        let err = ApiError::from(DomainError::InvalidConfiguration("min above max".into()));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert!(err.message.contains("min above max"));
    }

    #[test]
    fn test_dispatch_failure_hides_details() {
        let err = ApiError::from(DomainError::CommandDispatchFailed {
            device_path: "projects/p/locations/l/registries/r/devices/d".into(),
            reason: "connection refused to 10.0.0.4".into(),
        });
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.message.contains("10.0.0.4"));
    }
}
