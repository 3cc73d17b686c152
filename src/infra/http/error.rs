//! Response envelope and the top-level error translator.
//!
//! Every response carries `success` and `message`; failures additionally
//! carry structured `errors` when field-level detail exists. [`ApiError`]
//! is the single mapping from the application taxonomy to HTTP statuses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::error;

use crate::application::error::{AppError, FieldError};

#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

/// 200 response with a payload.
pub fn ok<T: Serialize>(message: &str, data: T) -> Response {
    envelope(StatusCode::OK, message, Some(data))
}

/// 200 response without a payload.
pub fn ok_empty(message: &str) -> Response {
    envelope::<()>(StatusCode::OK, message, None)
}

/// 201 response with the created resource.
pub fn created<T: Serialize>(message: &str, data: T) -> Response {
    envelope(StatusCode::CREATED, message, Some(data))
}

fn envelope<T: Serialize>(status: StatusCode, message: &str, data: Option<T>) -> Response {
    (
        status,
        Json(Envelope {
            success: true,
            message: message.to_string(),
            data,
        }),
    )
        .into_response()
}

#[derive(Debug, Serialize)]
struct ErrorEnvelope {
    success: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<Vec<FieldError>>,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    errors: Option<Vec<FieldError>>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            errors: None,
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }
}

impl From<AppError> for ApiError {
    fn from(error: AppError) -> Self {
        match error {
            AppError::NotFound { entity } => Self::new(
                StatusCode::NOT_FOUND,
                format!("{} not found", capitalize(entity)),
            ),
            AppError::Conflict { message } => Self::new(StatusCode::CONFLICT, message),
            AppError::Validation { message, errors } => Self {
                status: StatusCode::BAD_REQUEST,
                message,
                errors: (!errors.is_empty()).then_some(errors),
            },
            AppError::Unauthorized { message } => Self::new(StatusCode::UNAUTHORIZED, message),
            AppError::Upstream { message } => {
                error!(%message, "upstream dependency unavailable");
                Self::new(
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Service temporarily unavailable",
                )
            }
            AppError::Infra(inner) => {
                error!(error = %inner, "infrastructure failure during request");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
            }
            AppError::Unexpected(detail) => {
                error!(%detail, "unexpected failure during request");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorEnvelope {
                success: false,
                message: self.message,
                errors: self.errors,
            }),
        )
            .into_response()
    }
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_carry_field_detail() {
        let app_error = AppError::validation_fields(
            "Validation failed",
            vec![FieldError::new("name", "name is required")],
        );
        let api_error = ApiError::from(app_error);
        assert_eq!(api_error.status, StatusCode::BAD_REQUEST);
        assert_eq!(api_error.errors.as_ref().map(Vec::len), Some(1));
    }

    #[test]
    fn not_found_maps_to_404() {
        let api_error = ApiError::from(AppError::not_found("subject"));
        assert_eq!(api_error.status, StatusCode::NOT_FOUND);
        assert_eq!(api_error.message, "Subject not found");
    }

    #[test]
    fn conflict_maps_to_409() {
        let api_error = ApiError::from(AppError::conflict("scheme is locked"));
        assert_eq!(api_error.status, StatusCode::CONFLICT);
    }

    #[test]
    fn upstream_maps_to_503_with_generic_message() {
        let api_error = ApiError::from(AppError::upstream("smtp relay refused"));
        assert_eq!(api_error.status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(!api_error.message.contains("smtp"));
    }
}
