//! Error handling utilities for API responses.
//!
//! Provides the structured response envelope and the conversion between
//! service-layer errors and HTTP responses.
//!
//! # Response Format
//! All errors return consistent JSON responses containing:
//! - `message`: Human-readable message
//! - `error.error_type`: Machine-readable error category
//! - `error.details`: Optional field-specific validation errors
//!
//! Internal causes (database text, signing failures) are logged and never
//! echoed back to the caller.

use crate::errors::ServiceError;
use axum::{Json, http::StatusCode};
use serde::{Deserialize, Serialize};

/// Standard API response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Indicates if the request was successful
    pub success: bool,
    /// Response data (present on success)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Human-readable message
    pub message: String,
    /// Error details (present on failure)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetails>,
    /// Response timestamp
    pub timestamp: String,
}

/// Error details for failed requests
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetails {
    /// Machine-readable error type identifier
    pub error_type: String,
    /// Field-specific validation errors when applicable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldError>>,
}

/// Field-specific validation error details
#[derive(Debug, Serialize, Deserialize)]
pub struct FieldError {
    /// Name of the field with validation error
    pub field: String,
    /// Description of the validation failure
    pub message: String,
}

/// Error half of every handler result.
pub type HttpError = (StatusCode, Json<ApiResponse<()>>);

impl<T> ApiResponse<T> {
    /// Create a successful response
    pub fn success(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: message.into(),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Create an error response
    pub fn error(
        message: impl Into<String>,
        error_type: impl Into<String>,
        details: Option<Vec<FieldError>>,
    ) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            message: message.into(),
            error: Some(ErrorDetails {
                error_type: error_type.into(),
                details,
            }),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Builds an error response with the standard envelope.
pub fn http_error(
    status: StatusCode,
    error_type: &str,
    message: impl Into<String>,
    details: Option<Vec<FieldError>>,
) -> HttpError {
    (
        status,
        Json(ApiResponse::<()>::error(message, error_type, details)),
    )
}

/// The single response used for every authentication failure.
pub fn unauthorized() -> HttpError {
    http_error(
        StatusCode::UNAUTHORIZED,
        "invalid_credentials",
        "Invalid credentials",
        None,
    )
}

/// Converts ServiceError to appropriate HTTP response with standard format
pub fn service_error_to_http(error: ServiceError) -> HttpError {
    match error {
        ServiceError::Validation { message, details } => {
            let details = if details.is_empty() {
                None
            } else {
                Some(
                    details
                        .into_iter()
                        .map(|(field, message)| FieldError { field, message })
                        .collect(),
                )
            };
            http_error(
                StatusCode::BAD_REQUEST,
                "validation_error",
                message,
                details,
            )
        }
        ServiceError::DuplicateIdentity { field } => http_error(
            StatusCode::CONFLICT,
            "already_exists",
            format!("An account with this {} already exists", field),
            None,
        ),
        ServiceError::InvalidCredentials => unauthorized(),
        ServiceError::Token { source } if source.is_server_fault() => {
            tracing::error!("Token error: {}", source);
            internal_server_error()
        }
        ServiceError::Token { source } => http_error(
            StatusCode::UNAUTHORIZED,
            "invalid_token",
            source.to_string(),
            None,
        ),
        ServiceError::Store { source } => {
            tracing::error!("Store error: {}", source);
            internal_server_error()
        }
        ServiceError::Internal { message } => {
            tracing::error!("Internal error: {}", message);
            internal_server_error()
        }
    }
}

fn internal_server_error() -> HttpError {
    http_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        "internal_error",
        "Internal server error",
        None,
    )
}

/// Flattens validator::ValidationErrors into `(field, message)` pairs
pub fn validation_error_pairs(errors: &validator::ValidationErrors) -> Vec<(String, String)> {
    let mut pairs: Vec<(String, String)> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| {
                (
                    field.to_string(),
                    error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "Invalid value".to_string()),
                )
            })
        })
        .collect();
    pairs.sort();
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{IdentityField, StoreError, TokenError};

    #[test]
    fn test_status_mapping() {
        let cases = vec![
            (ServiceError::validation("bad"), StatusCode::BAD_REQUEST),
            (
                ServiceError::DuplicateIdentity {
                    field: IdentityField::Email,
                },
                StatusCode::CONFLICT,
            ),
            (ServiceError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (TokenError::Expired.into(), StatusCode::UNAUTHORIZED),
            (
                TokenError::Signing("no key".into()).into(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (StoreError::NotFound.into(), StatusCode::INTERNAL_SERVER_ERROR),
            (
                ServiceError::internal_error("boom"),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            let (status, _) = service_error_to_http(error);
            assert_eq!(status, expected);
        }
    }

    #[test]
    fn test_internal_causes_are_not_echoed() {
        let (_, Json(body)) = service_error_to_http(
            StoreError::Unavailable {
                message: "disk on fire at /var/db".into(),
            }
            .into(),
        );
        assert_eq!(body.message, "Internal server error");
        assert!(!serde_json::to_string(&body).unwrap().contains("disk"));
    }

    #[test]
    fn test_validation_details_are_listed() {
        let (_, Json(body)) = service_error_to_http(ServiceError::validation_with_details(
            "Validation failed",
            vec![("password".into(), "too short".into())],
        ));
        let details = body.error.unwrap().details.unwrap();
        assert_eq!(details.len(), 1);
        assert_eq!(details[0].field, "password");
    }
}
