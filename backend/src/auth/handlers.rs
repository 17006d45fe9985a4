//! Handler functions for authentication-related API endpoints.
//!
//! These functions parse request bodies, hand them to `auth::service` and turn
//! the outcome into the HTTP contract: 201/409/400 for registration, a token
//! pair or a uniform 401 for login.

use crate::api::common::{ApiResponse, HttpError, http_error, service_error_to_http};
use crate::auth::models::*;
use crate::auth::service::AuthService;
use crate::utils::jwt::Claims;
use axum::{
    extract::{Extension, Json, rejection::JsonRejection},
    http::StatusCode,
    response::Json as ResponseJson,
};
use std::sync::Arc;

/// Malformed JSON is a client error, reported in the standard envelope.
fn parse_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, HttpError> {
    payload.map(|Json(body)| body).map_err(|rejection| {
        http_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            rejection.body_text(),
            None,
        )
    })
}

/// Handle user registration request
#[axum::debug_handler]
pub async fn register(
    Extension(service): Extension<Arc<AuthService>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<UserInfo>>), HttpError> {
    let request = parse_body(payload)?;

    match service.register(request).await {
        Ok(user) => Ok((
            StatusCode::CREATED,
            ResponseJson(ApiResponse::success(user, "User registered successfully")),
        )),
        Err(error) => Err(service_error_to_http(error)),
    }
}

/// Handle user login request
#[axum::debug_handler]
pub async fn login(
    Extension(service): Extension<Arc<AuthService>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<ResponseJson<LoginResponse>, HttpError> {
    let request = parse_body(payload)?;

    match service.login(request).await {
        Ok(response) => Ok(ResponseJson(response)),
        Err(error) => Err(service_error_to_http(error)),
    }
}

/// Handle token refresh request
#[axum::debug_handler]
pub async fn refresh_token(
    Extension(service): Extension<Arc<AuthService>>,
    payload: Result<Json<RefreshTokenRequest>, JsonRejection>,
) -> Result<ResponseJson<LoginResponse>, HttpError> {
    let request = parse_body(payload)?;

    match service.refresh(request).await {
        Ok(response) => Ok(ResponseJson(response)),
        Err(error) => Err(service_error_to_http(error)),
    }
}

/// Handle logout request by dropping the caller's active refresh token
#[axum::debug_handler]
pub async fn logout(
    Extension(service): Extension<Arc<AuthService>>,
    payload: Result<Json<RefreshTokenRequest>, JsonRejection>,
) -> Result<ResponseJson<ApiResponse<()>>, HttpError> {
    let request = parse_body(payload)?;

    match service.logout(request).await {
        Ok(()) => Ok(ResponseJson(ApiResponse::success(
            (),
            "Logged out successfully",
        ))),
        Err(error) => Err(service_error_to_http(error)),
    }
}

/// Get current user information from token
#[axum::debug_handler]
pub async fn me(
    Extension(service): Extension<Arc<AuthService>>,
    Extension(claims): Extension<Claims>,
) -> Result<ResponseJson<ApiResponse<UserInfo>>, HttpError> {
    match service.current_user(&claims).await {
        Ok(user) => Ok(ResponseJson(ApiResponse::success(
            user,
            "User retrieved successfully",
        ))),
        Err(error) => Err(service_error_to_http(error)),
    }
}
