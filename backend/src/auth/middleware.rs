//! Middleware for protecting authenticated routes.
//!
//! Validates bearer access tokens and places the decoded [`Claims`] in the
//! request extensions for downstream handlers.

use crate::api::common::{HttpError, http_error, unauthorized};
use crate::auth::service::AuthService;
use crate::utils::jwt::TokenKind;
use axum::{
    extract::Request,
    http::{StatusCode, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// JWT authentication middleware; only access-kind tokens pass.
pub async fn jwt_auth(mut request: Request, next: Next) -> Result<Response, HttpError> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .map(str::to_string)
        .ok_or_else(unauthorized)?;

    let service = request
        .extensions()
        .get::<Arc<AuthService>>()
        .cloned()
        .ok_or_else(|| {
            tracing::error!("AuthService extension missing from router");
            http_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "Internal server error",
                None,
            )
        })?;

    match service.jwt_utils().validate_kind(&token, TokenKind::Access) {
        Ok(claims) => {
            request.extensions_mut().insert(claims);
            Ok(next.run(request).await)
        }
        Err(e) => {
            tracing::debug!("Rejected bearer token: {}", e);
            Err(unauthorized())
        }
    }
}
