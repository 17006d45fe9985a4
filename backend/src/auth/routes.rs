//! Defines the HTTP routes specifically for authentication.
//!
//! These routes handle registration, login, token refresh and logout.
//! They are designed to be nested into the main Axum router, which must
//! provide an `Extension<Arc<AuthService>>`.

use crate::auth::handlers::*;
use crate::auth::middleware::*;
use axum::{
    Router, middleware,
    routing::{get, post},
};

/// Creates the authentication router with all auth-related routes
pub fn auth_router() -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/refresh", post(refresh_token))
        .route("/logout", post(logout))
        .route("/me", get(me).layer(middleware::from_fn(jwt_auth)))
}
