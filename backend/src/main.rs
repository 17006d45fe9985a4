//! Main entry point for the authentication backend.
//!
//! This file initializes logging, loads configuration, opens the credential
//! database and serves the authentication routes with Axum.

mod api;
mod auth;
mod config;
mod database;
mod errors;
mod repositories;
mod services;
mod utils;

use crate::api::common::ApiResponse;
use crate::auth::service::AuthService;
use crate::repositories::user_repository::UserRepository;
use anyhow::Context;
use axum::{
    Extension, Router,
    http::{Method, header},
    response::Json,
    routing::get,
};
use config::Config;
use database::Database;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = Config::from_env().context("failed to load configuration")?;
    let db = Database::new(&config)
        .await
        .context("failed to open database")?;

    let store = Arc::new(UserRepository::new(db.pool().clone()));
    let auth_service =
        AuthService::from_config(store, &config).context("failed to build auth service")?;

    let app = app(Arc::new(auth_service));

    let bind_address = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("failed to bind {}", bind_address))?;

    info!(
        "Starting auth server on port {} ({:?})",
        config.server_port, config.app_env
    );
    axum::serve(listener, app).await?;

    db.close().await;
    Ok(())
}

/// Full router: service banner, auth routes and browser CORS handling.
fn app(auth_service: Arc<AuthService>) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .nest("/api/auth", auth::routes::auth_router())
        .layer(Extension(auth_service))
        .layer(cors_layer())
}

/// Browser clients may call from any origin with a bearer token.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .max_age(Duration::from_secs(3600))
}

async fn root_handler() -> Json<ApiResponse<serde_json::Value>> {
    Json(ApiResponse::success(
        serde_json::json!({
            "service": "Auth Backend",
            "version": env!("CARGO_PKG_VERSION")
        }),
        "Welcome to the authentication API",
    ))
}
