//! Central module for application-wide configuration settings.
//!
//! This module handles loading and validating configuration parameters such as
//! the database URL, server port, token signing secret, token lifetimes and the
//! password hashing cost. Configuration is loaded once at startup and injected
//! into the services that need it.

use anyhow::{Context, Result, bail};
use std::env;
use std::str::FromStr;

/// Access tokens live for 15 minutes.
pub const ACCESS_TOKEN_TTL_SECONDS: u64 = 900;
/// Refresh tokens live for 7 days.
pub const REFRESH_TOKEN_TTL_SECONDS: u64 = 604_800;

/// Upper bound for configured token lifetimes (10 years).
const MAX_TOKEN_TTL_SECONDS: u64 = 315_360_000;

const DEV_JWT_SECRET: &str = "development-only-signing-secret-do-not-deploy";
const MIN_PRODUCTION_SECRET_LEN: usize = 32;

/// Deployment environment the process is running in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Production,
    Development,
    Test,
}

impl FromStr for AppEnv {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.trim().to_lowercase().as_str() {
            "production" | "prod" => Ok(AppEnv::Production),
            "development" | "dev" => Ok(AppEnv::Development),
            "test" => Ok(AppEnv::Test),
            _ => Err(format!("Invalid APP_ENV: {}", input)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub app_env: AppEnv,
    pub database_url: String,
    pub max_connections: u32,
    pub acquire_timeout_seconds: u64,
    pub jwt_secret: String,
    pub access_token_ttl_seconds: u64,
    pub refresh_token_ttl_seconds: u64,
    pub bcrypt_cost: u32,
    pub password_hash_timeout_ms: u64,
    pub server_port: u16,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let app_env = match lookup("APP_ENV") {
            Some(value) => value
                .parse::<AppEnv>()
                .map_err(anyhow::Error::msg)
                .context("APP_ENV must be production, development or test")?,
            None => AppEnv::Development,
        };
        let production = app_env == AppEnv::Production;

        let database_url = match lookup("DATABASE_URL") {
            Some(url) if !url.trim().is_empty() => url,
            _ if production => bail!("DATABASE_URL not set"),
            _ => "sqlite://auth.db?mode=rwc".to_string(),
        };

        let max_connections = parse_or(&lookup, "DB_MAX_CONNECTIONS", 5u32)
            .context("DB_MAX_CONNECTIONS must be a valid number")?;

        let acquire_timeout_seconds = parse_or(&lookup, "DB_ACQUIRE_TIMEOUT_SECONDS", 3u64)
            .context("DB_ACQUIRE_TIMEOUT_SECONDS must be a valid number")?;

        let jwt_secret = match lookup("JWT_SECRET") {
            Some(secret) if !secret.is_empty() => {
                if production && secret.len() < MIN_PRODUCTION_SECRET_LEN {
                    bail!(
                        "JWT_SECRET must be at least {} bytes in production",
                        MIN_PRODUCTION_SECRET_LEN
                    );
                }
                secret
            }
            _ if production => bail!("JWT_SECRET not set"),
            _ => {
                tracing::warn!("JWT_SECRET not set, using the development signing secret");
                DEV_JWT_SECRET.to_string()
            }
        };

        let access_token_ttl_seconds =
            parse_or(&lookup, "ACCESS_TOKEN_TTL_SECONDS", ACCESS_TOKEN_TTL_SECONDS)
                .context("ACCESS_TOKEN_TTL_SECONDS must be a valid number")?;

        let refresh_token_ttl_seconds =
            parse_or(&lookup, "REFRESH_TOKEN_TTL_SECONDS", REFRESH_TOKEN_TTL_SECONDS)
                .context("REFRESH_TOKEN_TTL_SECONDS must be a valid number")?;

        for (key, ttl) in [
            ("ACCESS_TOKEN_TTL_SECONDS", access_token_ttl_seconds),
            ("REFRESH_TOKEN_TTL_SECONDS", refresh_token_ttl_seconds),
        ] {
            let seconds = i64::try_from(ttl)
                .with_context(|| format!("{} does not fit a timestamp", key))?;
            if seconds <= 0 || ttl > MAX_TOKEN_TTL_SECONDS {
                bail!("{} must be between 1 and {}", key, MAX_TOKEN_TTL_SECONDS);
            }
        }

        let bcrypt_cost = parse_or(&lookup, "BCRYPT_COST", bcrypt::DEFAULT_COST)
            .context("BCRYPT_COST must be a valid number")?;
        if production && bcrypt_cost < bcrypt::DEFAULT_COST {
            bail!(
                "BCRYPT_COST must be at least {} in production",
                bcrypt::DEFAULT_COST
            );
        }

        let password_hash_timeout_ms = parse_or(&lookup, "PASSWORD_HASH_TIMEOUT_MS", 2000u64)
            .context("PASSWORD_HASH_TIMEOUT_MS must be a valid number")?;

        let server_port = parse_or(&lookup, "SERVER_PORT", 3000u16)
            .context("SERVER_PORT must be a valid number")?;

        Ok(Config {
            app_env,
            database_url,
            max_connections,
            acquire_timeout_seconds,
            jwt_secret,
            access_token_ttl_seconds,
            refresh_token_ttl_seconds,
            bcrypt_cost,
            password_hash_timeout_ms,
            server_port,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => Ok(raw.trim().parse::<T>()?),
        None => Ok(default),
    }
}
