//! Core business logic for the authentication system.
//!
//! Registration: validate, hash, persist. Login: look up, verify, mint a token
//! pair, persist the refresh fingerprint. A login only succeeds once the
//! fingerprint write has gone through; otherwise no tokens leave this module.

use crate::api::common::validation_error_pairs;
use crate::auth::models::*;
use crate::config::Config;
use crate::database::models::{CreateUser, User};
use crate::errors::{PasswordError, ServiceError, ServiceResult, StoreError};
use crate::repositories::CredentialStore;
use crate::services::refresh_fingerprint::RefreshFingerprintStore;
use crate::utils::jwt::{Claims, JwtUtils, TokenKind};
use crate::utils::password::PasswordHasher;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;
use validator::Validate;

/// Authentication service for registration, login and token rotation
pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    hasher: PasswordHasher,
    jwt_utils: JwtUtils,
    fingerprints: RefreshFingerprintStore,
    hash_timeout: Duration,
}

impl AuthService {
    /// Create a new AuthService instance
    pub fn new(
        store: Arc<dyn CredentialStore>,
        hasher: PasswordHasher,
        jwt_utils: JwtUtils,
        hash_timeout: Duration,
    ) -> Self {
        let fingerprints = RefreshFingerprintStore::new(store.clone());
        AuthService {
            store,
            hasher,
            jwt_utils,
            fingerprints,
            hash_timeout,
        }
    }

    /// Create an AuthService wired from the loaded configuration
    pub fn from_config(store: Arc<dyn CredentialStore>, config: &Config) -> ServiceResult<Self> {
        let jwt_utils = JwtUtils::from_config(config)?;
        Ok(Self::new(
            store,
            PasswordHasher::new(config.bcrypt_cost),
            jwt_utils,
            Duration::from_millis(config.password_hash_timeout_ms),
        ))
    }

    pub fn jwt_utils(&self) -> &JwtUtils {
        &self.jwt_utils
    }

    /// Register a new user
    pub async fn register(&self, mut request: RegisterRequest) -> ServiceResult<UserInfo> {
        request.email = normalize_email(&request.email);
        validate_request(&request)?;

        let RegisterRequest {
            username,
            email,
            password,
        } = request;

        let password_hash = self
            .run_hasher(move |hasher| hasher.hash(&password))
            .await?
            .map_err(|e| match e {
                PasswordError::EmptyInput => ServiceError::validation("Password is required"),
                PasswordError::TooLong { .. } => ServiceError::validation_with_details(
                    "Validation failed",
                    vec![("password".to_string(), e.to_string())],
                ),
                other => ServiceError::internal_error(other.to_string()),
            })?;

        let user = self
            .store
            .create(CreateUser {
                id: Uuid::now_v7().to_string(),
                username,
                email,
                password_hash,
            })
            .await
            .map_err(|e| match e {
                StoreError::DuplicateIdentity { field } => {
                    tracing::info!("Registration rejected: duplicate {}", field);
                    ServiceError::DuplicateIdentity { field }
                }
                other => ServiceError::from(other),
            })?;

        tracing::info!("Registered user {}", user.id);
        Ok(user.into())
    }

    /// Authenticate user and issue an access/refresh token pair
    pub async fn login(&self, mut request: LoginRequest) -> ServiceResult<LoginResponse> {
        request.email = normalize_email(&request.email);
        validate_request(&request)?;

        let user = match self.store.find_by_email(&request.email).await {
            Ok(user) => user,
            Err(StoreError::NotFound) => {
                tracing::debug!("Login failed: unknown email");
                return Err(ServiceError::InvalidCredentials);
            }
            Err(e) => return Err(e.into()),
        };

        let stored_hash = user.password_hash.clone();
        let password = request.password;
        match self
            .run_hasher(move |hasher| hasher.verify(&stored_hash, &password))
            .await?
        {
            Ok(()) => {}
            Err(PasswordError::Mismatch) => {
                tracing::debug!("Login failed: wrong password for user {}", user.id);
                return Err(ServiceError::InvalidCredentials);
            }
            Err(e) => {
                return Err(ServiceError::internal_error(format!(
                    "stored hash of user {} unusable: {}",
                    user.id, e
                )));
            }
        }

        let user_id = user.id.clone();
        let response = self.issue_and_record(user.into(), None).await?;
        tracing::info!("User {} logged in", user_id);
        Ok(response)
    }

    /// Exchange a refresh token for a new pair, rotating the stored fingerprint.
    ///
    /// The presented token is redeemed at most once: of two concurrent
    /// refreshes with the same token, only one gets a new pair.
    pub async fn refresh(&self, request: RefreshTokenRequest) -> ServiceResult<LoginResponse> {
        let user = self.check_refresh_token(&request).await?;
        let user_id = user.id.clone();
        let response = self
            .issue_and_record(user.into(), Some(request.refresh_token.as_str()))
            .await?;
        tracing::info!("Rotated refresh token for user {}", user_id);
        Ok(response)
    }

    /// Drop the active refresh token of the user who presents it
    pub async fn logout(&self, request: RefreshTokenRequest) -> ServiceResult<()> {
        let user = self.check_refresh_token(&request).await?;
        match self.fingerprints.revoke(&user.id, &request.refresh_token).await {
            Ok(()) => {}
            Err(StoreError::ConcurrentUpdateConflict { .. }) => {
                tracing::warn!("Logout for user {} lost a race on its refresh token", user.id);
                return Err(ServiceError::InvalidCredentials);
            }
            Err(e) => {
                return Err(ServiceError::internal_error(format!(
                    "failed to clear refresh fingerprint for user {}: {}",
                    user.id, e
                )));
            }
        }
        tracing::info!("User {} logged out", user.id);
        Ok(())
    }

    /// Resolve the user behind an already validated access token
    pub async fn current_user(&self, claims: &Claims) -> ServiceResult<UserInfo> {
        match self.store.find_by_id(claims.user_id()).await {
            Ok(user) => Ok(user.into()),
            Err(StoreError::NotFound) => Err(ServiceError::InvalidCredentials),
            Err(e) => Err(e.into()),
        }
    }

    /// Validates a refresh token and requires it to be the one on record.
    async fn check_refresh_token(&self, request: &RefreshTokenRequest) -> ServiceResult<User> {
        validate_request(request)?;

        let claims = self
            .jwt_utils
            .validate_kind(&request.refresh_token, TokenKind::Refresh)?;

        let user = match self.store.find_by_id(claims.user_id()).await {
            Ok(user) => user,
            Err(StoreError::NotFound) => return Err(ServiceError::InvalidCredentials),
            Err(e) => return Err(e.into()),
        };

        if !RefreshFingerprintStore::matches(
            user.refresh_token_hash.as_deref(),
            &request.refresh_token,
        ) {
            tracing::warn!(
                "Refresh token for user {} is not the active one (reused or superseded)",
                user.id
            );
            return Err(ServiceError::InvalidCredentials);
        }

        Ok(user)
    }

    /// Mints a token pair and records the refresh fingerprint; all or nothing.
    ///
    /// With `presented` set, the new fingerprint only replaces that token's.
    async fn issue_and_record(
        &self,
        user: UserInfo,
        presented: Option<&str>,
    ) -> ServiceResult<LoginResponse> {
        let access_token = self.jwt_utils.issue_access(&user.id)?;
        let refresh_token = self.jwt_utils.issue_refresh(&user.id)?;

        let fingerprint = RefreshFingerprintStore::fingerprint(&refresh_token);
        let written = match presented {
            None => self.fingerprints.persist(&user.id, &fingerprint).await,
            Some(presented) => self.fingerprints.rotate(&user.id, presented, &fingerprint).await,
        };

        match written {
            Ok(()) => {}
            Err(StoreError::ConcurrentUpdateConflict { .. }) if presented.is_some() => {
                tracing::warn!("Refresh token for user {} was already redeemed", user.id);
                return Err(ServiceError::InvalidCredentials);
            }
            Err(e) => {
                // NotFound and conflicts look the same to the caller.
                return Err(ServiceError::internal_error(format!(
                    "failed to save authentication data for user {}: {}",
                    user.id, e
                )));
            }
        }

        Ok(LoginResponse::bearer(
            access_token,
            refresh_token,
            self.jwt_utils.access_ttl_seconds(),
            user,
        ))
    }

    /// Runs a bcrypt job off the async workers, bounded by the hash timeout.
    async fn run_hasher<T, F>(&self, job: F) -> ServiceResult<Result<T, PasswordError>>
    where
        F: FnOnce(PasswordHasher) -> Result<T, PasswordError> + Send + 'static,
        T: Send + 'static,
    {
        let hasher = self.hasher;
        let task = tokio::task::spawn_blocking(move || job(hasher));
        match tokio::time::timeout(self.hash_timeout, task).await {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(join_error)) => Err(ServiceError::internal_error(format!(
                "password hashing task failed: {}",
                join_error
            ))),
            Err(_) => Err(ServiceError::internal_error("password hashing timed out")),
        }
    }
}

fn validate_request<T: Validate>(request: &T) -> ServiceResult<()> {
    request.validate().map_err(|errors| {
        ServiceError::validation_with_details("Validation failed", validation_error_pairs(&errors))
    })
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
