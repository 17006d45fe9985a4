//! Global application error types and handlers.
//!
//! This module defines the error taxonomy shared by the password hasher, the
//! token issuer/validator, the credential store and the authentication workflow.
//! HTTP mapping of these errors lives in `api::common`.

use std::fmt;
use thiserror::Error;

/// The identity column that tripped a uniqueness constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityField {
    Email,
    Username,
}

impl fmt::Display for IdentityField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentityField::Email => write!(f, "email"),
            IdentityField::Username => write!(f, "username"),
        }
    }
}

/// Errors raised while hashing or verifying passwords.
#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("password must not be empty")]
    EmptyInput,

    #[error("password does not match")]
    Mismatch,

    #[error("password exceeds {max_bytes} bytes")]
    TooLong { max_bytes: usize },

    /// The stored hash is unreadable or the hashing backend failed.
    #[error("password hashing failed: {0}")]
    Hashing(String),
}

/// Errors raised while issuing or validating signed tokens.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token signing failed: {0}")]
    Signing(String),

    #[error("token signature is invalid")]
    InvalidSignature,

    #[error("token has expired")]
    Expired,

    #[error("token is malformed: {0}")]
    Malformed(String),

    #[error("expected a {expected} token")]
    WrongKind { expected: String },
}

impl TokenError {
    /// Issue-time failures are server faults; everything else is the caller's token.
    pub fn is_server_fault(&self) -> bool {
        matches!(self, TokenError::Signing(_))
    }
}

/// Errors raised by a credential store implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("user not found")]
    NotFound,

    #[error("{field} already registered")]
    DuplicateIdentity { field: IdentityField },

    #[error("no rows affected while updating user {user_id}")]
    ConcurrentUpdateConflict { user_id: String },

    #[error("database error: {source}")]
    Database { source: sqlx::Error },

    #[error("store unavailable: {message}")]
    Unavailable { message: String },
}

impl From<sqlx::Error> for StoreError {
    fn from(source: sqlx::Error) -> Self {
        match source {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                StoreError::Unavailable {
                    message: source.to_string(),
                }
            }
            source => StoreError::Database { source },
        }
    }
}

/// Generic service error returned by the authentication workflow
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        details: Vec<(String, String)>,
    },

    #[error("{field} already exists")]
    DuplicateIdentity { field: IdentityField },

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Token error: {source}")]
    Token {
        #[from]
        source: TokenError,
    },

    #[error("Store error: {source}")]
    Store {
        #[from]
        source: StoreError,
    },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    // Helper constructors for common patterns

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            details: Vec::new(),
        }
    }

    pub fn validation_with_details(
        message: impl Into<String>,
        details: Vec<(String, String)>,
    ) -> Self {
        Self::Validation {
            message: message.into(),
            details,
        }
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}
