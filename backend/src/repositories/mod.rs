//! Persistence layer for user credentials.
//!
//! The authentication workflow only sees the [`CredentialStore`] capability, so
//! it can run against the SQLite repository in production and an in-memory
//! store in tests.

use crate::database::models::{CreateUser, User};
use crate::errors::StoreError;
use async_trait::async_trait;

#[cfg(test)]
pub mod memory_store;
pub mod user_repository;

/// Durable record of user identity, password hash and refresh-token fingerprint.
///
/// Implementations enforce uniqueness of email and username across non-deleted
/// records and report violations as [`StoreError::DuplicateIdentity`].
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Looks up a non-deleted user by (normalized) email.
    async fn find_by_email(&self, email: &str) -> Result<User, StoreError>;

    /// Looks up a non-deleted user by id.
    async fn find_by_id(&self, id: &str) -> Result<User, StoreError>;

    /// Inserts a new user record.
    async fn create(&self, user: CreateUser) -> Result<User, StoreError>;

    /// Overwrites the refresh-token fingerprint of a user as one atomic unit.
    ///
    /// Fails with [`StoreError::NotFound`] when the user does not exist and
    /// otherwise returns the number of rows the update touched.
    async fn update_fingerprint(
        &self,
        user_id: &str,
        fingerprint: Option<&str>,
    ) -> Result<u64, StoreError>;

    /// Replaces the fingerprint only while the stored one still equals `expected`.
    ///
    /// The comparison and the write happen in one statement. Zero rows means
    /// the fingerprint moved on (or the user is gone) since it was read.
    async fn swap_fingerprint(
        &self,
        user_id: &str,
        expected: &str,
        next: Option<&str>,
    ) -> Result<u64, StoreError>;
}
