//! Database repository for user credential operations.
//!
//! Implements [`CredentialStore`] on top of a SQLite pool.

use crate::database::models::{CreateUser, User};
use crate::errors::{IdentityField, StoreError};
use crate::repositories::CredentialStore;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;

const USER_COLUMNS: &str = "id, username, email, password_hash, refresh_token_hash, \
     created_at, updated_at, is_deleted, deleted_at";

/// Repository for user database operations.
#[derive(Clone)]
pub struct UserRepository {
    /// Shared SQLite connection pool
    pool: SqlitePool,
}

impl UserRepository {
    /// Creates a new UserRepository instance.
    ///
    /// # Arguments
    /// * `pool` - SQLite connection pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Maps a unique-constraint failure onto the identity column it concerns.
fn classify_insert_error(error: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_error) = &error {
        if db_error.is_unique_violation() {
            let message = db_error.message();
            if message.contains("users.email") {
                return StoreError::DuplicateIdentity {
                    field: IdentityField::Email,
                };
            }
            if message.contains("users.username") {
                return StoreError::DuplicateIdentity {
                    field: IdentityField::Username,
                };
            }
        }
    }
    StoreError::from(error)
}

#[async_trait]
impl CredentialStore for UserRepository {
    async fn find_by_email(&self, email: &str) -> Result<User, StoreError> {
        let query = format!(
            "SELECT {} FROM users WHERE email = ? AND is_deleted = 0",
            USER_COLUMNS
        );
        sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound)
    }

    async fn find_by_id(&self, id: &str) -> Result<User, StoreError> {
        let query = format!(
            "SELECT {} FROM users WHERE id = ? AND is_deleted = 0",
            USER_COLUMNS
        );
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound)
    }

    async fn create(&self, user: CreateUser) -> Result<User, StoreError> {
        let now = Utc::now();
        let query = format!(
            "INSERT INTO users (id, username, email, password_hash, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?) RETURNING {}",
            USER_COLUMNS
        );
        sqlx::query_as::<_, User>(&query)
            .bind(&user.id)
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(now)
            .bind(now)
            .fetch_one(&self.pool)
            .await
            .map_err(classify_insert_error)
    }

    async fn update_fingerprint(
        &self,
        user_id: &str,
        fingerprint: Option<&str>,
    ) -> Result<u64, StoreError> {
        let mut tx = self.pool.begin().await?;

        let exists: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE id = ? AND is_deleted = 0")
                .bind(user_id)
                .fetch_one(&mut *tx)
                .await?;
        if exists == 0 {
            return Err(StoreError::NotFound);
        }

        let result = sqlx::query(
            "UPDATE users SET refresh_token_hash = ?, updated_at = ? \
             WHERE id = ? AND is_deleted = 0",
        )
        .bind(fingerprint)
        .bind(Utc::now())
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        let rows = result.rows_affected();
        // Dropping the transaction rolls it back.
        if rows == 1 {
            tx.commit().await?;
        }

        Ok(rows)
    }

    async fn swap_fingerprint(
        &self,
        user_id: &str,
        expected: &str,
        next: Option<&str>,
    ) -> Result<u64, StoreError> {
        let result = sqlx::query(
            "UPDATE users SET refresh_token_hash = ?, updated_at = ? \
             WHERE id = ? AND is_deleted = 0 AND refresh_token_hash = ?",
        )
        .bind(next)
        .bind(Utc::now())
        .bind(user_id)
        .bind(expected)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
