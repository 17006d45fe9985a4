//! In-memory [`CredentialStore`] used by unit tests.
//!
//! Mirrors the SQLite repository contract, including uniqueness rules, and can
//! be told to misbehave so workflow failure paths can be exercised.

use crate::database::models::{CreateUser, User};
use crate::errors::{IdentityField, StoreError};
use crate::repositories::CredentialStore;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;

#[derive(Default)]
pub struct MemoryCredentialStore {
    users: Mutex<HashMap<String, User>>,
    /// Report zero affected rows from fingerprint writes while the user exists.
    stale_updates: AtomicBool,
    /// Fail every fingerprint write with a transport error.
    fail_updates: AtomicBool,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn simulate_stale_updates(&self, enabled: bool) {
        self.stale_updates.store(enabled, Ordering::SeqCst);
    }

    pub fn simulate_update_failures(&self, enabled: bool) {
        self.fail_updates.store(enabled, Ordering::SeqCst);
    }

    /// Current fingerprint of a user, regardless of deletion state.
    pub async fn fingerprint_of(&self, user_id: &str) -> Option<String> {
        let users = self.users.lock().await;
        users
            .get(user_id)
            .and_then(|user| user.refresh_token_hash.clone())
    }

    /// Raw record, regardless of deletion state.
    pub async fn raw_user(&self, user_id: &str) -> Option<User> {
        self.users.lock().await.get(user_id).cloned()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn find_by_email(&self, email: &str) -> Result<User, StoreError> {
        let users = self.users.lock().await;
        users
            .values()
            .find(|user| user.email == email && !user.is_deleted)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn find_by_id(&self, id: &str) -> Result<User, StoreError> {
        let users = self.users.lock().await;
        users
            .get(id)
            .filter(|user| !user.is_deleted)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn create(&self, user: CreateUser) -> Result<User, StoreError> {
        let mut users = self.users.lock().await;
        for existing in users.values().filter(|u| !u.is_deleted) {
            if existing.email == user.email {
                return Err(StoreError::DuplicateIdentity {
                    field: IdentityField::Email,
                });
            }
            if existing.username == user.username {
                return Err(StoreError::DuplicateIdentity {
                    field: IdentityField::Username,
                });
            }
        }

        let now = Utc::now();
        let record = User {
            id: user.id.clone(),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            refresh_token_hash: None,
            created_at: now,
            updated_at: now,
            is_deleted: false,
            deleted_at: None,
        };
        users.insert(user.id, record.clone());
        Ok(record)
    }

    async fn update_fingerprint(
        &self,
        user_id: &str,
        fingerprint: Option<&str>,
    ) -> Result<u64, StoreError> {
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable {
                message: "simulated outage".to_string(),
            });
        }

        let mut users = self.users.lock().await;
        let user = users
            .get_mut(user_id)
            .filter(|user| !user.is_deleted)
            .ok_or(StoreError::NotFound)?;

        if self.stale_updates.load(Ordering::SeqCst) {
            return Ok(0);
        }

        user.refresh_token_hash = fingerprint.map(str::to_string);
        user.updated_at = Utc::now();
        Ok(1)
    }

    async fn swap_fingerprint(
        &self,
        user_id: &str,
        expected: &str,
        next: Option<&str>,
    ) -> Result<u64, StoreError> {
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable {
                message: "simulated outage".to_string(),
            });
        }
        if self.stale_updates.load(Ordering::SeqCst) {
            return Ok(0);
        }

        let mut users = self.users.lock().await;
        match users.get_mut(user_id) {
            Some(user)
                if !user.is_deleted && user.refresh_token_hash.as_deref() == Some(expected) =>
            {
                user.refresh_token_hash = next.map(str::to_string);
                user.updated_at = Utc::now();
                Ok(1)
            }
            _ => Ok(0),
        }
    }
}
