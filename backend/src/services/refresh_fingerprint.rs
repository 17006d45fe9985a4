//! Refresh-token fingerprints.
//!
//! Only a SHA-256 digest of the active refresh token is kept per user. Refresh
//! tokens are high-entropy signed values, so a fast digest is enough here; the
//! slow work factor is reserved for passwords.

use crate::errors::StoreError;
use crate::repositories::CredentialStore;
use sha2::{Digest, Sha256};
use std::sync::Arc;

/// Persists and checks the fingerprint of each user's current refresh token.
#[derive(Clone)]
pub struct RefreshFingerprintStore {
    store: Arc<dyn CredentialStore>,
}

impl RefreshFingerprintStore {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }

    /// Deterministic hex-encoded SHA-256 digest of a refresh token.
    pub fn fingerprint(refresh_token: &str) -> String {
        hex::encode(Sha256::digest(refresh_token.as_bytes()))
    }

    /// Replaces the stored fingerprint for `user_id`.
    ///
    /// # Errors
    /// * `StoreError::NotFound` - the user does not exist
    /// * `StoreError::ConcurrentUpdateConflict` - the user exists but no row was updated
    pub async fn persist(&self, user_id: &str, fingerprint: &str) -> Result<(), StoreError> {
        self.write(user_id, Some(fingerprint)).await
    }

    /// Swaps the fingerprint of `presented` for `next`, redeeming the token once.
    ///
    /// # Errors
    /// * `StoreError::ConcurrentUpdateConflict` - `presented` is no longer on record
    pub async fn rotate(
        &self,
        user_id: &str,
        presented: &str,
        next: &str,
    ) -> Result<(), StoreError> {
        self.swap(user_id, presented, Some(next)).await
    }

    /// Removes the fingerprint of `presented`, so no refresh token of this user matches.
    pub async fn revoke(&self, user_id: &str, presented: &str) -> Result<(), StoreError> {
        self.swap(user_id, presented, None).await
    }

    async fn write(&self, user_id: &str, fingerprint: Option<&str>) -> Result<(), StoreError> {
        let rows = self.store.update_fingerprint(user_id, fingerprint).await?;
        conflict_on_zero(user_id, rows)
    }

    async fn swap(
        &self,
        user_id: &str,
        presented: &str,
        next: Option<&str>,
    ) -> Result<(), StoreError> {
        let expected = Self::fingerprint(presented);
        let rows = self.store.swap_fingerprint(user_id, &expected, next).await?;
        conflict_on_zero(user_id, rows)
    }

    /// True when `refresh_token` is the one whose fingerprint is on record.
    pub fn matches(stored: Option<&str>, refresh_token: &str) -> bool {
        let Some(stored) = stored.and_then(|hex_digest| hex::decode(hex_digest).ok()) else {
            return false;
        };
        constant_time_eq(&stored, &Sha256::digest(refresh_token.as_bytes()))
    }
}

fn conflict_on_zero(user_id: &str, rows: u64) -> Result<(), StoreError> {
    if rows == 0 {
        return Err(StoreError::ConcurrentUpdateConflict {
            user_id: user_id.to_string(),
        });
    }
    Ok(())
}

/// Compares two byte strings without an early exit on the first difference.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |diff, (x, y)| diff | (x ^ y)) == 0
}
