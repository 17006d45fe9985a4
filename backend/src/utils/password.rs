//! Salted, adaptive password hashing backed by bcrypt.
//!
//! bcrypt embeds a random salt and the work factor in every hash, and its
//! verification compares digests in constant time. bcrypt only reads the first
//! 72 bytes of its input, so longer passwords are refused rather than cut.

use crate::errors::PasswordError;
use bcrypt::{DEFAULT_COST, non_truncating_hash, non_truncating_verify};

/// Longest password, in UTF-8 bytes, that bcrypt hashes in full.
pub const MAX_PASSWORD_BYTES: usize = 72;

/// One-way hasher for stored credentials.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(DEFAULT_COST)
    }
}

impl PasswordHasher {
    /// Creates a hasher with the given bcrypt work factor.
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    /// Hashes a plaintext password.
    ///
    /// # Errors
    /// Returns `PasswordError::EmptyInput` for an empty password,
    /// `PasswordError::TooLong` past [`MAX_PASSWORD_BYTES`] and
    /// `PasswordError::Hashing` if bcrypt rejects the work factor.
    pub fn hash(&self, plaintext: &str) -> Result<String, PasswordError> {
        if plaintext.is_empty() {
            return Err(PasswordError::EmptyInput);
        }
        if plaintext.len() > MAX_PASSWORD_BYTES {
            return Err(PasswordError::TooLong {
                max_bytes: MAX_PASSWORD_BYTES,
            });
        }
        non_truncating_hash(plaintext, self.cost)
            .map_err(|e| PasswordError::Hashing(e.to_string()))
    }

    /// Checks a candidate password against a stored hash.
    ///
    /// # Errors
    /// Returns `PasswordError::Mismatch` when the candidate does not reproduce
    /// the hash and `PasswordError::Hashing` when the stored hash is unreadable.
    pub fn verify(&self, stored_hash: &str, candidate: &str) -> Result<(), PasswordError> {
        // Nothing longer than the limit was ever hashed, so it cannot match.
        if candidate.len() > MAX_PASSWORD_BYTES {
            return Err(PasswordError::Mismatch);
        }
        match non_truncating_verify(candidate, stored_hash) {
            Ok(true) => Ok(()),
            Ok(false) => Err(PasswordError::Mismatch),
            Err(e) => Err(PasswordError::Hashing(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> PasswordHasher {
        PasswordHasher::new(4)
    }

    #[test]
    fn test_hash_then_verify() {
        let hasher = hasher();
        let hashed = hasher.hash("correcthorsebattery").unwrap();
        assert_ne!(hashed, "correcthorsebattery");
        assert!(hashed.starts_with("$2"));
        hasher.verify(&hashed, "correcthorsebattery").unwrap();
    }

    #[test]
    fn test_wrong_password_is_mismatch() {
        let hasher = hasher();
        let hashed = hasher.hash("correcthorsebattery").unwrap();
        assert!(matches!(
            hasher.verify(&hashed, "correcthorsebatterx"),
            Err(PasswordError::Mismatch)
        ));
        assert!(matches!(
            hasher.verify(&hashed, ""),
            Err(PasswordError::Mismatch)
        ));
    }

    #[test]
    fn test_empty_input_is_rejected() {
        assert!(matches!(hasher().hash(""), Err(PasswordError::EmptyInput)));
    }

    #[test]
    fn test_hashes_are_salted() {
        let hasher = hasher();
        let first = hasher.hash("same password here").unwrap();
        let second = hasher.hash("same password here").unwrap();
        assert_ne!(first, second);
        hasher.verify(&first, "same password here").unwrap();
        hasher.verify(&second, "same password here").unwrap();
    }

    #[test]
    fn test_garbage_hash_is_hashing_error() {
        assert!(matches!(
            hasher().verify("not-a-bcrypt-hash", "whatever"),
            Err(PasswordError::Hashing(_))
        ));
    }

    #[test]
    fn test_multibyte_passwords_are_not_truncated() {
        let hasher = hasher();
        // 36 two-byte characters fill exactly the 72 hashed bytes.
        let prefix = "é".repeat(36);
        let hashed = hasher.hash(&prefix).unwrap();
        assert!(matches!(
            hasher.verify(&hashed, &format!("{}b", prefix)),
            Err(PasswordError::Mismatch)
        ));

        assert!(matches!(
            hasher.hash(&format!("{}a", prefix)),
            Err(PasswordError::TooLong { max_bytes: 72 })
        ));
    }

    #[test]
    fn test_differing_last_byte_within_limit() {
        let hasher = hasher();
        let base = "x".repeat(71);
        let hashed = hasher.hash(&format!("{}a", base)).unwrap();
        assert!(matches!(
            hasher.verify(&hashed, &format!("{}b", base)),
            Err(PasswordError::Mismatch)
        ));
    }

    #[test]
    fn test_invalid_cost_is_hashing_error() {
        assert!(matches!(
            PasswordHasher::new(99).hash("correcthorsebattery"),
            Err(PasswordError::Hashing(_))
        ));
    }
}
