//! JWT token utilities for authentication.
//!
//! Issues and validates HS256-signed access and refresh tokens. The signing
//! secret is handed in at construction time from [`Config`]; nothing here reads
//! the environment.
//!
//! [`Config`]: crate::config::Config

use chrono::Utc;
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
    errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::config::Config;
use crate::errors::TokenError;

/// What a token may be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Access => write!(f, "access"),
            TokenKind::Refresh => write!(f, "refresh"),
        }
    }
}

/// JWT Claims structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// User ID
    pub sub: String,
    /// Token kind
    pub kind: TokenKind,
    /// Token issued at timestamp
    pub iat: i64,
    /// Token expiration timestamp
    pub exp: i64,
    /// Unique token id, so two tokens minted in the same second still differ
    pub jti: String,
}

impl Claims {
    pub fn user_id(&self) -> &str {
        &self.sub
    }

    /// A token is expired from the instant `exp` is reached.
    pub fn is_expired_at(&self, now: i64) -> bool {
        now >= self.exp
    }
}

/// JWT token utility for creating and validating tokens
pub struct JwtUtils {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    access_ttl_seconds: i64,
    refresh_ttl_seconds: i64,
}

impl JwtUtils {
    /// Create a new JwtUtils instance from an explicit secret and lifetimes.
    pub fn new(
        secret: &str,
        access_ttl_seconds: u64,
        refresh_ttl_seconds: u64,
    ) -> Result<Self, TokenError> {
        if secret.is_empty() {
            return Err(TokenError::Signing("signing secret is empty".to_string()));
        }

        let encoding_key = EncodingKey::from_secret(secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(secret.as_bytes());

        // Expiry is checked against `exp` without leeway after decoding.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(JwtUtils {
            encoding_key,
            decoding_key,
            validation,
            access_ttl_seconds: ttl_to_seconds(access_ttl_seconds)?,
            refresh_ttl_seconds: ttl_to_seconds(refresh_ttl_seconds)?,
        })
    }

    /// Create a new JwtUtils instance from the loaded configuration.
    pub fn from_config(config: &Config) -> Result<Self, TokenError> {
        Self::new(
            &config.jwt_secret,
            config.access_token_ttl_seconds,
            config.refresh_token_ttl_seconds,
        )
    }

    pub fn access_ttl_seconds(&self) -> u64 {
        self.access_ttl_seconds.unsigned_abs()
    }

    fn ttl_for(&self, kind: TokenKind) -> i64 {
        match kind {
            TokenKind::Access => self.access_ttl_seconds,
            TokenKind::Refresh => self.refresh_ttl_seconds,
        }
    }

    /// Generate a short-lived access token
    pub fn issue_access(&self, user_id: &str) -> Result<String, TokenError> {
        self.issue_at(user_id, TokenKind::Access, Utc::now().timestamp())
    }

    /// Generate a long-lived refresh token
    pub fn issue_refresh(&self, user_id: &str) -> Result<String, TokenError> {
        self.issue_at(user_id, TokenKind::Refresh, Utc::now().timestamp())
    }

    /// Generate a token of the given kind as if issued at `now` (unix seconds).
    pub fn issue_at(&self, user_id: &str, kind: TokenKind, now: i64) -> Result<String, TokenError> {
        let exp = now
            .checked_add(self.ttl_for(kind))
            .ok_or_else(|| TokenError::Signing("token expiry out of range".to_string()))?;
        let claims = Claims {
            sub: user_id.to_string(),
            kind,
            iat: now,
            exp,
            jti: Uuid::now_v7().to_string(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Validate and decode a token against the clock value `now` (unix seconds).
    pub fn validate_at(&self, token: &str, now: i64) -> Result<Claims, TokenError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|token_data| token_data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                    TokenError::InvalidSignature
                }
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Malformed(e.to_string()),
            })?;

        if claims.is_expired_at(now) {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }

    /// Validate a token and require it to be of the expected kind.
    ///
    /// Signature validity alone does not stop a refresh token from being
    /// presented as an access token, so every caller goes through here.
    pub fn validate_kind(&self, token: &str, expected: TokenKind) -> Result<Claims, TokenError> {
        self.validate_kind_at(token, expected, Utc::now().timestamp())
    }

    pub fn validate_kind_at(
        &self,
        token: &str,
        expected: TokenKind,
        now: i64,
    ) -> Result<Claims, TokenError> {
        let claims = self.validate_at(token, now)?;
        if claims.kind != expected {
            return Err(TokenError::WrongKind {
                expected: expected.to_string(),
            });
        }
        Ok(claims)
    }
}

fn ttl_to_seconds(ttl: u64) -> Result<i64, TokenError> {
    i64::try_from(ttl)
        .map_err(|_| TokenError::Signing(format!("token lifetime {}s too large", ttl)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "unit-test-secret-that-is-long-enough";

    fn jwt() -> JwtUtils {
        JwtUtils::new(SECRET, 900, 604_800).unwrap()
    }

    fn validate_now(jwt: &JwtUtils, token: &str) -> Result<Claims, TokenError> {
        jwt.validate_at(token, Utc::now().timestamp())
    }

    #[test]
    fn test_access_token_round_trip() {
        let jwt = jwt();
        let token = jwt.issue_access("user-1").unwrap();
        let claims = validate_now(&jwt, &token).unwrap();
        assert_eq!(claims.user_id(), "user-1");
        assert_eq!(claims.kind, TokenKind::Access);
        assert_eq!(claims.exp - claims.iat, 900);
    }

    #[test]
    fn test_refresh_token_lifetime() {
        let jwt = jwt();
        let token = jwt.issue_refresh("user-1").unwrap();
        let claims = validate_now(&jwt, &token).unwrap();
        assert_eq!(claims.kind, TokenKind::Refresh);
        assert_eq!(claims.exp - claims.iat, 604_800);
    }

    #[test]
    fn test_expiry_boundary() {
        let jwt = jwt();
        let issued_at = Utc::now().timestamp();
        let token = jwt.issue_at("user-1", TokenKind::Access, issued_at).unwrap();

        assert!(jwt.validate_at(&token, issued_at + 899).is_ok());
        assert!(matches!(
            jwt.validate_at(&token, issued_at + 900),
            Err(TokenError::Expired)
        ));
        assert!(matches!(
            jwt.validate_at(&token, issued_at + 10_000),
            Err(TokenError::Expired)
        ));
    }

    #[test]
    fn test_long_expired_token_is_expired() {
        let jwt = jwt();
        let token = jwt
            .issue_at("user-1", TokenKind::Refresh, 1_000_000)
            .unwrap();
        assert!(matches!(validate_now(&jwt, &token), Err(TokenError::Expired)));
    }

    #[test]
    fn test_other_secret_is_invalid_signature() {
        let token = jwt().issue_access("user-1").unwrap();
        let other = JwtUtils::new("a-completely-different-secret", 900, 604_800).unwrap();
        assert!(matches!(
            validate_now(&other, &token),
            Err(TokenError::InvalidSignature)
        ));
    }

    #[test]
    fn test_garbage_is_malformed() {
        let jwt = jwt();
        assert!(matches!(
            validate_now(&jwt, "not.a.token"),
            Err(TokenError::Malformed(_))
        ));
        assert!(matches!(validate_now(&jwt, ""), Err(TokenError::Malformed(_))));
    }

    #[test]
    fn test_kind_is_enforced_both_ways() {
        let jwt = jwt();
        let access = jwt.issue_access("user-1").unwrap();
        let refresh = jwt.issue_refresh("user-1").unwrap();

        assert!(jwt.validate_kind(&access, TokenKind::Access).is_ok());
        assert!(jwt.validate_kind(&refresh, TokenKind::Refresh).is_ok());
        assert!(matches!(
            jwt.validate_kind(&access, TokenKind::Refresh),
            Err(TokenError::WrongKind { .. })
        ));
        assert!(matches!(
            jwt.validate_kind(&refresh, TokenKind::Access),
            Err(TokenError::WrongKind { .. })
        ));
    }

    #[test]
    fn test_tokens_minted_together_differ() {
        let jwt = jwt();
        let now = Utc::now().timestamp();
        let first = jwt.issue_at("user-1", TokenKind::Refresh, now).unwrap();
        let second = jwt.issue_at("user-1", TokenKind::Refresh, now).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_oversized_lifetime_is_signing_error() {
        assert!(matches!(
            JwtUtils::new(SECRET, u64::MAX, 604_800),
            Err(TokenError::Signing(_))
        ));

        let jwt = JwtUtils::new(SECRET, i64::MAX as u64, 604_800).unwrap();
        assert!(matches!(
            jwt.issue_at("user-1", TokenKind::Access, 1),
            Err(TokenError::Signing(_))
        ));
    }

    #[test]
    fn test_empty_secret_is_signing_error() {
        assert!(matches!(
            JwtUtils::new("", 900, 604_800),
            Err(TokenError::Signing(_))
        ));
    }
}
