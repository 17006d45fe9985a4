//! Cryptographic helpers for credentials and tokens.

pub mod jwt;
pub mod password;
