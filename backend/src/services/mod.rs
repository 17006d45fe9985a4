//! Module for core business logic services.
//!
//! Services here sit between the authentication workflow and the credential
//! store.

pub mod refresh_fingerprint;
