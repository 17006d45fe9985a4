//! Authentication module for user registration, login and token lifecycle.
//!
//! This module provides the public interface for authentication-related functionality:
//! the workflow service, request/response models, handlers, routes and the
//! bearer-token middleware.

pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod service;
