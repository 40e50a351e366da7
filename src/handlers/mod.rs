//! # HTTP Request Handlers
//!
//! Route handlers, one module per concern:
//! - `health`: liveness endpoint
//! - `auth`: ceremony endpoints (register, authenticate, logout, session)
//! - `users`: current-user profile
//! - `credentials`: passkey listing and revocation
//!
//! Handlers extract request data, orchestrate the ceremony/db layers, and
//! shape the JSON response; they hold no verification logic themselves.

pub mod auth;
pub mod credentials;
pub mod health;
pub mod users;
