//! # Database Module
//!
//! Durable storage: users and their passkey credentials.
//!
//! - `models`: row types
//! - `users`: user CRUD
//! - `credentials`: credential lifecycle (uniqueness, minimum count,
//!   atomic counter updates)
//!
//! Ephemeral ceremony challenges deliberately do not live here; see
//! `crate::webauthn::challenge`.

pub mod credentials;
pub mod models;
pub mod users;
