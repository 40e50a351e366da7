//! # Middleware Module
//!
//! Cross-cutting request interceptors.
//!
//! - `auth`: rejects requests to protected routes without a valid session

pub mod auth;
