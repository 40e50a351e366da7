//! # civitas-auth
//!
//! Passkey (WebAuthn) authentication for the Civitas personal data vault.
//!
//! The crate is organized around the ceremony core in [`webauthn`]
//! (challenge store, option builder, registration and authentication
//! verifiers), with [`db`] owning durable credential state and
//! [`handlers`] wiring both into the HTTP surface.

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod state;
pub mod webauthn;
