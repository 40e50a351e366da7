//! # Passkey Ceremonies
//!
//! Server-side WebAuthn logic: issuing ceremony options with single-use
//! challenges and verifying the authenticator's signed responses.
//!
//! ## Submodules
//! - `challenge`: single-use challenge store (put/take)
//! - `options`: registration/authentication option building
//! - `client_data`, `authenticator_data`, `attestation`, `cose`: pure
//!   parsers for the WebAuthn/CTAP2 encodings
//! - `registration`: attestation verification → durable credential record
//! - `authentication`: assertion verification + signature-counter check
//! - `error`: the closed `CeremonyError` taxonomy
//! - `types`: wire-level request/response shapes
//!
//! ## Ceremony Flow
//!
//! ### Registration
//! 1. Client asks to register → `options::registration_options()` mints a
//!    challenge and stores it keyed by identity
//! 2. Client creates a credential with its authenticator
//! 3. Client returns the attestation → `registration::complete_registration()`
//!    consumes the challenge, verifies the response and extracts the
//!    credential record; the caller persists it
//!
//! ### Authentication
//! 1. Client asks to log in → `options::authentication_options()` with the
//!    user's allow-list
//! 2. Client signs the challenge with its authenticator
//! 3. Client returns the assertion → `authentication::complete_authentication()`
//!    consumes the challenge, verifies the signature against the stored
//!    public key and enforces counter monotonicity; the caller persists the
//!    new counter together with the login
//!
//! The verifiers never touch storage: they consume the challenge store and
//! return typed results. All persistence decisions live with the caller.

pub mod attestation;
pub mod authentication;
pub mod authenticator_data;
pub mod challenge;
pub mod client_data;
pub mod cose;
pub mod error;
pub mod options;
pub mod registration;
pub mod types;

/// Process-wide relying-party context. Loaded once at startup, read-only
/// for the lifetime of the process, never mutated per request.
#[derive(Debug, Clone)]
pub struct RelyingParty {
    /// The RP ID: a domain string, hashed into every authenticator response.
    pub id: String,
    /// Human-readable name shown during passkey creation.
    pub name: String,
    /// The exact expected web origin, compared byte-for-byte.
    pub origin: String,
}
