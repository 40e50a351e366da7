//! # Database Models
//!
//! Row types for the two durable tables: users and their passkey
//! credentials. Challenges are deliberately not a table; they live in the
//! in-process challenge store, which owns them exclusively.
//!
//! ## Why Strings for dates?
//! SQLite stores timestamps as text (RFC3339), which keeps the mapping and
//! the JSON serialization straightforward.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user account. Identity on the wire is the email; `id` is the database
/// primary key (UUID v4) and the session subject.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: String,
    pub email: String,
    /// Shown during passkey creation.
    pub display_name: String,
    pub created_at: String,
    pub updated_at: String,
}

impl User {
    pub fn new(email: String, display_name: String) -> Self {
        let now = Utc::now().to_rfc3339();
        Self {
            id: Uuid::new_v4().to_string(),
            email,
            display_name,
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

/// A registered passkey credential.
///
/// Only the public half of the key pair is stored; the private key never
/// leaves the user's authenticator. `id` is the credential ID
/// base64url-encoded, which doubles as the wire representation and gives
/// the UNIQUE primary key that enforces global credential-id uniqueness.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PasskeyCredential {
    /// Credential ID, base64url (no padding).
    pub id: String,

    /// Owner. Every credential belongs to exactly one user.
    pub user_id: String,

    /// COSE-encoded public key bytes, stored as BLOB.
    pub public_key: Vec<u8>,

    /// Signature counter, monotonically non-decreasing. A regression during
    /// authentication is treated as a cloned-authenticator signal.
    pub counter: i64,

    /// Transports as a JSON array string, e.g. `["internal","hybrid"]`.
    pub transports: Option<String>,

    pub created_at: String,

    /// Updated atomically with the counter on each successful login.
    pub last_used_at: Option<String>,
}
