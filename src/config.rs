//! # Configuration Management
//!
//! Configuration comes from environment variables (12-factor style), with
//! a `.env` file honored for local development.
//!
//! ## Environment Variables
//! - `HOST`: server bind address (default: 127.0.0.1)
//! - `PORT`: server port (default: 8080)
//! - `DATABASE_URL`: SQLite connection string
//! - `RP_ID`: relying-party ID, i.e. your domain, no scheme or port
//! - `RP_ORIGIN`: the exact expected web origin, scheme and port included
//! - `RP_NAME`: human-readable service name shown during passkey creation
//! - `CHALLENGE_TTL_SECS`: maximum age of a pending challenge (default: 300)

use anyhow::Result;
use std::env;

/// Application configuration, loaded once at startup.
///
/// The relying-party triple (`rp_id`, `rp_origin`, `rp_name`) is
/// process-wide and read-only: every ceremony in this process verifies
/// against the same RP context.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,

    /// SQLite connection URL; "mode=rwc" creates the file if missing.
    pub database_url: String,

    /// The domain your app is served from. For local development:
    /// "localhost"; for production: "example.com" without protocol or port.
    pub rp_id: String,

    /// Full URL where your app is accessible. Origins are compared
    /// byte-for-byte during verification, so this must match exactly what
    /// browsers send, including scheme and any non-default port.
    pub rp_origin: String,

    /// Shown to users when they create a passkey.
    pub rp_name: String,

    /// Pending challenges older than this are discarded at take time.
    pub challenge_ttl_secs: u64,
}

impl Config {
    /// Load configuration from the environment (and `.env` if present).
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Config {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),

            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()?,

            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:civitas_auth.db?mode=rwc".to_string()),

            rp_id: env::var("RP_ID").unwrap_or_else(|_| "localhost".to_string()),

            rp_origin: env::var("RP_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:8080".to_string()),

            rp_name: env::var("RP_NAME").unwrap_or_else(|_| "Civitas".to_string()),

            challenge_ttl_secs: env::var("CHALLENGE_TTL_SECS")
                .unwrap_or_else(|_| "300".to_string())
                .parse()?,
        })
    }

    /// Socket address for the TCP listener, e.g. "127.0.0.1:8080".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
