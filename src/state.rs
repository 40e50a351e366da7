//! # Application State
//!
//! The shared resources every request handler can reach: the database
//! pool, the relying-party context, and the challenge store. Axum clones
//! the state per request; all three members are cheap to clone (pool
//! handle, two `Arc`s).

use crate::config::Config;
use crate::webauthn::challenge::ChallengeStore;
use crate::webauthn::RelyingParty;
use anyhow::Result;
use sqlx::sqlite::SqlitePool;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct AppState {
    /// SQLite connection pool; users and credentials live here.
    pub db: SqlitePool,

    /// Process-wide relying-party context. Read-only after startup.
    pub rp: Arc<RelyingParty>,

    /// Single-use challenge tracker. The only shared mutable state two
    /// requests for the same identity can race on.
    pub challenges: Arc<ChallengeStore>,
}

impl AppState {
    /// Connect to the database, run migrations, and freeze the RP context.
    pub async fn new(config: &Config) -> Result<Self> {
        let db = SqlitePool::connect(&config.database_url).await?;

        sqlx::migrate!("./migrations").run(&db).await?;

        let rp = Arc::new(RelyingParty {
            id: config.rp_id.clone(),
            name: config.rp_name.clone(),
            origin: config.rp_origin.clone(),
        });

        let challenges = Arc::new(ChallengeStore::new(Duration::from_secs(
            config.challenge_ttl_secs,
        )));

        Ok(AppState { db, rp, challenges })
    }
}
