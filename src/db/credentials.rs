//! # Credential Lifecycle
//!
//! Owns the invariants over the durable credential set that the ceremony
//! verifiers cannot see:
//!
//! - credential IDs are globally unique, across all users: a collision at
//!   insertion fails `CredentialAlreadyRegistered`, whether it is the same
//!   user re-registering an authenticator or a different user presenting a
//!   colliding ID
//! - a user must retain at least one credential; deleting the final one
//!   fails `CannotRemoveLastCredential`
//! - the signature counter is persisted atomically with the login record
//!
//! Credentials have no state machine beyond existing: revocation is a hard
//! row delete, not a tombstone.

use crate::db::models::PasskeyCredential;
use crate::error::{AppError, AppResult};
use crate::webauthn::error::CeremonyError;
use crate::webauthn::types::{base64url_encode, AuthenticatorTransport, VerifiedCredential};
use chrono::Utc;
use sqlx::SqlitePool;

/// Persist a verified credential for a user.
///
/// Fails with `CredentialAlreadyRegistered` when the credential ID already
/// exists for any user. The pre-check and insert run inside one
/// transaction so a concurrent insert of the same ID cannot slip between
/// them (the UNIQUE primary key backstops it regardless).
pub async fn insert_credential(
    pool: &SqlitePool,
    user_id: &str,
    credential: &VerifiedCredential,
) -> AppResult<PasskeyCredential> {
    let row = PasskeyCredential {
        id: base64url_encode(&credential.credential_id),
        user_id: user_id.to_string(),
        public_key: credential.public_key.clone(),
        counter: i64::from(credential.counter),
        transports: encode_transports(&credential.transports)?,
        created_at: Utc::now().to_rfc3339(),
        last_used_at: None,
    };

    let mut tx = pool.begin().await?;

    let existing: Option<(String,)> =
        sqlx::query_as("SELECT id FROM passkey_credentials WHERE id = ?")
            .bind(&row.id)
            .fetch_optional(&mut *tx)
            .await?;
    if existing.is_some() {
        return Err(CeremonyError::CredentialAlreadyRegistered.into());
    }

    sqlx::query(
        "INSERT INTO passkey_credentials
         (id, user_id, public_key, counter, transports, created_at, last_used_at)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&row.id)
    .bind(&row.user_id)
    .bind(&row.public_key)
    .bind(row.counter)
    .bind(&row.transports)
    .bind(&row.created_at)
    .bind(&row.last_used_at)
    .execute(&mut *tx)
    .await
    .map_err(|e| match e {
        // UNIQUE violation from a racing insert.
        sqlx::Error::Database(ref db) if db.is_unique_violation() => {
            AppError::Ceremony(CeremonyError::CredentialAlreadyRegistered)
        }
        _ => AppError::Database(e),
    })?;

    tx.commit().await?;

    Ok(row)
}

/// All credentials registered to a user. Empty vector when none.
pub async fn find_by_user_id(
    pool: &SqlitePool,
    user_id: &str,
) -> AppResult<Vec<PasskeyCredential>> {
    let credentials = sqlx::query_as::<_, PasskeyCredential>(
        "SELECT * FROM passkey_credentials WHERE user_id = ? ORDER BY created_at",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(credentials)
}

/// Look up one credential by its (base64url) credential ID, across all
/// users; ownership is checked by the caller.
pub async fn find_by_credential_id(
    pool: &SqlitePool,
    credential_id: &str,
) -> AppResult<Option<PasskeyCredential>> {
    let credential =
        sqlx::query_as::<_, PasskeyCredential>("SELECT * FROM passkey_credentials WHERE id = ?")
            .bind(credential_id)
            .fetch_one(pool)
            .await;

    match credential {
        Ok(c) => Ok(Some(c)),
        Err(sqlx::Error::RowNotFound) => Ok(None),
        Err(e) => Err(AppError::Database(e)),
    }
}

/// Resolve the credential a client claims to present and check ownership.
///
/// Fails with `UnknownCredential` when no such credential is stored and
/// `UserIdentityMismatch` when it belongs to a different user than the
/// claimed identity.
pub async fn find_owned_credential(
    pool: &SqlitePool,
    user_id: &str,
    credential_id: &str,
) -> AppResult<PasskeyCredential> {
    let stored = find_by_credential_id(pool, credential_id)
        .await?
        .ok_or(CeremonyError::UnknownCredential)?;

    if stored.user_id != user_id {
        return Err(CeremonyError::UserIdentityMismatch.into());
    }

    Ok(stored)
}

pub async fn count_by_user(pool: &SqlitePool, user_id: &str) -> AppResult<i64> {
    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM passkey_credentials WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(pool)
            .await?;

    Ok(count)
}

/// Record a successful login: counter and last_used_at move together in a
/// single statement, so the counter can never advance without the login
/// being recorded (and vice versa).
pub async fn record_login(
    pool: &SqlitePool,
    credential_id: &str,
    new_counter: u32,
) -> AppResult<()> {
    let result = sqlx::query(
        "UPDATE passkey_credentials SET counter = ?, last_used_at = ? WHERE id = ?",
    )
    .bind(i64::from(new_counter))
    .bind(Utc::now().to_rfc3339())
    .bind(credential_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(CeremonyError::UnknownCredential.into());
    }

    Ok(())
}

/// Revoke one of a user's credentials.
///
/// Runs inside a transaction: the count check and the delete see the same
/// snapshot, so two concurrent deletes cannot both remove "one of two"
/// credentials and leave the user with none.
pub async fn delete_credential(
    pool: &SqlitePool,
    user_id: &str,
    credential_id: &str,
) -> AppResult<()> {
    let mut tx = pool.begin().await?;

    // Match the target row first: a nonexistent or foreign id must fail
    // `UnknownCredential` even when only one credential remains.
    let target: Option<(String,)> =
        sqlx::query_as("SELECT id FROM passkey_credentials WHERE id = ? AND user_id = ?")
            .bind(credential_id)
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?;
    if target.is_none() {
        return Err(CeremonyError::UnknownCredential.into());
    }

    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM passkey_credentials WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&mut *tx)
            .await?;
    if count <= 1 {
        return Err(CeremonyError::CannotRemoveLastCredential.into());
    }

    sqlx::query("DELETE FROM passkey_credentials WHERE id = ? AND user_id = ?")
        .bind(credential_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(())
}

/// Serialize transports for storage as a JSON array string.
fn encode_transports(transports: &[AuthenticatorTransport]) -> AppResult<Option<String>> {
    if transports.is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::to_string(transports)?))
}

/// Deserialize stored transports; unknown or corrupt values degrade to an
/// empty list rather than failing a ceremony.
pub fn decode_transports(stored: Option<&str>) -> Vec<AuthenticatorTransport> {
    stored
        .and_then(|s| serde_json::from_str(s).ok())
        .unwrap_or_default()
}
