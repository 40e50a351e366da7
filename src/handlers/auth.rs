//! # Ceremony Handlers
//!
//! HTTP orchestration of the passkey ceremonies. The handlers own every
//! storage decision: the verifiers below them consume challenges and check
//! cryptography, but persisting credentials, resolving identities, and
//! issuing sessions happens here.
//!
//! A ceremony is only reported successful after its credential or counter
//! update has been durably stored: the persistence call is awaited before
//! the success response (and before any session is created).

use crate::db::{credentials, users};
use crate::error::{AppError, AppResult};
use crate::state::AppState;
use crate::webauthn::error::CeremonyError;
use crate::webauthn::options::{self, CredentialRef};
use crate::webauthn::types::{
    base64url_decode, AssertionResponse, CreationOptions, RegistrationResponse, RequestOptions,
};
use crate::webauthn::{authentication, registration};
use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_sessions::Session;

#[derive(Debug, Deserialize)]
pub struct RegistrationStartRequest {
    pub email: String,
    /// Defaults to the email when absent.
    pub display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RegistrationFinishRequest {
    pub email: String,
    pub credential: RegistrationResponse,
}

#[derive(Debug, Deserialize)]
pub struct AuthenticationStartRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct AuthenticationFinishRequest {
    pub email: String,
    pub credential: AssertionResponse,
}

// Registration endpoints

/// Step 1 of registration: mint a challenge and return creation options.
///
/// Works for both brand-new identities (random user handle, user row
/// created only after the attestation verifies) and existing users adding
/// a second passkey (their current credentials become the exclude list).
pub async fn register_start(
    State(state): State<AppState>,
    Json(req): Json<RegistrationStartRequest>,
) -> AppResult<Json<CreationOptions>> {
    let display_name = req.display_name.clone().unwrap_or_else(|| req.email.clone());

    let (user_handle, exclude) = match users::find_by_email(&state.db, &req.email).await? {
        Some(user) => {
            let exclude = credential_refs(&credentials::find_by_user_id(&state.db, &user.id).await?);
            (user.id.into_bytes(), exclude)
        }
        // The handle only disambiguates authenticators; a placeholder is
        // fine before the user row exists.
        None => (options::new_user_handle(), Vec::new()),
    };

    let creation_options = options::registration_options(
        &state.rp,
        &state.challenges,
        &req.email,
        &display_name,
        &user_handle,
        &exclude,
    );

    Ok(Json(creation_options))
}

/// Step 2 of registration: verify the attestation and persist the
/// credential. Nothing is stored when any verification step fails.
pub async fn register_finish(
    State(state): State<AppState>,
    Json(req): Json<RegistrationFinishRequest>,
) -> AppResult<Json<Value>> {
    let verified = registration::complete_registration(
        &state.rp,
        &state.challenges,
        &req.email,
        &req.credential,
    )?;

    // Resolve or create the owner only after the attestation verified.
    let user = match users::find_by_email(&state.db, &req.email).await? {
        Some(user) => user,
        None => users::create_user(&state.db, &req.email, &req.email).await?,
    };

    let row = credentials::insert_credential(&state.db, &user.id, &verified).await?;
    tracing::info!(user_id = %user.id, credential_id = %row.id, "passkey registered");

    Ok(Json(json!({
        "success": true,
        "message": "Registration successful"
    })))
}

// Authentication endpoints

/// Step 1 of authentication: mint a challenge and return request options
/// carrying the user's allow-list.
pub async fn authenticate_start(
    State(state): State<AppState>,
    Json(req): Json<AuthenticationStartRequest>,
) -> AppResult<Json<RequestOptions>> {
    // An unknown email gets the same rejection as a user without passkeys.
    let allowed = match users::find_by_email(&state.db, &req.email).await? {
        Some(user) => credential_refs(&credentials::find_by_user_id(&state.db, &user.id).await?),
        None => Vec::new(),
    };

    let request_options =
        options::authentication_options(&state.rp, &state.challenges, &req.email, &allowed)?;

    Ok(Json(request_options))
}

/// Step 2 of authentication: verify the assertion, persist the new
/// counter together with the login record, then create the session.
pub async fn authenticate_finish(
    session: Session,
    State(state): State<AppState>,
    Json(req): Json<AuthenticationFinishRequest>,
) -> AppResult<Json<Value>> {
    let user = users::find_by_email(&state.db, &req.email)
        .await?
        .ok_or(CeremonyError::UnknownCredential)?;

    // Locate the credential the client claims to present and check
    // ownership. The stored key and counter feed the verifier.
    let stored =
        credentials::find_owned_credential(&state.db, &user.id, &req.credential.raw_id).await?;

    let stored_counter = u32::try_from(stored.counter)
        .map_err(|_| AppError::Internal("stored counter out of range".to_string()))?;

    let new_counter = authentication::complete_authentication(
        &state.rp,
        &state.challenges,
        &req.email,
        &req.credential,
        &stored.public_key,
        stored_counter,
    )?;

    // Durably record counter + login before reporting success or creating
    // the session.
    credentials::record_login(&state.db, &stored.id, new_counter).await?;

    session
        .insert("user_id", &user.id)
        .await
        .map_err(|e| AppError::Internal(format!("Session error: {}", e)))?;

    tracing::info!(user_id = %user.id, credential_id = %stored.id, "passkey login");

    Ok(Json(json!({
        "success": true,
        "user_id": user.id,
        "message": "Authentication successful"
    })))
}

pub async fn logout(State(_state): State<AppState>, session: Session) -> AppResult<Json<Value>> {
    session
        .delete()
        .await
        .map_err(|e| AppError::Internal(format!("Session error: {}", e)))?;

    Ok(Json(json!({
        "success": true,
        "message": "Logged out successfully"
    })))
}

pub async fn session_info(
    State(_state): State<AppState>,
    session: Session,
) -> AppResult<Json<Value>> {
    let user_id: Option<String> = session
        .get("user_id")
        .await
        .map_err(|e| AppError::Internal(format!("Session error: {}", e)))?;

    match user_id {
        Some(id) => Ok(Json(json!({
            "authenticated": true,
            "user_id": id
        }))),
        None => Ok(Json(json!({
            "authenticated": false
        }))),
    }
}

/// (credential id bytes, transports) pairs for option building.
fn credential_refs(rows: &[crate::db::models::PasskeyCredential]) -> Vec<CredentialRef> {
    rows.iter()
        .filter_map(|row| {
            let id = base64url_decode(&row.id).ok()?;
            Some((id, credentials::decode_transports(row.transports.as_deref())))
        })
        .collect()
}
