//! # Credential Management Handlers
//!
//! Authenticated endpoints for listing and revoking the current user's
//! passkeys. Revocation goes through the credential lifecycle layer, which
//! refuses to delete the last remaining passkey.

use crate::db::credentials;
use crate::error::{AppError, AppResult};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};
use tower_sessions::Session;

async fn session_user_id(session: &Session) -> AppResult<String> {
    session
        .get::<String>("user_id")
        .await
        .map_err(|e| AppError::Internal(format!("Session error: {}", e)))?
        .ok_or_else(|| AppError::Unauthorized("Not authenticated".to_string()))
}

/// List the current user's passkeys.
///
/// Returns metadata only (id, transports, timestamps). Public keys stay
/// server-side and counters are an implementation detail.
pub async fn list_credentials(
    State(state): State<AppState>,
    session: Session,
) -> AppResult<Json<Value>> {
    let user_id = session_user_id(&session).await?;

    let rows = credentials::find_by_user_id(&state.db, &user_id).await?;
    let items: Vec<Value> = rows
        .iter()
        .map(|row| {
            json!({
                "id": row.id,
                "transports": credentials::decode_transports(row.transports.as_deref()),
                "created_at": row.created_at,
                "last_used_at": row.last_used_at,
            })
        })
        .collect();

    Ok(Json(json!({ "credentials": items })))
}

/// Revoke one passkey. Deleting the final passkey is rejected so the user
/// cannot lock themselves out.
pub async fn delete_credential(
    State(state): State<AppState>,
    session: Session,
    Path(credential_id): Path<String>,
) -> AppResult<Json<Value>> {
    let user_id = session_user_id(&session).await?;

    credentials::delete_credential(&state.db, &user_id, &credential_id).await?;
    tracing::info!(%user_id, %credential_id, "passkey revoked");

    Ok(Json(json!({
        "success": true,
        "message": "Passkey removed"
    })))
}
