//! # Error Handling
//!
//! Application-level errors and their HTTP mapping.
//!
//! Ceremony failures are security-sensitive: with two exceptions they all
//! collapse into the same generic external message, because telling an
//! attacker *why* a verification failed (wrong origin? unknown email?
//! consumed challenge?) is information they did not have before. The
//! detailed cause is logged server-side instead.
//!
//! The exceptions get a distinct explanation because the user has to act
//! on them: `PossibleCloneDetected` (revoke the credential) and
//! `CannotRemoveLastCredential` (keep at least one passkey).

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::webauthn::error::CeremonyError;

/// Application-wide error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// SQLx errors. `#[from]` lets `?` convert them directly.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A passkey ceremony or credential lifecycle failure; the closed
    /// enumeration every verifier returns.
    #[error("Ceremony error: {0}")]
    Ceremony(#[from] CeremonyError),

    /// JSON serialization/deserialization failures.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error".to_string(),
                )
            }
            AppError::Ceremony(e) => ceremony_response(e),
            AppError::Serialization(e) => {
                tracing::error!("Serialization error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Serialization error".to_string(),
                )
            }
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, self.to_string()),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Map a ceremony failure to its external face.
fn ceremony_response(e: &CeremonyError) -> (StatusCode, String) {
    // Full cause for operators; the client gets less.
    tracing::warn!("Ceremony failed: {}", e);

    match e {
        CeremonyError::PossibleCloneDetected => (
            StatusCode::UNAUTHORIZED,
            "Signature counter regression detected; this passkey may be cloned and should be revoked"
                .to_string(),
        ),
        CeremonyError::CannotRemoveLastCredential => (
            StatusCode::CONFLICT,
            "At least one passkey must remain registered".to_string(),
        ),
        _ => (StatusCode::UNAUTHORIZED, "Verification failed".to_string()),
    }
}

/// Convenience alias: `AppResult<T>` instead of `Result<T, AppError>`.
pub type AppResult<T> = Result<T, AppError>;
