//! # Ceremony Wire Types
//!
//! Request/response shapes exchanged with the browser's WebAuthn API.
//! Field names follow the WebAuthn dictionary spelling (camelCase), and all
//! byte strings (challenges, credential IDs, user handles, client data,
//! authenticator data, signatures) cross the boundary base64url-encoded
//! without padding.

use serde::{Deserialize, Serialize};

use crate::webauthn::error::{CeremonyError, CeremonyResult};

/// Encode bytes as base64url without padding, the WebAuthn wire encoding.
pub fn base64url_encode(data: &[u8]) -> String {
    use base64::prelude::*;
    BASE64_URL_SAFE_NO_PAD.encode(data)
}

/// Decode a base64url string (no padding). Malformed input is a malformed
/// response, so it surfaces as `AttestationInvalid`.
pub fn base64url_decode(s: &str) -> CeremonyResult<Vec<u8>> {
    use base64::prelude::*;
    BASE64_URL_SAFE_NO_PAD
        .decode(s.as_bytes())
        .map_err(|e| CeremonyError::AttestationInvalid(format!("base64url decode: {e}")))
}

/// How the client may reach an authenticator. Stored alongside the
/// credential and echoed back in authentication allow-lists so the browser
/// can route to the right device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthenticatorTransport {
    Usb,
    Nfc,
    Ble,
    Internal,
    Hybrid,
}

/// Options returned by `POST /api/auth/register/start`, consumed by
/// `navigator.credentials.create()`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreationOptions {
    /// Freshly minted nonce, base64url.
    pub challenge: String,
    pub rp: RpEntity,
    pub user: UserEntity,
    pub pub_key_cred_params: Vec<PubKeyCredParam>,
    /// Ceremony timeout hint in milliseconds.
    pub timeout: u32,
    /// Credentials the user already holds, so an authenticator refuses to
    /// re-register one of them.
    pub exclude_credentials: Vec<CredentialDescriptor>,
    pub authenticator_selection: AuthenticatorSelection,
    /// Always "none": attestation trust chains are not verified here.
    pub attestation: String,
}

/// Options returned by `POST /api/auth/authenticate/start`, consumed by
/// `navigator.credentials.get()`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestOptions {
    pub challenge: String,
    pub rp_id: String,
    pub timeout: u32,
    pub allow_credentials: Vec<CredentialDescriptor>,
    pub user_verification: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RpEntity {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserEntity {
    /// Opaque user handle, base64url. Distinct from the database primary
    /// key; only used by authenticators to disambiguate accounts.
    pub id: String,
    pub name: String,
    pub display_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PubKeyCredParam {
    #[serde(rename = "type")]
    pub type_: String,
    /// COSE algorithm identifier: -7 = ES256, -8 = EdDSA.
    pub alg: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CredentialDescriptor {
    #[serde(rename = "type")]
    pub type_: String,
    /// Credential ID, base64url.
    pub id: String,
    pub transports: Vec<AuthenticatorTransport>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatorSelection {
    pub resident_key: String,
    pub user_verification: String,
}

/// The credential produced by `navigator.credentials.create()`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationResponse {
    pub id: String,
    /// Credential ID as presented by the client, base64url.
    pub raw_id: String,
    #[serde(rename = "type")]
    pub type_: String,
    pub response: AttestationPayload,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttestationPayload {
    #[serde(rename = "clientDataJSON")]
    pub client_data_json: String,
    pub attestation_object: String,
    #[serde(default)]
    pub transports: Vec<AuthenticatorTransport>,
}

/// The assertion produced by `navigator.credentials.get()`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssertionResponse {
    pub id: String,
    pub raw_id: String,
    #[serde(rename = "type")]
    pub type_: String,
    pub response: AssertionPayload,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssertionPayload {
    #[serde(rename = "clientDataJSON")]
    pub client_data_json: String,
    pub authenticator_data: String,
    pub signature: String,
    #[serde(default)]
    pub user_handle: Option<String>,
}

/// What a verified registration hands back to the lifecycle layer: the
/// durable credential record, ready to persist. The verifier itself never
/// touches storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedCredential {
    pub credential_id: Vec<u8>,
    /// COSE-encoded public key bytes, re-serialized canonically.
    pub public_key: Vec<u8>,
    /// Initial signature counter reported by the authenticator.
    pub counter: u32,
    pub transports: Vec<AuthenticatorTransport>,
}
