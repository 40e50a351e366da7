//! # Authentication Verifier
//!
//! Validates a client's assertion response against the pending challenge
//! and a stored credential, enforcing signature-counter anti-replay.
//!
//! The caller supplies the stored public key and counter for the credential
//! the client claims to present; locating that credential (and rejecting
//! `UnknownCredential` / `UserIdentityMismatch`) happens before this call.
//! On success the new counter is returned, and the caller persists it
//! atomically with the login record rather than eagerly, so a crash between
//! counter update and session issuance cannot lock the legitimate user out
//! of the next clone check.

use sha2::{Digest, Sha256};

use crate::webauthn::authenticator_data::AuthenticatorData;
use crate::webauthn::challenge::ChallengeStore;
use crate::webauthn::client_data::{CeremonyType, ClientData};
use crate::webauthn::cose::CosePublicKey;
use crate::webauthn::error::{CeremonyError, CeremonyResult};
use crate::webauthn::types::{base64url_decode, AssertionResponse};
use crate::webauthn::RelyingParty;

/// Verify an assertion response. Returns the authenticator's new signature
/// counter on success.
pub fn complete_authentication(
    rp: &RelyingParty,
    store: &ChallengeStore,
    identity: &str,
    response: &AssertionResponse,
    stored_public_key: &[u8],
    stored_counter: u32,
) -> CeremonyResult<u32> {
    let nonce = store.take(identity)?;

    let client_data_raw = base64url_decode(&response.response.client_data_json)?;
    let client_data = ClientData::parse(&client_data_raw)?;
    client_data.verify(&nonce, &rp.origin, CeremonyType::Get)?;

    let auth_data_raw = base64url_decode(&response.response.authenticator_data)?;
    let auth_data = AuthenticatorData::parse(&auth_data_raw)?;
    auth_data.verify_rp_id(&rp.id)?;
    if !auth_data.user_present() {
        return Err(CeremonyError::AttestationInvalid(
            "user presence flag not set".into(),
        ));
    }

    // The authenticator signs authenticatorData || SHA-256(clientDataJSON).
    let client_data_hash = Sha256::digest(&client_data_raw);
    let mut message = auth_data_raw.clone();
    message.extend_from_slice(&client_data_hash);

    let key = CosePublicKey::parse(stored_public_key)?;
    let signature = base64url_decode(&response.response.signature)?;
    key.verify(&message, &signature)?;

    check_counter(auth_data.counter, stored_counter)?;

    Ok(auth_data.counter)
}

/// Anti-replay / clone detection.
///
/// If either side has ever seen a nonzero counter, the new value must be
/// strictly greater than the stored one. An authenticator that reports 0 on
/// every use signals "counter not supported" and is accepted without the
/// monotonicity check, a trust assumption shared with common relying-party
/// libraries: a replayed zero-counter response is indistinguishable from a
/// counter-less authenticator.
fn check_counter(new_counter: u32, stored_counter: u32) -> CeremonyResult<()> {
    if new_counter == 0 && stored_counter == 0 {
        return Ok(());
    }
    if new_counter <= stored_counter {
        return Err(CeremonyError::PossibleCloneDetected);
    }
    Ok(())
}
