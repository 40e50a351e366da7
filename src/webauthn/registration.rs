//! # Registration Verifier
//!
//! Validates a client's attestation response against the pending challenge
//! and extracts the durable credential record.
//!
//! ## Verification order
//! 1. Consume the pending challenge (single-use, success or failure)
//! 2. Client data: ceremony type `webauthn.create`, challenge, exact origin
//! 3. Attestation object: CBOR structure, rpIdHash, user-present flag,
//!    attested credential data
//! 4. COSE public key: supported algorithm, valid key material
//!
//! All steps must pass or the call fails atomically. The verifier performs
//! no database access and knows nothing about other users' credentials;
//! uniqueness and persistence belong to the credential lifecycle layer.
//!
//! ## Security Note
//! The consumed challenge is gone even when verification fails: a client
//! cannot fix up a rejected response and retry it, it has to start a new
//! ceremony with a fresh challenge.

use crate::webauthn::attestation::AttestationObject;
use crate::webauthn::challenge::ChallengeStore;
use crate::webauthn::client_data::{CeremonyType, ClientData};
use crate::webauthn::cose::CosePublicKey;
use crate::webauthn::error::{CeremonyError, CeremonyResult};
use crate::webauthn::types::{base64url_decode, RegistrationResponse, VerifiedCredential};
use crate::webauthn::RelyingParty;

/// Verify an attestation response and extract the credential to persist.
pub fn complete_registration(
    rp: &RelyingParty,
    store: &ChallengeStore,
    identity: &str,
    response: &RegistrationResponse,
) -> CeremonyResult<VerifiedCredential> {
    // Consume first: the challenge must be burned no matter what the rest
    // of the response looks like.
    let nonce = store.take(identity)?;

    let client_data_raw = base64url_decode(&response.response.client_data_json)?;
    let client_data = ClientData::parse(&client_data_raw)?;
    client_data.verify(&nonce, &rp.origin, CeremonyType::Create)?;

    let attestation_raw = base64url_decode(&response.response.attestation_object)?;
    let attestation = AttestationObject::parse(&attestation_raw)?;

    let auth_data = &attestation.auth_data;
    auth_data.verify_rp_id(&rp.id)?;
    if !auth_data.user_present() {
        return Err(CeremonyError::AttestationInvalid(
            "user presence flag not set".into(),
        ));
    }

    let attested = auth_data.attested_credential_data.as_ref().ok_or_else(|| {
        CeremonyError::AttestationInvalid("no attested credential data in response".into())
    })?;

    // The ID the client presented must be the ID the authenticator attested.
    let presented_id = base64url_decode(&response.raw_id)?;
    if presented_id != attested.credential_id {
        return Err(CeremonyError::AttestationInvalid(
            "presented credential id does not match attested credential id".into(),
        ));
    }

    let key = CosePublicKey::parse(&attested.cose_key_bytes)?;

    Ok(VerifiedCredential {
        credential_id: attested.credential_id.clone(),
        public_key: key.to_cose_bytes()?,
        counter: auth_data.counter,
        transports: response.response.transports.clone(),
    })
}
