//! # Ceremony Option Builder
//!
//! Builds the parameter sets handed to the browser's WebAuthn API and binds
//! a freshly minted challenge into the challenge store as a side effect.
//! Starting a second ceremony for the same identity silently invalidates
//! the first one's challenge.

use rand::RngCore;

use crate::webauthn::challenge::ChallengeStore;
use crate::webauthn::cose::{ALG_EDDSA, ALG_ES256};
use crate::webauthn::error::{CeremonyError, CeremonyResult};
use crate::webauthn::types::{
    base64url_encode, AuthenticatorSelection, AuthenticatorTransport, CreationOptions,
    CredentialDescriptor, PubKeyCredParam, RequestOptions, RpEntity, UserEntity,
};
use crate::webauthn::RelyingParty;

/// Ceremony timeout hint sent to clients, in milliseconds.
const CEREMONY_TIMEOUT_MS: u32 = 60_000;

/// Challenge length in bytes. WebAuthn requires at least 16; 32 matches
/// what common relying-party libraries emit.
const CHALLENGE_LEN: usize = 32;

/// A credential the options refer to: its raw ID and known transports.
pub type CredentialRef = (Vec<u8>, Vec<AuthenticatorTransport>);

fn mint_challenge() -> Vec<u8> {
    let mut nonce = vec![0u8; CHALLENGE_LEN];
    rand::rngs::OsRng.fill_bytes(&mut nonce);
    nonce
}

/// Generate an opaque user handle for a brand-new identity.
///
/// The handle only disambiguates accounts inside authenticators; it is
/// deliberately not the database primary key, so 32 random bytes are fine.
pub fn new_user_handle() -> Vec<u8> {
    let mut handle = vec![0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut handle);
    handle
}

/// Build registration options for `identity` and store the challenge.
///
/// `exclude` lists the credentials the user already holds so an
/// authenticator refuses to re-register one of them.
pub fn registration_options(
    rp: &RelyingParty,
    store: &ChallengeStore,
    identity: &str,
    display_name: &str,
    user_handle: &[u8],
    exclude: &[CredentialRef],
) -> CreationOptions {
    let nonce = mint_challenge();
    let options = CreationOptions {
        challenge: base64url_encode(&nonce),
        rp: RpEntity {
            id: rp.id.clone(),
            name: rp.name.clone(),
        },
        user: UserEntity {
            id: base64url_encode(user_handle),
            name: identity.to_owned(),
            display_name: display_name.to_owned(),
        },
        pub_key_cred_params: vec![
            PubKeyCredParam {
                type_: "public-key".into(),
                alg: ALG_ES256,
            },
            PubKeyCredParam {
                type_: "public-key".into(),
                alg: ALG_EDDSA,
            },
        ],
        timeout: CEREMONY_TIMEOUT_MS,
        exclude_credentials: descriptors(exclude),
        authenticator_selection: AuthenticatorSelection {
            resident_key: "preferred".into(),
            user_verification: "preferred".into(),
        },
        attestation: "none".into(),
    };

    // Overwrites any pending challenge for this identity.
    store.put(identity, nonce);
    options
}

/// Build authentication options for `identity` and store the challenge.
///
/// Fails with `NoCredentialsRegistered` when the allow-list is empty: a
/// user cannot authenticate with passkeys before registering one.
pub fn authentication_options(
    rp: &RelyingParty,
    store: &ChallengeStore,
    identity: &str,
    allowed: &[CredentialRef],
) -> CeremonyResult<RequestOptions> {
    if allowed.is_empty() {
        return Err(CeremonyError::NoCredentialsRegistered);
    }

    let nonce = mint_challenge();
    let options = RequestOptions {
        challenge: base64url_encode(&nonce),
        rp_id: rp.id.clone(),
        timeout: CEREMONY_TIMEOUT_MS,
        allow_credentials: descriptors(allowed),
        user_verification: "preferred".into(),
    };

    store.put(identity, nonce);
    Ok(options)
}

fn descriptors(credentials: &[CredentialRef]) -> Vec<CredentialDescriptor> {
    credentials
        .iter()
        .map(|(id, transports)| CredentialDescriptor {
            type_: "public-key".into(),
            id: base64url_encode(id),
            transports: transports.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::webauthn::types::base64url_decode;

    fn rp() -> RelyingParty {
        RelyingParty {
            id: "x.com".into(),
            name: "Civitas".into(),
            origin: "https://x.com".into(),
        }
    }

    #[test]
    fn registration_options_store_the_challenge() {
        let store = ChallengeStore::default();
        let options =
            registration_options(&rp(), &store, "a@x.com", "a@x.com", &new_user_handle(), &[]);

        let stored = store.take("a@x.com").unwrap();
        assert_eq!(base64url_decode(&options.challenge).unwrap(), stored);
        assert_eq!(stored.len(), 32);
        assert_eq!(options.attestation, "none");
        assert_eq!(options.rp.id, "x.com");
    }

    #[test]
    fn second_begin_overwrites_the_first() {
        let store = ChallengeStore::default();
        let first =
            registration_options(&rp(), &store, "a@x.com", "a@x.com", &new_user_handle(), &[]);
        let second =
            registration_options(&rp(), &store, "a@x.com", "a@x.com", &new_user_handle(), &[]);

        assert_ne!(first.challenge, second.challenge);
        let stored = store.take("a@x.com").unwrap();
        assert_eq!(base64url_decode(&second.challenge).unwrap(), stored);
    }

    #[test]
    fn authentication_requires_a_credential() {
        let store = ChallengeStore::default();
        assert_eq!(
            authentication_options(&rp(), &store, "a@x.com", &[]).unwrap_err(),
            CeremonyError::NoCredentialsRegistered
        );
        // Failure must not leave a challenge behind.
        assert_eq!(
            store.take("a@x.com").unwrap_err(),
            CeremonyError::NoPendingChallenge
        );
    }

    #[test]
    fn authentication_options_carry_the_allow_list() {
        let store = ChallengeStore::default();
        let allowed = vec![(vec![1, 2, 3], vec![AuthenticatorTransport::Internal])];
        let options = authentication_options(&rp(), &store, "a@x.com", &allowed).unwrap();

        assert_eq!(options.allow_credentials.len(), 1);
        assert_eq!(
            base64url_decode(&options.allow_credentials[0].id).unwrap(),
            vec![1, 2, 3]
        );
        assert_eq!(options.user_verification, "preferred");
        store.take("a@x.com").unwrap();
    }
}
