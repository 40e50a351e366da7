//! # Ceremony Errors
//!
//! Closed enumeration of every way a passkey ceremony can fail. The
//! verifiers and the credential lifecycle layer only ever return these
//! variants, so callers are forced to handle each failure kind explicitly
//! instead of catching a catch-all error.
//!
//! None of these are retried internally: every failure is terminal for the
//! ceremony attempt, and the caller may start a brand-new ceremony (with a
//! fresh challenge) if desired.

use thiserror::Error;

/// Everything that can go wrong while running a registration or
/// authentication ceremony, or mutating the durable credential set.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CeremonyError {
    /// No challenge is pending for this identity. Covers both "never
    /// requested" and "already consumed"; challenges are single-use, so a
    /// replayed completion lands here.
    #[error("no pending challenge for this identity")]
    NoPendingChallenge,

    /// A challenge existed but outlived its time window. The entry is
    /// discarded on detection; it cannot be reused.
    #[error("challenge has expired")]
    ChallengeExpired,

    /// The origin embedded in the client data does not byte-for-byte match
    /// the configured relying-party origin (scheme and port included).
    #[error("client data origin does not match the relying party origin")]
    OriginMismatch,

    /// The rpIdHash in the authenticator data does not match the SHA-256 of
    /// the configured relying-party ID.
    #[error("authenticator data rpIdHash does not match the relying party id")]
    RpIdMismatch,

    /// The response is structurally malformed: bad base64, bad CBOR, a
    /// truncated authenticator-data layout, an unsupported key type, a
    /// wrong ceremony type marker, or a challenge that does not match the
    /// issued nonce. The cause is kept for server-side diagnostics only.
    #[error("invalid authenticator response: {0}")]
    AttestationInvalid(String),

    /// The assertion signature did not verify against the stored public key.
    #[error("assertion signature verification failed")]
    SignatureInvalid,

    /// The signature counter did not advance even though the authenticator
    /// reports counter support. Fatal and non-retryable; the credential may
    /// have been cloned and should be revoked.
    #[error("signature counter regression: authenticator may be cloned")]
    PossibleCloneDetected,

    /// The presented credential ID is not stored for any user.
    #[error("presented credential is not registered")]
    UnknownCredential,

    /// The presented credential belongs to a different user than the
    /// claimed identity.
    #[error("credential does not belong to the claimed identity")]
    UserIdentityMismatch,

    /// A credential with this ID already exists, for this or any other
    /// user. Credential IDs are globally unique.
    #[error("credential is already registered")]
    CredentialAlreadyRegistered,

    /// A user must retain at least one passkey; deleting the final one is
    /// rejected.
    #[error("cannot remove the last remaining passkey")]
    CannotRemoveLastCredential,

    /// Authentication options were requested for a user with no registered
    /// credentials.
    #[error("no passkeys registered for this identity")]
    NoCredentialsRegistered,
}

/// Result alias used throughout the ceremony code.
pub type CeremonyResult<T> = Result<T, CeremonyError>;
