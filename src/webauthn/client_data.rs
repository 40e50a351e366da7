//! # Collected Client Data
//!
//! The browser serializes a small JSON document, the "collected client
//! data", and the authenticator signs (a hash of) it. Verifying it binds
//! the response to our ceremony: the right nonce, the right origin, the
//! right ceremony type.

use serde::Deserialize;
use subtle::ConstantTimeEq;

use crate::webauthn::error::{CeremonyError, CeremonyResult};
use crate::webauthn::types::base64url_decode;

/// Which ceremony a client data document belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CeremonyType {
    /// Registration: `"webauthn.create"`.
    Create,
    /// Authentication: `"webauthn.get"`.
    Get,
}

impl CeremonyType {
    fn marker(self) -> &'static str {
        match self {
            CeremonyType::Create => "webauthn.create",
            CeremonyType::Get => "webauthn.get",
        }
    }
}

/// Parsed `clientDataJSON`. Unknown fields are ignored, as the WebAuthn
/// spec requires of relying parties.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientData {
    #[serde(rename = "type")]
    pub type_: String,
    /// The challenge, base64url-encoded by the browser.
    pub challenge: String,
    pub origin: String,
    #[serde(default, rename = "crossOrigin")]
    pub cross_origin: bool,
}

impl ClientData {
    pub fn parse(raw: &[u8]) -> CeremonyResult<Self> {
        serde_json::from_slice(raw)
            .map_err(|e| CeremonyError::AttestationInvalid(format!("client data JSON: {e}")))
    }

    /// Check the three bindings in order: ceremony type, challenge, origin.
    ///
    /// The challenge comparison is constant-time. The origin comparison is
    /// exact, byte for byte: a scheme or port deviation is a mismatch,
    /// never normalized away.
    pub fn verify(
        &self,
        expected_challenge: &[u8],
        expected_origin: &str,
        ceremony: CeremonyType,
    ) -> CeremonyResult<()> {
        if self.type_ != ceremony.marker() {
            return Err(CeremonyError::AttestationInvalid(format!(
                "unexpected client data type {:?}",
                self.type_
            )));
        }

        let presented = base64url_decode(&self.challenge)?;
        if !bool::from(presented.ct_eq(expected_challenge)) {
            return Err(CeremonyError::AttestationInvalid(
                "challenge does not match the issued nonce".into(),
            ));
        }

        if self.origin != expected_origin {
            return Err(CeremonyError::OriginMismatch);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::webauthn::types::base64url_encode;

    fn client_data_json(type_: &str, challenge: &[u8], origin: &str) -> Vec<u8> {
        serde_json::json!({
            "type": type_,
            "challenge": base64url_encode(challenge),
            "origin": origin,
            "crossOrigin": false,
        })
        .to_string()
        .into_bytes()
    }

    #[test]
    fn accepts_matching_client_data() {
        let raw = client_data_json("webauthn.create", b"nonce-0123456789", "https://x.com");
        let cd = ClientData::parse(&raw).unwrap();
        cd.verify(b"nonce-0123456789", "https://x.com", CeremonyType::Create)
            .unwrap();
    }

    #[test]
    fn rejects_wrong_ceremony_marker() {
        let raw = client_data_json("webauthn.get", b"nonce-0123456789", "https://x.com");
        let cd = ClientData::parse(&raw).unwrap();
        let err = cd
            .verify(b"nonce-0123456789", "https://x.com", CeremonyType::Create)
            .unwrap_err();
        assert!(matches!(err, CeremonyError::AttestationInvalid(_)));
    }

    #[test]
    fn rejects_wrong_challenge() {
        let raw = client_data_json("webauthn.get", b"nonce-0123456789", "https://x.com");
        let cd = ClientData::parse(&raw).unwrap();
        let err = cd
            .verify(b"other-nonce-1234", "https://x.com", CeremonyType::Get)
            .unwrap_err();
        assert!(matches!(err, CeremonyError::AttestationInvalid(_)));
    }

    #[test]
    fn rejects_origin_deviation_including_port() {
        let raw = client_data_json("webauthn.get", b"nonce-0123456789", "https://x.com:8443");
        let cd = ClientData::parse(&raw).unwrap();
        let err = cd
            .verify(b"nonce-0123456789", "https://x.com", CeremonyType::Get)
            .unwrap_err();
        assert_eq!(err, CeremonyError::OriginMismatch);
    }

    #[test]
    fn rejects_garbage_json() {
        assert!(matches!(
            ClientData::parse(b"not json").unwrap_err(),
            CeremonyError::AttestationInvalid(_)
        ));
    }
}
