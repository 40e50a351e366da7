//! # Authenticator Data
//!
//! Parser for the fixed binary layout every authenticator response carries:
//!
//! ```text
//! rpIdHash (32) || flags (1) || signCount (4, big-endian)
//!     || [attested credential data: aaguid (16) || credIdLen (2, BE)
//!         || credentialId || COSE public key (CBOR)]
//!     || [extensions (CBOR)]
//! ```
//!
//! Attested credential data is only present when the AT flag is set, i.e.
//! during registration. Assertions carry just the 37-byte prefix (plus
//! optional extensions).

use sha2::{Digest, Sha256};

use crate::webauthn::error::{CeremonyError, CeremonyResult};

/// Flag bits in the authenticator data flags byte.
const FLAG_USER_PRESENT: u8 = 0x01;
const FLAG_USER_VERIFIED: u8 = 0x04;
const FLAG_ATTESTED_CREDENTIAL_DATA: u8 = 0x40;
const FLAG_EXTENSION_DATA: u8 = 0x80;

/// The credential material embedded at registration time.
#[derive(Debug, Clone)]
pub struct AttestedCredentialData {
    pub aaguid: [u8; 16],
    pub credential_id: Vec<u8>,
    /// The COSE public key and anything after it (possibly extension
    /// data); the COSE parser reads exactly one CBOR item from the front.
    pub cose_key_bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct AuthenticatorData {
    pub rp_id_hash: [u8; 32],
    pub flags: u8,
    /// Signature counter; 0 is the "counter not supported" sentinel.
    pub counter: u32,
    pub attested_credential_data: Option<AttestedCredentialData>,
}

impl AuthenticatorData {
    pub fn parse(raw: &[u8]) -> CeremonyResult<Self> {
        if raw.len() < 37 {
            return Err(CeremonyError::AttestationInvalid(format!(
                "authenticator data truncated: {} bytes",
                raw.len()
            )));
        }

        let mut rp_id_hash = [0u8; 32];
        rp_id_hash.copy_from_slice(&raw[..32]);
        let flags = raw[32];
        let counter = u32::from_be_bytes([raw[33], raw[34], raw[35], raw[36]]);

        let attested_credential_data = if flags & FLAG_ATTESTED_CREDENTIAL_DATA != 0 {
            Some(Self::parse_attested(&raw[37..])?)
        } else {
            None
        };

        Ok(Self {
            rp_id_hash,
            flags,
            counter,
            attested_credential_data,
        })
    }

    fn parse_attested(rest: &[u8]) -> CeremonyResult<AttestedCredentialData> {
        // aaguid (16) + credential id length (2) is the minimum.
        if rest.len() < 18 {
            return Err(CeremonyError::AttestationInvalid(
                "attested credential data truncated".into(),
            ));
        }

        let mut aaguid = [0u8; 16];
        aaguid.copy_from_slice(&rest[..16]);
        let id_len = u16::from_be_bytes([rest[16], rest[17]]) as usize;

        let id_end = 18 + id_len;
        if rest.len() < id_end {
            return Err(CeremonyError::AttestationInvalid(
                "credential id extends past the authenticator data".into(),
            ));
        }

        Ok(AttestedCredentialData {
            aaguid,
            credential_id: rest[18..id_end].to_vec(),
            cose_key_bytes: rest[id_end..].to_vec(),
        })
    }

    pub fn user_present(&self) -> bool {
        self.flags & FLAG_USER_PRESENT != 0
    }

    pub fn user_verified(&self) -> bool {
        self.flags & FLAG_USER_VERIFIED != 0
    }

    pub fn has_extension_data(&self) -> bool {
        self.flags & FLAG_EXTENSION_DATA != 0
    }

    /// Check that the embedded hash commits to our relying-party ID.
    pub fn verify_rp_id(&self, rp_id: &str) -> CeremonyResult<()> {
        let expected: [u8; 32] = Sha256::digest(rp_id.as_bytes()).into();
        if self.rp_id_hash != expected {
            return Err(CeremonyError::RpIdMismatch);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assertion_auth_data(rp_id: &str, flags: u8, counter: u32) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&Sha256::digest(rp_id.as_bytes()));
        out.push(flags);
        out.extend_from_slice(&counter.to_be_bytes());
        out
    }

    #[test]
    fn parses_assertion_prefix() {
        let raw = assertion_auth_data("x.com", 0x05, 42);
        let ad = AuthenticatorData::parse(&raw).unwrap();

        assert!(ad.user_present());
        assert!(ad.user_verified());
        assert_eq!(ad.counter, 42);
        assert!(ad.attested_credential_data.is_none());
        ad.verify_rp_id("x.com").unwrap();
    }

    #[test]
    fn rejects_wrong_rp_id_hash() {
        let raw = assertion_auth_data("x.com", 0x01, 0);
        let ad = AuthenticatorData::parse(&raw).unwrap();
        assert_eq!(ad.verify_rp_id("evil.com").unwrap_err(), CeremonyError::RpIdMismatch);
    }

    #[test]
    fn rejects_truncated_input() {
        assert!(matches!(
            AuthenticatorData::parse(&[0u8; 36]).unwrap_err(),
            CeremonyError::AttestationInvalid(_)
        ));
    }

    #[test]
    fn parses_attested_credential_data() {
        let mut raw = assertion_auth_data("x.com", 0x41, 0);
        raw.extend_from_slice(&[0u8; 16]); // aaguid
        raw.extend_from_slice(&4u16.to_be_bytes());
        raw.extend_from_slice(b"cred");
        raw.extend_from_slice(&[0xa0]); // empty CBOR map standing in for the key

        let ad = AuthenticatorData::parse(&raw).unwrap();
        let attested = ad.attested_credential_data.unwrap();
        assert_eq!(attested.credential_id, b"cred");
        assert_eq!(attested.cose_key_bytes, vec![0xa0]);
    }

    #[test]
    fn rejects_credential_id_past_the_end() {
        let mut raw = assertion_auth_data("x.com", 0x41, 0);
        raw.extend_from_slice(&[0u8; 16]);
        raw.extend_from_slice(&200u16.to_be_bytes());
        raw.extend_from_slice(b"short");

        assert!(matches!(
            AuthenticatorData::parse(&raw).unwrap_err(),
            CeremonyError::AttestationInvalid(_)
        ));
    }
}
