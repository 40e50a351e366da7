//! # Attestation Object
//!
//! The registration response carries a CBOR map with three entries:
//! `fmt` (attestation statement format), `attStmt` (the statement itself)
//! and `authData` (the binary authenticator data).
//!
//! Attestation is accepted at the "none"/self level: the statement is
//! parsed structurally but its trust chain is not verified. What matters
//! for credential extraction is `authData`.

use ciborium::value::Value;

use crate::webauthn::authenticator_data::AuthenticatorData;
use crate::webauthn::error::{CeremonyError, CeremonyResult};

#[derive(Debug, Clone)]
pub struct AttestationObject {
    pub fmt: String,
    pub auth_data: AuthenticatorData,
    /// Raw authenticator data bytes, kept for callers that need the exact
    /// signed byte string.
    pub auth_data_bytes: Vec<u8>,
}

impl AttestationObject {
    pub fn parse(raw: &[u8]) -> CeremonyResult<Self> {
        let value: Value = ciborium::de::from_reader(raw).map_err(|e| {
            CeremonyError::AttestationInvalid(format!("attestation object CBOR: {e}"))
        })?;
        let entries = value.as_map().ok_or_else(|| {
            CeremonyError::AttestationInvalid("attestation object is not a CBOR map".into())
        })?;

        let fmt = match field(entries, "fmt") {
            Some(Value::Text(s)) => s.clone(),
            _ => {
                return Err(CeremonyError::AttestationInvalid(
                    "attestation object missing fmt".into(),
                ))
            }
        };

        // attStmt must be present and a map, even when empty ("none").
        match field(entries, "attStmt") {
            Some(Value::Map(_)) => {}
            _ => {
                return Err(CeremonyError::AttestationInvalid(
                    "attestation object missing attStmt".into(),
                ))
            }
        }

        let auth_data_bytes = match field(entries, "authData") {
            Some(Value::Bytes(b)) => b.clone(),
            _ => {
                return Err(CeremonyError::AttestationInvalid(
                    "attestation object missing authData".into(),
                ))
            }
        };

        let auth_data = AuthenticatorData::parse(&auth_data_bytes)?;

        Ok(Self {
            fmt,
            auth_data,
            auth_data_bytes,
        })
    }
}

fn field<'a>(entries: &'a [(Value, Value)], name: &str) -> Option<&'a Value> {
    entries.iter().find_map(|(k, v)| match k {
        Value::Text(s) if s == name => Some(v),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sha2::{Digest, Sha256};

    fn encode(value: &Value) -> Vec<u8> {
        let mut buf = Vec::new();
        ciborium::ser::into_writer(value, &mut buf).unwrap();
        buf
    }

    fn minimal_auth_data() -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&Sha256::digest(b"x.com"));
        out.push(0x01);
        out.extend_from_slice(&0u32.to_be_bytes());
        out
    }

    #[test]
    fn parses_none_attestation() {
        let obj = Value::Map(vec![
            (Value::Text("fmt".into()), Value::Text("none".into())),
            (Value::Text("attStmt".into()), Value::Map(vec![])),
            (
                Value::Text("authData".into()),
                Value::Bytes(minimal_auth_data()),
            ),
        ]);

        let parsed = AttestationObject::parse(&encode(&obj)).unwrap();
        assert_eq!(parsed.fmt, "none");
        assert_eq!(parsed.auth_data.counter, 0);
        assert_eq!(parsed.auth_data_bytes, minimal_auth_data());
    }

    #[test]
    fn rejects_missing_auth_data() {
        let obj = Value::Map(vec![
            (Value::Text("fmt".into()), Value::Text("none".into())),
            (Value::Text("attStmt".into()), Value::Map(vec![])),
        ]);

        assert!(matches!(
            AttestationObject::parse(&encode(&obj)).unwrap_err(),
            CeremonyError::AttestationInvalid(_)
        ));
    }

    #[test]
    fn rejects_non_cbor_input() {
        assert!(matches!(
            AttestationObject::parse(b"{\"json\": true}").unwrap_err(),
            CeremonyError::AttestationInvalid(_)
        ));
    }
}
