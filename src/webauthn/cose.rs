//! # COSE Public Keys
//!
//! Credential public keys arrive embedded in authenticator data as
//! CBOR-encoded COSE_Key maps with integer labels:
//!
//! ```text
//! 1 (kty): 2 = EC2, 1 = OKP
//! 3 (alg): -7 = ES256, -8 = EdDSA
//! -1 (crv): 1 = P-256, 6 = Ed25519
//! -2 (x), -3 (y): coordinate byte strings
//! ```
//!
//! Parsing validates the key material eagerly (an invalid curve point is
//! rejected at registration, not discovered at login) and re-serializes the
//! key into a canonical minimal map for storage, so the stored blob is
//! independent of whatever extra fields or ordering the authenticator used.

use ciborium::value::Value;

use crate::webauthn::error::{CeremonyError, CeremonyResult};

/// COSE algorithm identifiers accepted during registration.
pub const ALG_ES256: i64 = -7;
pub const ALG_EDDSA: i64 = -8;

const KTY_OKP: i128 = 1;
const KTY_EC2: i128 = 2;
const CRV_P256: i128 = 1;
const CRV_ED25519: i128 = 6;

/// A validated credential public key.
#[derive(Debug, Clone)]
pub enum CosePublicKey {
    Es256(p256::ecdsa::VerifyingKey),
    Ed25519(ed25519_dalek::VerifyingKey),
}

impl CosePublicKey {
    /// Parse one COSE_Key item from the front of `bytes`.
    ///
    /// Trailing bytes (authenticator extensions following the key) are
    /// ignored; CBOR items are self-delimiting.
    pub fn parse(bytes: &[u8]) -> CeremonyResult<Self> {
        let value: Value = ciborium::de::from_reader(bytes)
            .map_err(|e| CeremonyError::AttestationInvalid(format!("COSE key CBOR: {e}")))?;
        let entries = value.as_map().ok_or_else(|| {
            CeremonyError::AttestationInvalid("COSE key is not a CBOR map".into())
        })?;

        let kty = label_int(entries, 1)
            .ok_or_else(|| CeremonyError::AttestationInvalid("COSE key missing kty".into()))?;
        let alg = label_int(entries, 3)
            .ok_or_else(|| CeremonyError::AttestationInvalid("COSE key missing alg".into()))?;
        let crv = label_int(entries, -1)
            .ok_or_else(|| CeremonyError::AttestationInvalid("COSE key missing crv".into()))?;

        match (kty, alg) {
            (KTY_EC2, a) if a == ALG_ES256 as i128 => {
                if crv != CRV_P256 {
                    return Err(CeremonyError::AttestationInvalid(format!(
                        "ES256 key on unexpected curve {crv}"
                    )));
                }
                let x = label_bytes(entries, -2, 32)?;
                let y = label_bytes(entries, -3, 32)?;
                let point = p256::EncodedPoint::from_affine_coordinates(
                    p256::FieldBytes::from_slice(&x),
                    p256::FieldBytes::from_slice(&y),
                    false,
                );
                let key = p256::ecdsa::VerifyingKey::from_encoded_point(&point).map_err(|_| {
                    CeremonyError::AttestationInvalid("x/y is not a valid P-256 point".into())
                })?;
                Ok(CosePublicKey::Es256(key))
            }
            (KTY_OKP, a) if a == ALG_EDDSA as i128 => {
                if crv != CRV_ED25519 {
                    return Err(CeremonyError::AttestationInvalid(format!(
                        "EdDSA key on unexpected curve {crv}"
                    )));
                }
                let x = label_bytes(entries, -2, 32)?;
                let mut raw = [0u8; 32];
                raw.copy_from_slice(&x);
                let key = ed25519_dalek::VerifyingKey::from_bytes(&raw).map_err(|_| {
                    CeremonyError::AttestationInvalid("invalid Ed25519 public key".into())
                })?;
                Ok(CosePublicKey::Ed25519(key))
            }
            _ => Err(CeremonyError::AttestationInvalid(format!(
                "unsupported COSE key (kty {kty}, alg {alg})"
            ))),
        }
    }

    /// COSE algorithm identifier of this key.
    pub fn algorithm(&self) -> i64 {
        match self {
            CosePublicKey::Es256(_) => ALG_ES256,
            CosePublicKey::Ed25519(_) => ALG_EDDSA,
        }
    }

    /// Canonical minimal COSE_Key encoding, used as the stored blob.
    pub fn to_cose_bytes(&self) -> CeremonyResult<Vec<u8>> {
        let value = match self {
            CosePublicKey::Es256(key) => {
                let point = key.to_encoded_point(false);
                let x = point.x().map(|b| b.to_vec()).unwrap_or_default();
                let y = point.y().map(|b| b.to_vec()).unwrap_or_default();
                Value::Map(vec![
                    (Value::from(1), Value::from(2)),
                    (Value::from(3), Value::from(ALG_ES256)),
                    (Value::from(-1), Value::from(1)),
                    (Value::from(-2), Value::Bytes(x)),
                    (Value::from(-3), Value::Bytes(y)),
                ])
            }
            CosePublicKey::Ed25519(key) => Value::Map(vec![
                (Value::from(1), Value::from(1)),
                (Value::from(3), Value::from(ALG_EDDSA)),
                (Value::from(-1), Value::from(6)),
                (Value::from(-2), Value::Bytes(key.to_bytes().to_vec())),
            ]),
        };

        let mut buf = Vec::new();
        ciborium::ser::into_writer(&value, &mut buf)
            .map_err(|e| CeremonyError::AttestationInvalid(format!("COSE key encode: {e}")))?;
        Ok(buf)
    }

    /// Verify `signature` over `message`.
    ///
    /// ES256 signatures arrive ASN.1/DER-encoded; Ed25519 signatures are
    /// the raw 64-byte form.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> CeremonyResult<()> {
        match self {
            CosePublicKey::Es256(key) => {
                use p256::ecdsa::signature::Verifier;
                let sig = p256::ecdsa::Signature::from_der(signature)
                    .map_err(|_| CeremonyError::SignatureInvalid)?;
                key.verify(message, &sig)
                    .map_err(|_| CeremonyError::SignatureInvalid)
            }
            CosePublicKey::Ed25519(key) => {
                use ed25519_dalek::Verifier;
                let sig = ed25519_dalek::Signature::from_slice(signature)
                    .map_err(|_| CeremonyError::SignatureInvalid)?;
                key.verify(message, &sig)
                    .map_err(|_| CeremonyError::SignatureInvalid)
            }
        }
    }
}

fn label_int(entries: &[(Value, Value)], label: i128) -> Option<i128> {
    lookup(entries, label).and_then(|v| match v {
        Value::Integer(i) => Some(i128::from(*i)),
        _ => None,
    })
}

fn label_bytes(entries: &[(Value, Value)], label: i128, len: usize) -> CeremonyResult<Vec<u8>> {
    match lookup(entries, label) {
        Some(Value::Bytes(b)) if b.len() == len => Ok(b.clone()),
        Some(Value::Bytes(b)) => Err(CeremonyError::AttestationInvalid(format!(
            "COSE coordinate {label} has length {}, expected {len}",
            b.len()
        ))),
        _ => Err(CeremonyError::AttestationInvalid(format!(
            "COSE key missing byte-string label {label}"
        ))),
    }
}

fn lookup<'a>(entries: &'a [(Value, Value)], label: i128) -> Option<&'a Value> {
    entries.iter().find_map(|(k, v)| match k {
        Value::Integer(i) if i128::from(*i) == label => Some(v),
        _ => None,
    })
}
