//! Attestation object parsing and statement validation
//!
//! Supported statement formats: `none` (what the issued options request,
//! nothing to check) and `packed` self-attestation (signature over
//! authData || SHA-256(clientDataJSON) under the credential's own key).
//! Certificate-chain formats are rejected outright: chain trust is not
//! validated here, and accepting an unchecked chain would be worse than
//! refusing it.

use ciborium::Value;

use super::authenticator_data::{AuthDataError, AuthenticatorData};
use super::cose::CosePublicKey;
use super::signature::SignatureVerifier;

#[derive(Debug, thiserror::Error)]
pub enum AttestationError {
    #[error("attestation object is not valid CBOR")]
    Cbor,
    #[error("attestation object field {0:?} missing or malformed")]
    Field(&'static str),
    #[error("authenticator data: {0}")]
    AuthData(#[from] AuthDataError),
    #[error("unsupported attestation format {0:?}")]
    UnsupportedFormat(String),
    #[error("attestation statement algorithm {stmt} does not match credential key {key}")]
    AlgorithmMismatch { stmt: i64, key: i64 },
    #[error("attestation signature invalid: {0}")]
    Signature(String),
}

/// Decoded attestation object from a registration response.
#[derive(Debug)]
pub struct AttestationObject {
    pub fmt: String,
    pub auth_data_bytes: Vec<u8>,
    pub auth_data: AuthenticatorData,
    alg: Option<i64>,
    sig: Option<Vec<u8>>,
    has_x5c: bool,
}

impl AttestationObject {
    pub fn parse(bytes: &[u8]) -> Result<Self, AttestationError> {
        let value: Value = ciborium::de::from_reader(bytes).map_err(|_| AttestationError::Cbor)?;
        let map = value.as_map().ok_or(AttestationError::Field("root"))?;

        let fmt = text_entry(map, "fmt")
            .ok_or(AttestationError::Field("fmt"))?
            .to_string();
        let auth_data_bytes = entry(map, "authData")
            .and_then(Value::as_bytes)
            .ok_or(AttestationError::Field("authData"))?
            .clone();
        let att_stmt = entry(map, "attStmt")
            .and_then(Value::as_map)
            .ok_or(AttestationError::Field("attStmt"))?;

        let alg = entry(att_stmt, "alg")
            .and_then(Value::as_integer)
            .and_then(|i| i64::try_from(i128::from(i)).ok());
        let sig = entry(att_stmt, "sig").and_then(Value::as_bytes).cloned();
        let has_x5c = entry(att_stmt, "x5c").is_some();

        let auth_data = AuthenticatorData::parse(&auth_data_bytes)?;

        Ok(Self {
            fmt,
            auth_data_bytes,
            auth_data,
            alg,
            sig,
            has_x5c,
        })
    }

    /// Validate the attestation statement against the credential public key
    /// extracted from the authenticator data.
    pub fn verify_statement(
        &self,
        client_data_hash: &[u8],
        credential_key: &CosePublicKey,
        verifier: &dyn SignatureVerifier,
    ) -> Result<(), AttestationError> {
        match self.fmt.as_str() {
            "none" => Ok(()),
            "packed" if self.has_x5c => {
                Err(AttestationError::UnsupportedFormat("packed/x5c".to_string()))
            }
            "packed" => {
                let alg = self.alg.ok_or(AttestationError::Field("alg"))?;
                let key_alg = credential_key.algorithm().id();
                if alg != key_alg {
                    return Err(AttestationError::AlgorithmMismatch {
                        stmt: alg,
                        key: key_alg,
                    });
                }
                let sig = self.sig.as_deref().ok_or(AttestationError::Field("sig"))?;
                let mut message = self.auth_data_bytes.clone();
                message.extend_from_slice(client_data_hash);
                verifier
                    .verify(credential_key, &message, sig)
                    .map_err(|err| AttestationError::Signature(err.to_string()))
            }
            other => Err(AttestationError::UnsupportedFormat(other.to_string())),
        }
    }
}

fn entry<'a>(map: &'a [(Value, Value)], key: &str) -> Option<&'a Value> {
    map.iter()
        .find(|(k, _)| k.as_text() == Some(key))
        .map(|(_, v)| v)
}

fn text_entry<'a>(map: &'a [(Value, Value)], key: &str) -> Option<&'a str> {
    entry(map, key)?.as_text()
}
