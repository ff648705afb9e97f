//! COSE_Key credential public keys
//!
//! The credential store keeps the raw CBOR produced at registration; this
//! module decodes it back into usable key material on every ceremony.

use ciborium::Value;

/// COSE algorithm identifier: ECDSA over P-256 with SHA-256.
pub const ALG_ES256: i64 = -7;
/// COSE algorithm identifier: RSASSA-PKCS1-v1_5 with SHA-256.
pub const ALG_RS256: i64 = -257;

const KTY_EC2: i64 = 2;
const KTY_RSA: i64 = 3;
const CRV_P256: i64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoseAlgorithm {
    Es256,
    Rs256,
}

impl CoseAlgorithm {
    pub fn from_id(id: i64) -> Option<Self> {
        match id {
            ALG_ES256 => Some(Self::Es256),
            ALG_RS256 => Some(Self::Rs256),
            _ => None,
        }
    }

    pub fn id(self) -> i64 {
        match self {
            Self::Es256 => ALG_ES256,
            Self::Rs256 => ALG_RS256,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CoseError {
    #[error("COSE key is not valid CBOR")]
    Cbor,
    #[error("COSE key is not a map")]
    NotAMap,
    #[error("COSE key algorithm {0} is not in the allow-list")]
    UnsupportedAlgorithm(i64),
    #[error("COSE key field {0:?} missing or malformed")]
    Field(&'static str),
    #[error("COSE key type {kty} does not match algorithm {alg}")]
    KeyTypeMismatch { kty: i64, alg: i64 },
}

/// Decoded credential public key, restricted to the algorithm allow-list.
#[derive(Debug, Clone)]
pub enum CosePublicKey {
    /// P-256 point, uncompressed coordinates.
    Es256 { x: [u8; 32], y: [u8; 32] },
    /// RSA modulus and exponent, big-endian.
    Rs256 { n: Vec<u8>, e: Vec<u8> },
}

impl CosePublicKey {
    pub fn parse(bytes: &[u8]) -> Result<Self, CoseError> {
        let value: Value = ciborium::de::from_reader(bytes).map_err(|_| CoseError::Cbor)?;
        let map = value.as_map().ok_or(CoseError::NotAMap)?;

        let kty = int_entry(map, 1).ok_or(CoseError::Field("kty"))?;
        let alg = int_entry(map, 3).ok_or(CoseError::Field("alg"))?;

        match alg {
            ALG_ES256 => {
                if kty != KTY_EC2 {
                    return Err(CoseError::KeyTypeMismatch { kty, alg });
                }
                let crv = int_entry(map, -1).ok_or(CoseError::Field("crv"))?;
                if crv != CRV_P256 {
                    return Err(CoseError::Field("crv"));
                }
                let x = fixed_bytes_entry(map, -2).ok_or(CoseError::Field("x"))?;
                let y = fixed_bytes_entry(map, -3).ok_or(CoseError::Field("y"))?;
                Ok(Self::Es256 { x, y })
            }
            ALG_RS256 => {
                if kty != KTY_RSA {
                    return Err(CoseError::KeyTypeMismatch { kty, alg });
                }
                let n = bytes_entry(map, -1).ok_or(CoseError::Field("n"))?;
                let e = bytes_entry(map, -2).ok_or(CoseError::Field("e"))?;
                Ok(Self::Rs256 { n, e })
            }
            other => Err(CoseError::UnsupportedAlgorithm(other)),
        }
    }

    pub fn algorithm(&self) -> CoseAlgorithm {
        match self {
            Self::Es256 { .. } => CoseAlgorithm::Es256,
            Self::Rs256 { .. } => CoseAlgorithm::Rs256,
        }
    }
}

fn entry<'a>(map: &'a [(Value, Value)], label: i64) -> Option<&'a Value> {
    map.iter()
        .find(|(k, _)| k.as_integer().map(i128::from) == Some(label as i128))
        .map(|(_, v)| v)
}

fn int_entry(map: &[(Value, Value)], label: i64) -> Option<i64> {
    entry(map, label)?
        .as_integer()
        .and_then(|i| i64::try_from(i128::from(i)).ok())
}

fn bytes_entry(map: &[(Value, Value)], label: i64) -> Option<Vec<u8>> {
    entry(map, label)?.as_bytes().cloned()
}

fn fixed_bytes_entry(map: &[(Value, Value)], label: i64) -> Option<[u8; 32]> {
    let bytes = entry(map, label)?.as_bytes()?;
    <[u8; 32]>::try_from(bytes.as_slice()).ok()
}
