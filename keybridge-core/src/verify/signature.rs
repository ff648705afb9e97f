//! Signature verification seam
//!
//! The ceremonies only ever ask one question of the cryptography: is this
//! signature valid for this public key over these bytes. Keeping that behind
//! a trait lets tests drive the full ceremony state machines with
//! deterministic keys instead of platform authenticators.

use p256::ecdsa::signature::Verifier;
use p256::ecdsa::{Signature as P256Signature, VerifyingKey};
use rsa::{BigUint, Pkcs1v15Sign, RsaPublicKey};
use sha2::{Digest, Sha256};

use super::cose::CosePublicKey;

#[derive(Debug, thiserror::Error)]
pub enum SignatureError {
    #[error("public key rejected: {0}")]
    Key(String),
    #[error("signature malformed: {0}")]
    Malformed(String),
    #[error("signature verification failed")]
    Invalid,
}

/// Verify `signature` over `message` under `key`.
pub trait SignatureVerifier: Send + Sync {
    fn verify(
        &self,
        key: &CosePublicKey,
        message: &[u8],
        signature: &[u8],
    ) -> Result<(), SignatureError>;
}

/// Production verifier covering the algorithm allow-list: ES256 and RS256.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlatformVerifier;

impl SignatureVerifier for PlatformVerifier {
    fn verify(
        &self,
        key: &CosePublicKey,
        message: &[u8],
        signature: &[u8],
    ) -> Result<(), SignatureError> {
        match key {
            CosePublicKey::Es256 { x, y } => {
                let mut sec1 = Vec::with_capacity(65);
                sec1.push(0x04);
                sec1.extend_from_slice(x);
                sec1.extend_from_slice(y);
                let verifying_key = VerifyingKey::from_sec1_bytes(&sec1)
                    .map_err(|err| SignatureError::Key(err.to_string()))?;
                let signature = P256Signature::from_der(signature)
                    .map_err(|err| SignatureError::Malformed(err.to_string()))?;
                verifying_key
                    .verify(message, &signature)
                    .map_err(|_| SignatureError::Invalid)
            }
            CosePublicKey::Rs256 { n, e } => {
                let public_key =
                    RsaPublicKey::new(BigUint::from_bytes_be(n), BigUint::from_bytes_be(e))
                        .map_err(|err| SignatureError::Key(err.to_string()))?;
                let digest = Sha256::digest(message);
                public_key
                    .verify(Pkcs1v15Sign::new::<Sha256>(), &digest, signature)
                    .map_err(|_| SignatureError::Invalid)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use p256::ecdsa::{signature::Signer, SigningKey};

    use super::*;

    fn deterministic_key() -> SigningKey {
        let mut scalar = [0u8; 32];
        scalar[31] = 0x2a;
        SigningKey::from_bytes(&scalar.into()).unwrap()
    }

    fn cose_key_for(signing_key: &SigningKey) -> CosePublicKey {
        let point = signing_key.verifying_key().to_encoded_point(false);
        CosePublicKey::Es256 {
            x: <[u8; 32]>::try_from(point.x().unwrap().as_slice()).unwrap(),
            y: <[u8; 32]>::try_from(point.y().unwrap().as_slice()).unwrap(),
        }
    }

    #[test]
    fn verifies_a_real_es256_signature() {
        let signing_key = deterministic_key();
        let message = b"authenticator data || client data hash";
        let signature: p256::ecdsa::Signature = signing_key.sign(message);

        PlatformVerifier
            .verify(
                &cose_key_for(&signing_key),
                message,
                signature.to_der().as_bytes(),
            )
            .unwrap();
    }

    #[test]
    fn rejects_signature_over_different_message() {
        let signing_key = deterministic_key();
        let signature: p256::ecdsa::Signature = signing_key.sign(b"signed bytes");

        let err = PlatformVerifier
            .verify(
                &cose_key_for(&signing_key),
                b"different bytes",
                signature.to_der().as_bytes(),
            )
            .unwrap_err();
        assert!(matches!(err, SignatureError::Invalid));
    }

    #[test]
    fn rejects_garbage_der() {
        let signing_key = deterministic_key();
        let err = PlatformVerifier
            .verify(&cose_key_for(&signing_key), b"message", &[0xFF, 0x00])
            .unwrap_err();
        assert!(matches!(err, SignatureError::Malformed(_)));
    }
}
