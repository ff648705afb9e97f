//! WebAuthn verification primitives
//!
//! Everything the ceremonies need to take apart and check an authenticator
//! response:
//!
//! - `client_data`: collectedClientData JSON validation
//! - `authenticator_data`: raw authenticator-data byte parsing
//! - `attestation`: CBOR attestation object parsing and statement checks
//! - `cose`: COSE_Key credential public keys
//! - `signature`: the pluggable signature-verification seam

mod attestation;
mod authenticator_data;
mod client_data;
mod cose;
mod signature;

pub use attestation::{AttestationError, AttestationObject};
pub use authenticator_data::{AttestedCredentialData, AuthDataError, AuthenticatorData};
pub use client_data::{
    verify_client_data, ClientDataError, CLIENT_DATA_TYPE_CREATE, CLIENT_DATA_TYPE_GET,
};
pub use cose::{CoseAlgorithm, CoseError, CosePublicKey, ALG_ES256, ALG_RS256};
pub use signature::{PlatformVerifier, SignatureError, SignatureVerifier};

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

/// Decode an unpadded base64url field from a ceremony response.
pub(crate) fn decode_b64url(value: &str) -> Option<Vec<u8>> {
    URL_SAFE_NO_PAD.decode(value).ok()
}
