//! collectedClientData validation
//!
//! The browser serializes the ceremony context (operation type, challenge,
//! origin) into a JSON blob the authenticator signs over. The server must
//! check every field against what it issued before trusting the signature.

use serde::Deserialize;

use crate::ledger::Challenge;
use crate::rp::RelyingParty;

pub const CLIENT_DATA_TYPE_CREATE: &str = "webauthn.create";
pub const CLIENT_DATA_TYPE_GET: &str = "webauthn.get";

#[derive(Debug, Deserialize)]
struct CollectedClientData {
    #[serde(rename = "type")]
    ty: String,
    challenge: String,
    origin: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ClientDataError {
    #[error("client data is not valid base64url")]
    Encoding,
    #[error("client data is not valid JSON: {0}")]
    Json(String),
    #[error("unexpected client data type {got:?}, expected {expected:?}")]
    Type { got: String, expected: &'static str },
    #[error("challenge mismatch")]
    ChallengeMismatch,
    #[error("origin mismatch: authenticator saw {0:?}")]
    Origin(String),
}

/// Decode and validate one ceremony step's client data. Returns the raw
/// decoded bytes so the caller can hash them into the signature base.
pub fn verify_client_data(
    encoded: &str,
    expected_type: &'static str,
    expected_challenge: &Challenge,
    rp: &RelyingParty,
) -> Result<Vec<u8>, ClientDataError> {
    let raw = super::decode_b64url(encoded).ok_or(ClientDataError::Encoding)?;
    let parsed: CollectedClientData =
        serde_json::from_slice(&raw).map_err(|e| ClientDataError::Json(e.to_string()))?;

    if parsed.ty != expected_type {
        return Err(ClientDataError::Type {
            got: parsed.ty,
            expected: expected_type,
        });
    }
    if !expected_challenge.matches_base64url(&parsed.challenge) {
        return Err(ClientDataError::ChallengeMismatch);
    }
    if !rp.origin_matches(&parsed.origin) {
        return Err(ClientDataError::Origin(parsed.origin));
    }

    Ok(raw)
}

#[cfg(test)]
mod tests {
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

    use super::*;

    fn rp() -> RelyingParty {
        RelyingParty::new("Shop", "shop.example", "https://shop.example").unwrap()
    }

    fn encode(ty: &str, challenge: &str, origin: &str) -> String {
        let json = serde_json::json!({ "type": ty, "challenge": challenge, "origin": origin });
        URL_SAFE_NO_PAD.encode(serde_json::to_vec(&json).unwrap())
    }

    #[test]
    fn accepts_matching_client_data() {
        let challenge = Challenge::generate();
        let encoded = encode(
            CLIENT_DATA_TYPE_CREATE,
            &challenge.to_base64url(),
            "https://shop.example",
        );

        let raw =
            verify_client_data(&encoded, CLIENT_DATA_TYPE_CREATE, &challenge, &rp()).unwrap();
        assert!(!raw.is_empty());
    }

    #[test]
    fn rejects_wrong_ceremony_type() {
        let challenge = Challenge::generate();
        let encoded = encode(
            CLIENT_DATA_TYPE_GET,
            &challenge.to_base64url(),
            "https://shop.example",
        );

        let err = verify_client_data(&encoded, CLIENT_DATA_TYPE_CREATE, &challenge, &rp())
            .unwrap_err();
        assert!(matches!(err, ClientDataError::Type { .. }));
    }

    #[test]
    fn rejects_foreign_challenge() {
        let issued = Challenge::generate();
        let other = Challenge::generate();
        let encoded = encode(
            CLIENT_DATA_TYPE_GET,
            &other.to_base64url(),
            "https://shop.example",
        );

        let err = verify_client_data(&encoded, CLIENT_DATA_TYPE_GET, &issued, &rp()).unwrap_err();
        assert!(matches!(err, ClientDataError::ChallengeMismatch));
    }

    #[test]
    fn rejects_foreign_origin() {
        let challenge = Challenge::generate();
        let encoded = encode(
            CLIENT_DATA_TYPE_GET,
            &challenge.to_base64url(),
            "https://evil.example",
        );

        let err = verify_client_data(&encoded, CLIENT_DATA_TYPE_GET, &challenge, &rp()).unwrap_err();
        assert!(matches!(err, ClientDataError::Origin(_)));
    }

    #[test]
    fn rejects_garbage_encoding() {
        let challenge = Challenge::generate();
        let err = verify_client_data("%%%", CLIENT_DATA_TYPE_GET, &challenge, &rp()).unwrap_err();
        assert!(matches!(err, ClientDataError::Encoding));
    }
}
