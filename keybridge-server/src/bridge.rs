//! Bridge-token collaborator
//!
//! A short-lived HS256 token carries the customer id from the social-login
//! OAuth callback into the registration ceremony. This module only verifies
//! it (and mints it for tests and local tooling); the OAuth flows that issue
//! it in production live in a separate service.

use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use keybridge_core::UserId;
use serde::{Deserialize, Serialize};

/// Bridge tokens outlive the OAuth callback by at most this long.
pub const BRIDGE_TOKEN_TTL_SECS: u64 = 600;

#[derive(Debug, Serialize, Deserialize)]
struct BridgeClaims {
    #[serde(rename = "customerId")]
    customer_id: i64,
    iat: u64,
    exp: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum BridgeTokenError {
    #[error("bridge token rejected: {0}")]
    Verification(String),
}

/// Verify the token and extract the customer id it carries. Expired or
/// tampered tokens fail fast; there is nothing to retry.
pub fn verify(token: &str, secret: &str) -> Result<UserId, BridgeTokenError> {
    let validation = Validation::new(Algorithm::HS256);
    let data = decode::<BridgeClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|err| BridgeTokenError::Verification(err.to_string()))?;

    Ok(UserId::from(data.claims.customer_id.to_string()))
}

/// Mint a bridge token for `customer_id`.
pub fn sign(customer_id: i64, secret: &str) -> Result<String, BridgeTokenError> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs();
    let claims = BridgeClaims {
        customer_id,
        iat: now,
        exp: now + BRIDGE_TOKEN_TTL_SECS,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|err| BridgeTokenError::Verification(err.to_string()))
}
