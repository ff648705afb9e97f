//! Storefront login collaborator
//!
//! A successful authentication ceremony resolves a customer id; this module
//! turns it into the commerce platform's single-use customer-login token and
//! the redirect URL the storefront exchanges for a session. The ceremony
//! engine never sees any of this.

use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{encode, EncodingKey, Header};
use serde::Serialize;

use crate::config::StorefrontConfig;
use crate::error::ApiError;

#[derive(Debug, Serialize)]
struct LoginClaims {
    iss: String,
    iat: u64,
    jti: String,
    operation: &'static str,
    store_hash: String,
    customer_id: i64,
    channel_id: i64,
}

/// Build the single-use customer-login token.
pub fn build_login_token(customer_id: i64, store: &StorefrontConfig) -> Result<String, ApiError> {
    let iat = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs();

    let claims = LoginClaims {
        iss: store.client_id.clone(),
        iat,
        jti: uuid::Uuid::new_v4().to_string(),
        operation: "customer_login",
        store_hash: store.store_hash.clone(),
        customer_id,
        channel_id: store.channel_id,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(store.client_secret.as_bytes()),
    )
    .map_err(|err| ApiError::internal(format!("failed to build login token: {err}")))
}

/// Redirect URL that logs the customer into the storefront.
pub fn login_redirect_url(customer_id: i64, store: &StorefrontConfig) -> Result<String, ApiError> {
    let token = build_login_token(customer_id, store)?;
    Ok(format!(
        "{}/login/token/{}",
        store.store_url.trim_end_matches('/'),
        token
    ))
}
