//! Ceremony endpoints
//!
//! The four registration/authentication steps. Bodies arrive as a closed set
//! of typed requests; a body that fails to deserialize is reported as
//! `MISSING_PARAMETERS` before any ceremony logic runs. Registration steps
//! re-verify the bridge token on every call; possession of a challenge is
//! never proof of identity.

use axum::extract::{rejection::JsonRejection, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use keybridge_core::{
    AssertionResponse, AuthenticationParameters, RegistrationParameters, RegistrationResponse,
    SessionId,
};

use crate::bridge;
use crate::error::ApiError;
use crate::login;
use crate::state::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegistrationOptionsRequest {
    /// Bridge token from the OAuth callback
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct RegistrationVerifyRequest {
    pub token: String,
    /// Attestation response from `navigator.credentials.create`
    pub credential: RegistrationResponse,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationVerifyResponse {
    pub ok: bool,
    pub credential_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationOptionsResponse {
    #[serde(flatten)]
    pub options: AuthenticationParameters,
    /// Echo this back in the verify call
    pub session_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationVerifyRequest {
    pub session_id: String,
    /// Assertion response from `navigator.credentials.get`
    pub credential: AssertionResponse,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationVerifyResponse {
    pub ok: bool,
    /// Storefront URL that completes the login
    pub redirect_url: String,
}

/// POST /webauthn/register/options
///
/// Start credential registration for the customer identified by the bridge
/// token. Returns creation options for `navigator.credentials.create`.
#[utoipa::path(
    post,
    path = "/webauthn/register/options",
    tag = "WebAuthn",
    request_body = RegistrationOptionsRequest,
    responses(
        (status = 200, description = "Credential creation options"),
        (status = 400, description = "Missing parameters"),
        (status = 401, description = "Bridge token invalid or expired")
    )
)]
pub async fn registration_options(
    State(state): State<AppState>,
    body: Result<Json<RegistrationOptionsRequest>, JsonRejection>,
) -> Result<Json<RegistrationParameters>, ApiError> {
    let Json(request) = body.map_err(|err| ApiError::missing(err.to_string()))?;

    let user_id = bridge::verify(&request.token, &state.config.bridge_token_secret)
        .map_err(|err| ApiError::IdentityTokenInvalid(err.to_string()))?;

    let params = state.engine.begin_registration(&user_id).await?;
    Ok(Json(params))
}

/// POST /webauthn/register/verify
///
/// Verify the authenticator's attestation response and store the credential.
#[utoipa::path(
    post,
    path = "/webauthn/register/verify",
    tag = "WebAuthn",
    request_body(content_type = "application/json", description = "Bridge token + attestation response"),
    responses(
        (status = 200, description = "Credential registered", body = RegistrationVerifyResponse),
        (status = 400, description = "Missing parameters, expired challenge, or invalid attestation"),
        (status = 401, description = "Bridge token invalid or expired")
    )
)]
pub async fn registration_verify(
    State(state): State<AppState>,
    body: Result<Json<RegistrationVerifyRequest>, JsonRejection>,
) -> Result<Json<RegistrationVerifyResponse>, ApiError> {
    let Json(request) = body.map_err(|err| ApiError::missing(err.to_string()))?;

    let user_id = bridge::verify(&request.token, &state.config.bridge_token_secret)
        .map_err(|err| ApiError::IdentityTokenInvalid(err.to_string()))?;

    let summary = state
        .engine
        .finish_registration(&user_id, &request.credential)
        .await?;

    Ok(Json(RegistrationVerifyResponse {
        ok: true,
        credential_id: summary.credential_id,
    }))
}

/// GET /webauthn/authenticate/options
///
/// Start an anonymous authentication ceremony. No identity required: the
/// authenticator presents whichever discoverable credential the user picks.
#[utoipa::path(
    get,
    path = "/webauthn/authenticate/options",
    tag = "WebAuthn",
    responses(
        (status = 200, description = "Assertion request options plus the session id to echo back")
    )
)]
pub async fn authentication_options(
    State(state): State<AppState>,
) -> Json<AuthenticationOptionsResponse> {
    let (options, session_id) = state.engine.begin_authentication();
    Json(AuthenticationOptionsResponse {
        options,
        session_id: session_id.to_string(),
    })
}

/// POST /webauthn/authenticate/verify
///
/// Verify the assertion and respond with the storefront login redirect.
#[utoipa::path(
    post,
    path = "/webauthn/authenticate/verify",
    tag = "WebAuthn",
    request_body(content_type = "application/json", description = "Session id + assertion response"),
    responses(
        (status = 200, description = "Authenticated", body = AuthenticationVerifyResponse),
        (status = 400, description = "Missing parameters, expired challenge, invalid assertion, or counter regression"),
        (status = 404, description = "Credential not registered")
    )
)]
pub async fn authentication_verify(
    State(state): State<AppState>,
    body: Result<Json<AuthenticationVerifyRequest>, JsonRejection>,
) -> Result<Json<AuthenticationVerifyResponse>, ApiError> {
    let Json(request) = body.map_err(|err| ApiError::missing(err.to_string()))?;

    let session_id = SessionId::from(request.session_id);
    let user_id = state
        .engine
        .finish_authentication(&session_id, &request.credential)
        .await?;

    let customer_id: i64 = user_id
        .as_str()
        .parse()
        .map_err(|_| ApiError::internal("customer id is not numeric"))?;
    let redirect_url = login::login_redirect_url(customer_id, &state.config.storefront)?;

    Ok(Json(AuthenticationVerifyResponse {
        ok: true,
        redirect_url,
    }))
}
