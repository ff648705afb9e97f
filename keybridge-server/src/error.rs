//! API error handling module
//!
//! Unified error type for all endpoints. Every ceremony failure maps to a
//! distinct machine-readable code so the storefront can tell the user what
//! to do next (retry the ceremony, sign in another way, contact support).

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use keybridge_core::CeremonyError;
use thiserror::Error;

/// API error type with structured variants for different error categories
#[derive(Debug, Error)]
pub enum ApiError {
    /// Request body missing or not deserializable into the expected shape
    #[error("missing or malformed parameters: {0}")]
    MissingParameters(String),

    /// Bridge token rejected by the identity collaborator
    #[error("identity token invalid: {0}")]
    IdentityTokenInvalid(String),

    /// Ceremony engine rejected the request
    #[error(transparent)]
    Ceremony(#[from] CeremonyError),

    /// Unexpected server-side failure
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn missing(message: impl Into<String>) -> Self {
        Self::MissingParameters(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingParameters(_) => StatusCode::BAD_REQUEST,
            Self::IdentityTokenInvalid(_) => StatusCode::UNAUTHORIZED,
            Self::Ceremony(err) => match err {
                CeremonyError::ChallengeExpired
                | CeremonyError::AttestationInvalid(_)
                | CeremonyError::AssertionInvalid(_)
                | CeremonyError::PossibleClonedCredential { .. } => StatusCode::BAD_REQUEST,
                CeremonyError::UnknownCredential => StatusCode::NOT_FOUND,
                CeremonyError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable error code for programmatic handling
    fn error_code(&self) -> &'static str {
        match self {
            Self::MissingParameters(_) => "MISSING_PARAMETERS",
            Self::IdentityTokenInvalid(_) => "IDENTITY_TOKEN_INVALID",
            Self::Ceremony(err) => match err {
                CeremonyError::ChallengeExpired => "CHALLENGE_EXPIRED",
                CeremonyError::UnknownCredential => "UNKNOWN_CREDENTIAL",
                CeremonyError::AttestationInvalid(_) => "ATTESTATION_INVALID",
                CeremonyError::AssertionInvalid(_) => "ASSERTION_INVALID",
                CeremonyError::PossibleClonedCredential { .. } => "POSSIBLE_CLONED_CREDENTIAL",
                CeremonyError::Store(_) => "STORE_ERROR",
            },
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// User-facing message, sanitized of internal detail where needed
    fn client_message(&self) -> String {
        match self {
            Self::Ceremony(CeremonyError::ChallengeExpired) => {
                "Challenge expired - please try again.".to_string()
            }
            Self::Ceremony(CeremonyError::UnknownCredential) => {
                "Biometric login is not set up for this account. Please sign in with your original login method first.".to_string()
            }
            Self::Ceremony(CeremonyError::PossibleClonedCredential { .. }) => {
                "This authenticator could not be trusted. Please contact support.".to_string()
            }
            Self::Ceremony(CeremonyError::Store(_)) => {
                "Credential storage is temporarily unavailable.".to_string()
            }
            Self::IdentityTokenInvalid(_) => {
                "Session expired - please log in again.".to_string()
            }
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();
        let internal_message = self.to_string();
        let client_message = self.client_message();

        match &self {
            Self::MissingParameters(_) | Self::IdentityTokenInvalid(_) => {
                tracing::warn!(status = %status, code = code, error = %internal_message, "client error");
            }
            Self::Ceremony(CeremonyError::Store(_)) | Self::Internal(_) => {
                tracing::error!(status = %status, code = code, error = %internal_message, "server error");
            }
            Self::Ceremony(_) => {
                tracing::warn!(status = %status, code = code, error = %internal_message, "ceremony rejected");
            }
        }

        let body = serde_json::json!({
            "error": client_message,
            "code": code,
        });

        (status, Json(body)).into_response()
    }
}
