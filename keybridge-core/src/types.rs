//! Ceremony identifiers and wire types
//!
//! The wire types mirror the WebAuthn JSON shapes exchanged with
//! `navigator.credentials.create` / `.get`, so option payloads serialize
//! straight into what the browser expects and responses deserialize straight
//! out of what it sends back.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque account identifier supplied by an external identity collaborator.
/// The engine never interprets its structure.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for UserId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Unguessable identifier tying an anonymous authentication ceremony's
/// begin and finish steps together.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub(crate) fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for SessionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for SessionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

// ==================== Option payloads (server -> browser) ====================

/// Credential creation options, handed to `navigator.credentials.create`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationParameters {
    pub rp: RpEntity,
    pub user: UserEntity,
    /// base64url challenge bytes
    pub challenge: String,
    pub pub_key_cred_params: Vec<PubKeyCredParam>,
    /// Milliseconds the client gets to complete the ceremony.
    pub timeout: u32,
    /// Already-registered credentials the authenticator must refuse to
    /// re-create, so a user cannot double-register the same key.
    pub exclude_credentials: Vec<CredentialDescriptor>,
    pub authenticator_selection: AuthenticatorSelection,
    pub attestation: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct RpEntity {
    pub name: String,
    pub id: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserEntity {
    /// base64url of the opaque account id
    pub id: String,
    pub name: String,
    pub display_name: String,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct PubKeyCredParam {
    #[serde(rename = "type")]
    pub ty: &'static str,
    pub alg: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialDescriptor {
    #[serde(rename = "type")]
    pub ty: &'static str,
    /// base64url credential id
    pub id: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub transports: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatorSelection {
    pub authenticator_attachment: &'static str,
    pub resident_key: &'static str,
    pub user_verification: &'static str,
}

/// Assertion request options, handed to `navigator.credentials.get`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationParameters {
    /// base64url challenge bytes
    pub challenge: String,
    pub timeout: u32,
    pub rp_id: String,
    /// Always empty: discoverable credentials let the authenticator present
    /// whichever credential the user selects.
    pub allow_credentials: Vec<CredentialDescriptor>,
    pub user_verification: &'static str,
}

// ==================== Ceremony responses (browser -> server) ====================

/// The authenticator's attestation response from `navigator.credentials.create`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationResponse {
    /// base64url credential id
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_id: Option<String>,
    pub response: AttestationPayload,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub ty: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttestationPayload {
    /// base64url collectedClientData JSON
    pub client_data_json: String,
    /// base64url CBOR attestation object
    pub attestation_object: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transports: Option<Vec<String>>,
}

/// The authenticator's assertion response from `navigator.credentials.get`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssertionResponse {
    /// base64url credential id
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_id: Option<String>,
    pub response: AssertionPayload,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub ty: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssertionPayload {
    /// base64url collectedClientData JSON
    #[serde(rename = "clientDataJSON")]
    pub client_data_json: String,
    /// base64url raw authenticator data
    pub authenticator_data: String,
    /// base64url DER signature
    pub signature: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_handle: Option<String>,
}

/// What a successful registration hands back to the caller.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialSummary {
    pub credential_id: String,
    pub transports: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_parameters_serialize_to_webauthn_json() {
        let params = RegistrationParameters {
            rp: RpEntity {
                name: "Shop".into(),
                id: "shop.example".into(),
            },
            user: UserEntity {
                id: "MTIzNDU".into(),
                name: "customer_12345".into(),
                display_name: "customer_12345".into(),
            },
            challenge: "AAAA".into(),
            pub_key_cred_params: vec![PubKeyCredParam {
                ty: "public-key",
                alg: -7,
            }],
            timeout: 60_000,
            exclude_credentials: vec![CredentialDescriptor {
                ty: "public-key",
                id: "Y3JlZA".into(),
                transports: vec!["internal".into()],
            }],
            authenticator_selection: AuthenticatorSelection {
                authenticator_attachment: "platform",
                resident_key: "preferred",
                user_verification: "required",
            },
            attestation: "none",
        };

        let json = serde_json::to_value(&params).unwrap();
        assert_eq!(json["pubKeyCredParams"][0]["type"], "public-key");
        assert_eq!(json["pubKeyCredParams"][0]["alg"], -7);
        assert_eq!(json["excludeCredentials"][0]["id"], "Y3JlZA");
        assert_eq!(
            json["authenticatorSelection"]["authenticatorAttachment"],
            "platform"
        );
        assert_eq!(json["user"]["displayName"], "customer_12345");
    }

    #[test]
    fn assertion_response_deserializes_from_browser_shape() {
        let body = serde_json::json!({
            "id": "Y3JlZA",
            "rawId": "Y3JlZA",
            "type": "public-key",
            "response": {
                "clientDataJSON": "e30",
                "authenticatorData": "AAAA",
                "signature": "BBBB",
                "userHandle": null,
            },
        });

        let parsed: AssertionResponse = serde_json::from_value(body).unwrap();
        assert_eq!(parsed.id, "Y3JlZA");
        assert_eq!(parsed.response.signature, "BBBB");
    }
}
