//! Deterministic software authenticator
//!
//! Produces well-formed attestation and assertion responses without platform
//! hardware, so the ceremony state machines can be exercised end to end with
//! real ES256 signatures. The same seed always yields the same key pair and
//! credential id.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use ciborium::Value;
use p256::ecdsa::{signature::Signer, Signature, SigningKey};
use sha2::{Digest, Sha256};

use crate::types::{
    AssertionPayload, AssertionResponse, AttestationPayload, RegistrationResponse,
};

const FLAG_UP: u8 = 1 << 0;
const FLAG_UV: u8 = 1 << 2;
const FLAG_AT: u8 = 1 << 6;

pub struct SoftwareAuthenticator {
    signing_key: SigningKey,
    credential_id: Vec<u8>,
    counter: u32,
    /// When false, assertions omit the user-verification flag.
    pub user_verification: bool,
    /// When true, the counter stays at zero forever, like authenticators
    /// that do not implement one.
    pub counterless: bool,
}

impl SoftwareAuthenticator {
    pub fn new(seed: u8) -> Self {
        let mut scalar = [0u8; 32];
        scalar[0] = 0x0a;
        scalar[31] = seed.max(1);
        let signing_key =
            SigningKey::from_bytes(&scalar.into()).expect("fixed scalar is a valid P-256 key");
        let credential_id = Sha256::digest([seed]).to_vec();

        Self {
            signing_key,
            credential_id,
            counter: 0,
            user_verification: true,
            counterless: false,
        }
    }

    /// base64url credential id, as the browser would report it.
    pub fn credential_id(&self) -> String {
        URL_SAFE_NO_PAD.encode(&self.credential_id)
    }

    pub fn counter(&self) -> u32 {
        self.counter
    }

    pub fn set_counter(&mut self, counter: u32) {
        self.counter = counter;
    }

    fn cose_public_key(&self) -> Vec<u8> {
        let point = self.signing_key.verifying_key().to_encoded_point(false);
        let map = Value::Map(vec![
            (Value::Integer(1.into()), Value::Integer(2.into())), // kty: EC2
            (Value::Integer(3.into()), Value::Integer((-7).into())), // alg: ES256
            (Value::Integer((-1).into()), Value::Integer(1.into())), // crv: P-256
            (
                Value::Integer((-2).into()),
                Value::Bytes(point.x().expect("uncompressed point").to_vec()),
            ),
            (
                Value::Integer((-3).into()),
                Value::Bytes(point.y().expect("uncompressed point").to_vec()),
            ),
        ]);
        let mut out = Vec::new();
        ciborium::ser::into_writer(&map, &mut out).expect("COSE map serializes");
        out
    }

    fn flags(&self, attested: bool) -> u8 {
        let mut flags = FLAG_UP;
        if self.user_verification {
            flags |= FLAG_UV;
        }
        if attested {
            flags |= FLAG_AT;
        }
        flags
    }

    fn auth_data(&self, rp_id: &str, attested: bool, counter: u32) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&Sha256::digest(rp_id.as_bytes()));
        data.push(self.flags(attested));
        data.extend_from_slice(&counter.to_be_bytes());
        if attested {
            data.extend_from_slice(&[0u8; 16]); // zero AAGUID
            data.extend_from_slice(&(self.credential_id.len() as u16).to_be_bytes());
            data.extend_from_slice(&self.credential_id);
            data.extend_from_slice(&self.cose_public_key());
        }
        data
    }

    fn client_data(ty: &str, challenge_b64: &str, origin: &str) -> Vec<u8> {
        serde_json::to_vec(&serde_json::json!({
            "type": ty,
            "challenge": challenge_b64,
            "origin": origin,
        }))
        .expect("client data serializes")
    }

    /// Produce a `fmt: none` attestation response for the given options.
    pub fn create_credential(
        &self,
        challenge_b64: &str,
        origin: &str,
        rp_id: &str,
    ) -> RegistrationResponse {
        let client_data = Self::client_data("webauthn.create", challenge_b64, origin);
        let auth_data = self.auth_data(rp_id, true, self.counter);

        let attestation_object = Value::Map(vec![
            (Value::Text("fmt".into()), Value::Text("none".into())),
            (Value::Text("attStmt".into()), Value::Map(Vec::new())),
            (Value::Text("authData".into()), Value::Bytes(auth_data)),
        ]);
        let mut attestation_bytes = Vec::new();
        ciborium::ser::into_writer(&attestation_object, &mut attestation_bytes)
            .expect("attestation object serializes");

        RegistrationResponse {
            id: self.credential_id(),
            raw_id: Some(self.credential_id()),
            ty: Some("public-key".into()),
            response: AttestationPayload {
                client_data_json: URL_SAFE_NO_PAD.encode(&client_data),
                attestation_object: URL_SAFE_NO_PAD.encode(&attestation_bytes),
                transports: Some(vec!["internal".into()]),
            },
        }
    }

    /// Sign an assertion over the given challenge, advancing the counter
    /// first like a hardware authenticator with counter support.
    pub fn sign_assertion(
        &mut self,
        challenge_b64: &str,
        origin: &str,
        rp_id: &str,
    ) -> AssertionResponse {
        if !self.counterless {
            self.counter += 1;
        }
        self.assertion_with_counter(challenge_b64, origin, rp_id, self.counter)
    }

    /// Sign an assertion reporting an explicit counter value, for replay and
    /// regression scenarios.
    pub fn assertion_with_counter(
        &self,
        challenge_b64: &str,
        origin: &str,
        rp_id: &str,
        counter: u32,
    ) -> AssertionResponse {
        let client_data = Self::client_data("webauthn.get", challenge_b64, origin);
        let auth_data = self.auth_data(rp_id, false, counter);

        let mut message = auth_data.clone();
        message.extend_from_slice(&Sha256::digest(&client_data));
        let signature: Signature = self.signing_key.sign(&message);

        AssertionResponse {
            id: self.credential_id(),
            raw_id: Some(self.credential_id()),
            ty: Some("public-key".into()),
            response: AssertionPayload {
                client_data_json: URL_SAFE_NO_PAD.encode(&client_data),
                authenticator_data: URL_SAFE_NO_PAD.encode(&auth_data),
                signature: URL_SAFE_NO_PAD.encode(signature.to_der().as_bytes()),
                user_handle: None,
            },
        }
    }
}
