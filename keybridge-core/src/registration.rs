//! Registration Ceremony
//!
//! `Start -> OptionsIssued -> (Verified | Failed | Expired)`

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use sha2::{Digest, Sha256};

use crate::engine::{CeremonyEngine, CEREMONY_TIMEOUT_MS, SUPPORTED_ALGORITHMS};
use crate::error::{CeremonyError, Result};
use crate::ledger::{CeremonyKey, Challenge};
use crate::store::Credential;
use crate::types::{
    AuthenticatorSelection, CredentialDescriptor, CredentialSummary, PubKeyCredParam,
    RegistrationParameters, RegistrationResponse, RpEntity, UserEntity, UserId,
};
use crate::verify::{self, AttestationObject, CosePublicKey, CLIENT_DATA_TYPE_CREATE};

impl CeremonyEngine {
    /// Build credential creation options for `user_id` and issue the
    /// challenge under the user's registration key. Calling again replaces
    /// the outstanding challenge, invalidating the earlier ceremony.
    pub async fn begin_registration(&self, user_id: &UserId) -> Result<RegistrationParameters> {
        // Exclude already-registered credentials so the user cannot
        // double-register the same physical authenticator.
        let existing = self.store.get_by_user(user_id).await?;

        let challenge = Challenge::generate();
        let params = RegistrationParameters {
            rp: RpEntity {
                name: self.rp.name.clone(),
                id: self.rp.id.clone(),
            },
            user: UserEntity {
                id: URL_SAFE_NO_PAD.encode(user_id.as_str().as_bytes()),
                name: format!("customer_{user_id}"),
                display_name: format!("customer_{user_id}"),
            },
            challenge: challenge.to_base64url(),
            pub_key_cred_params: SUPPORTED_ALGORITHMS
                .iter()
                .map(|&alg| PubKeyCredParam {
                    ty: "public-key",
                    alg,
                })
                .collect(),
            timeout: CEREMONY_TIMEOUT_MS,
            exclude_credentials: existing
                .into_iter()
                .map(|cred| CredentialDescriptor {
                    ty: "public-key",
                    id: cred.id,
                    transports: cred.transports,
                })
                .collect(),
            authenticator_selection: AuthenticatorSelection {
                authenticator_attachment: "platform",
                resident_key: "preferred",
                user_verification: "required",
            },
            attestation: "none",
        };

        self.ledger
            .issue(CeremonyKey::Registration(user_id.clone()), challenge);

        tracing::info!(user = %user_id, "registration options issued");
        Ok(params)
    }

    /// Verify the authenticator's attestation response and persist the new
    /// credential. The challenge is consumed before any validation runs, so
    /// a failed attempt can never be retried against the same challenge.
    pub async fn finish_registration(
        &self,
        user_id: &UserId,
        response: &RegistrationResponse,
    ) -> Result<CredentialSummary> {
        let challenge = self
            .ledger
            .consume(&CeremonyKey::Registration(user_id.clone()))
            .ok_or(CeremonyError::ChallengeExpired)?;

        // A challenge mismatch means the client is answering a challenge
        // that is no longer outstanding (e.g. a restarted ceremony replaced
        // it), so report expiry rather than a broken attestation.
        let client_data = verify::verify_client_data(
            &response.response.client_data_json,
            CLIENT_DATA_TYPE_CREATE,
            &challenge,
            &self.rp,
        )
        .map_err(|err| match err {
            verify::ClientDataError::ChallengeMismatch => CeremonyError::ChallengeExpired,
            other => CeremonyError::AttestationInvalid(other.to_string()),
        })?;

        let attestation_bytes = verify::decode_b64url(&response.response.attestation_object)
            .ok_or_else(|| {
                CeremonyError::AttestationInvalid(
                    "attestation object is not valid base64url".to_string(),
                )
            })?;
        let attestation = AttestationObject::parse(&attestation_bytes)
            .map_err(|err| CeremonyError::AttestationInvalid(err.to_string()))?;

        let auth_data = &attestation.auth_data;
        if auth_data.rp_id_hash != self.rp.id_hash() {
            return Err(CeremonyError::AttestationInvalid(
                "relying party id hash mismatch".to_string(),
            ));
        }
        if !auth_data.user_verified() {
            return Err(CeremonyError::AttestationInvalid(
                "user verification was not asserted".to_string(),
            ));
        }

        let attested = auth_data.attested_credential.as_ref().ok_or_else(|| {
            CeremonyError::AttestationInvalid("no attested credential data".to_string())
        })?;

        // Rejects algorithms outside the allow-list.
        let public_key = CosePublicKey::parse(&attested.public_key)
            .map_err(|err| CeremonyError::AttestationInvalid(err.to_string()))?;

        let client_data_hash = Sha256::digest(&client_data);
        attestation
            .verify_statement(client_data_hash.as_slice(), &public_key, self.verifier.as_ref())
            .map_err(|err| CeremonyError::AttestationInvalid(err.to_string()))?;

        let credential_id = URL_SAFE_NO_PAD.encode(&attested.credential_id);
        let transports = response
            .response
            .transports
            .clone()
            .unwrap_or_else(|| vec!["internal".to_string()]);

        self.store
            .save(Credential {
                id: credential_id.clone(),
                user_id: user_id.clone(),
                public_key: attested.public_key.clone(),
                counter: auth_data.counter,
                transports: transports.clone(),
            })
            .await?;

        tracing::info!(user = %user_id, credential = %credential_id, "credential registered");
        Ok(CredentialSummary {
            credential_id,
            transports,
        })
    }
}
