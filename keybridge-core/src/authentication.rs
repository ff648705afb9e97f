//! Authentication Ceremony
//!
//! `Start -> OptionsIssued -> (Verified | Failed | Expired | UnknownCredential)`
//!
//! Authentication is credential-first, identity-last: the options carry no
//! allow-list, the authenticator presents whichever discoverable credential
//! the user picks, and the owning user id falls out of the verified record.

use sha2::{Digest, Sha256};

use crate::engine::{CeremonyEngine, CEREMONY_TIMEOUT_MS};
use crate::error::{CeremonyError, Result};
use crate::ledger::{CeremonyKey, Challenge};
use crate::types::{AssertionResponse, AuthenticationParameters, SessionId, UserId};
use crate::verify::{self, AuthenticatorData, CosePublicKey, CLIENT_DATA_TYPE_GET};

impl CeremonyEngine {
    /// Issue an anonymous authentication challenge bound to a fresh,
    /// unguessable session id. The caller must echo the session id back.
    pub fn begin_authentication(&self) -> (AuthenticationParameters, SessionId) {
        let challenge = Challenge::generate();
        let session_id = SessionId::generate();

        let params = AuthenticationParameters {
            challenge: challenge.to_base64url(),
            timeout: CEREMONY_TIMEOUT_MS,
            rp_id: self.rp.id.clone(),
            allow_credentials: Vec::new(),
            user_verification: "required",
        };

        self.ledger
            .issue(CeremonyKey::Session(session_id.clone()), challenge);

        tracing::debug!(session = %session_id, "authentication options issued");
        (params, session_id)
    }

    /// Verify the assertion against the stored credential and return the
    /// owning user id. Minting a login session from that id is the caller's
    /// collaborator, not this engine.
    pub async fn finish_authentication(
        &self,
        session_id: &SessionId,
        response: &AssertionResponse,
    ) -> Result<UserId> {
        // Consume first: single-use applies regardless of outcome.
        let challenge = self
            .ledger
            .consume(&CeremonyKey::Session(session_id.clone()))
            .ok_or(CeremonyError::ChallengeExpired)?;

        let credential = self
            .store
            .get_by_id(&response.id)
            .await?
            .ok_or(CeremonyError::UnknownCredential)?;

        // Answering a challenge that is no longer the outstanding one for
        // this session reports as expiry, matching the ledger-miss case.
        let client_data = verify::verify_client_data(
            &response.response.client_data_json,
            CLIENT_DATA_TYPE_GET,
            &challenge,
            &self.rp,
        )
        .map_err(|err| match err {
            verify::ClientDataError::ChallengeMismatch => CeremonyError::ChallengeExpired,
            other => CeremonyError::AssertionInvalid(other.to_string()),
        })?;

        let auth_data_bytes = verify::decode_b64url(&response.response.authenticator_data)
            .ok_or_else(|| {
                CeremonyError::AssertionInvalid(
                    "authenticator data is not valid base64url".to_string(),
                )
            })?;
        let auth_data = AuthenticatorData::parse(&auth_data_bytes)
            .map_err(|err| CeremonyError::AssertionInvalid(err.to_string()))?;

        if auth_data.rp_id_hash != self.rp.id_hash() {
            return Err(CeremonyError::AssertionInvalid(
                "relying party id hash mismatch".to_string(),
            ));
        }
        if !auth_data.user_verified() {
            return Err(CeremonyError::AssertionInvalid(
                "user verification was not asserted".to_string(),
            ));
        }

        let signature = verify::decode_b64url(&response.response.signature).ok_or_else(|| {
            CeremonyError::AssertionInvalid("signature is not valid base64url".to_string())
        })?;
        let public_key = CosePublicKey::parse(&credential.public_key)
            .map_err(|err| CeremonyError::AssertionInvalid(err.to_string()))?;

        let mut message = auth_data_bytes.clone();
        message.extend_from_slice(&Sha256::digest(&client_data));
        self.verifier
            .verify(&public_key, &message, &signature)
            .map_err(|err| CeremonyError::AssertionInvalid(err.to_string()))?;

        // Anti-replay counter rule. Authenticators that never implement a
        // counter report zero forever; accepting them is a configuration
        // decision, not something inferred from observed values.
        let stored = credential.counter;
        let reported = auth_data.counter;
        if reported == 0 && stored == 0 && self.accept_counterless {
            // counterless authenticator, check skipped
        } else if reported > stored {
            self.store.update_counter(&credential.id, reported).await?;
        } else {
            tracing::warn!(
                credential = %credential.id,
                stored,
                reported,
                "counter did not advance - possible cloned authenticator"
            );
            return Err(CeremonyError::PossibleClonedCredential { stored, reported });
        }

        tracing::info!(user = %credential.user_id, credential = %credential.id, "authentication verified");
        Ok(credential.user_id)
    }
}
