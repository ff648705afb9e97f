//! End-to-end ceremony tests driven by the deterministic software
//! authenticator, with real ES256 signatures throughout.

use std::collections::HashSet;
use std::time::Duration;

use keybridge_core::testkit::SoftwareAuthenticator;
use keybridge_core::{
    CeremonyEngine, CeremonyError, CredentialStore, RelyingParty, SessionId, UserId,
};

const ORIGIN: &str = "https://shop.example";
const RP_ID: &str = "shop.example";

fn relying_party() -> RelyingParty {
    RelyingParty::new("Example Shop", RP_ID, ORIGIN).unwrap()
}

fn engine() -> CeremonyEngine {
    CeremonyEngine::builder(relying_party(), CredentialStore::memory()).build()
}

async fn register(engine: &CeremonyEngine, authenticator: &SoftwareAuthenticator, user: &UserId) {
    let params = engine.begin_registration(user).await.unwrap();
    let response = authenticator.create_credential(&params.challenge, ORIGIN, RP_ID);
    engine.finish_registration(user, &response).await.unwrap();
}

async fn authenticate(
    engine: &CeremonyEngine,
    authenticator: &mut SoftwareAuthenticator,
) -> keybridge_core::Result<UserId> {
    let (params, session_id) = engine.begin_authentication();
    let assertion = authenticator.sign_assertion(&params.challenge, ORIGIN, RP_ID);
    engine.finish_authentication(&session_id, &assertion).await
}

#[tokio::test]
async fn registration_round_trip_succeeds_exactly_once() {
    let engine = engine();
    let user = UserId::from("1001");
    let authenticator = SoftwareAuthenticator::new(1);

    let params = engine.begin_registration(&user).await.unwrap();
    assert_eq!(params.rp.id, RP_ID);
    assert_eq!(params.attestation, "none");
    assert!(params.exclude_credentials.is_empty());

    let response = authenticator.create_credential(&params.challenge, ORIGIN, RP_ID);
    let summary = engine.finish_registration(&user, &response).await.unwrap();
    assert_eq!(summary.credential_id, authenticator.credential_id());

    // The challenge was consumed by the first finish; replaying fails.
    let err = engine
        .finish_registration(&user, &response)
        .await
        .unwrap_err();
    assert!(matches!(err, CeremonyError::ChallengeExpired));
}

#[tokio::test]
async fn second_begin_registration_invalidates_first_challenge() {
    let engine = engine();
    let user = UserId::from("1001");
    let authenticator = SoftwareAuthenticator::new(1);

    let first = engine.begin_registration(&user).await.unwrap();
    let _second = engine.begin_registration(&user).await.unwrap();

    // Respond to the *first* challenge: the ledger now holds the second one,
    // so the first is no longer outstanding.
    let response = authenticator.create_credential(&first.challenge, ORIGIN, RP_ID);
    let err = engine
        .finish_registration(&user, &response)
        .await
        .unwrap_err();
    assert!(matches!(err, CeremonyError::ChallengeExpired));

    // And the consumed second challenge is gone too.
    let err = engine
        .finish_registration(&user, &response)
        .await
        .unwrap_err();
    assert!(matches!(err, CeremonyError::ChallengeExpired));
}

#[tokio::test]
async fn expired_challenge_fails_before_any_signature_check() {
    let engine = CeremonyEngine::builder(relying_party(), CredentialStore::memory())
        .challenge_ttl(Duration::from_millis(1))
        .build();
    let user = UserId::from("1001");
    let authenticator = SoftwareAuthenticator::new(1);

    let params = engine.begin_registration(&user).await.unwrap();
    let response = authenticator.create_credential(&params.challenge, ORIGIN, RP_ID);

    std::thread::sleep(Duration::from_millis(10));

    // Correctly constructed response, but past the TTL.
    let err = engine
        .finish_registration(&user, &response)
        .await
        .unwrap_err();
    assert!(matches!(err, CeremonyError::ChallengeExpired));
}

#[tokio::test]
async fn exclude_list_carries_registered_credentials() {
    let engine = engine();
    let user = UserId::from("1001");
    let authenticator = SoftwareAuthenticator::new(1);
    register(&engine, &authenticator, &user).await;

    let params = engine.begin_registration(&user).await.unwrap();
    assert_eq!(params.exclude_credentials.len(), 1);
    assert_eq!(params.exclude_credentials[0].id, authenticator.credential_id());
}

#[tokio::test]
async fn authentication_round_trip_returns_owning_user() {
    let engine = engine();
    let user = UserId::from("1001");
    let mut authenticator = SoftwareAuthenticator::new(1);
    register(&engine, &authenticator, &user).await;

    let resolved = authenticate(&engine, &mut authenticator).await.unwrap();
    assert_eq!(resolved, user);
}

#[tokio::test]
async fn counter_must_strictly_increase() {
    let engine = engine();
    let user = UserId::from("1001");
    let mut authenticator = SoftwareAuthenticator::new(1);
    register(&engine, &authenticator, &user).await;

    // Walk the counter up to 6.
    authenticator.set_counter(5);
    authenticate(&engine, &mut authenticator).await.unwrap();
    assert_eq!(authenticator.counter(), 6);

    // Replay counter 6: strictly-greater fails, stored counter stays put.
    let (params, session_id) = engine.begin_authentication();
    let stale = authenticator.assertion_with_counter(&params.challenge, ORIGIN, RP_ID, 6);
    let err = engine
        .finish_authentication(&session_id, &stale)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CeremonyError::PossibleClonedCredential {
            stored: 6,
            reported: 6
        }
    ));

    let stored = engine
        .store()
        .get_by_id(&authenticator.credential_id())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.counter, 6);

    // A regressed counter fails the same way.
    let (params, session_id) = engine.begin_authentication();
    let regressed = authenticator.assertion_with_counter(&params.challenge, ORIGIN, RP_ID, 3);
    let err = engine
        .finish_authentication(&session_id, &regressed)
        .await
        .unwrap_err();
    assert!(matches!(err, CeremonyError::PossibleClonedCredential { .. }));
}

#[tokio::test]
async fn counterless_authenticator_is_accepted_by_configuration() {
    let engine = engine();
    let user = UserId::from("1001");
    let mut authenticator = SoftwareAuthenticator::new(1);
    authenticator.counterless = true;
    register(&engine, &authenticator, &user).await;

    // Counter is zero on every use; the check is skipped by configuration.
    authenticate(&engine, &mut authenticator).await.unwrap();
    authenticate(&engine, &mut authenticator).await.unwrap();

    let stored = engine
        .store()
        .get_by_id(&authenticator.credential_id())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.counter, 0);
}

#[tokio::test]
async fn counterless_authenticator_rejected_when_not_configured() {
    let engine = CeremonyEngine::builder(relying_party(), CredentialStore::memory())
        .accept_counterless(false)
        .build();
    let user = UserId::from("1001");
    let mut authenticator = SoftwareAuthenticator::new(1);
    authenticator.counterless = true;
    register(&engine, &authenticator, &user).await;

    let err = authenticate(&engine, &mut authenticator).await.unwrap_err();
    assert!(matches!(
        err,
        CeremonyError::PossibleClonedCredential {
            stored: 0,
            reported: 0
        }
    ));
}

#[tokio::test]
async fn unknown_credential_still_consumes_the_challenge() {
    let engine = engine();
    let mut unregistered = SoftwareAuthenticator::new(9);

    let (params, session_id) = engine.begin_authentication();
    let assertion = unregistered.sign_assertion(&params.challenge, ORIGIN, RP_ID);

    let err = engine
        .finish_authentication(&session_id, &assertion)
        .await
        .unwrap_err();
    assert!(matches!(err, CeremonyError::UnknownCredential));

    // Single-use applies regardless of outcome.
    let err = engine
        .finish_authentication(&session_id, &assertion)
        .await
        .unwrap_err();
    assert!(matches!(err, CeremonyError::ChallengeExpired));
}

#[tokio::test]
async fn wrong_origin_fails_even_with_a_valid_signature() {
    let engine = engine();
    let user = UserId::from("1001");
    let mut authenticator = SoftwareAuthenticator::new(1);
    register(&engine, &authenticator, &user).await;

    let (params, session_id) = engine.begin_authentication();
    // Signature is genuinely valid over this (wrong) origin.
    let assertion =
        authenticator.sign_assertion(&params.challenge, "https://evil.example", RP_ID);

    let err = engine
        .finish_authentication(&session_id, &assertion)
        .await
        .unwrap_err();
    assert!(matches!(err, CeremonyError::AssertionInvalid(_)));
}

#[tokio::test]
async fn missing_user_verification_is_rejected() {
    let engine = engine();
    let user = UserId::from("1001");
    let mut authenticator = SoftwareAuthenticator::new(1);
    register(&engine, &authenticator, &user).await;

    authenticator.user_verification = false;
    let err = authenticate(&engine, &mut authenticator).await.unwrap_err();
    assert!(matches!(err, CeremonyError::AssertionInvalid(_)));
}

#[tokio::test]
async fn concurrent_sessions_are_distinct_and_independent() {
    let engine = engine();
    let user = UserId::from("1001");
    let mut authenticator = SoftwareAuthenticator::new(1);
    register(&engine, &authenticator, &user).await;

    let mut sessions: Vec<(String, SessionId)> = Vec::new();
    for _ in 0..32 {
        let (params, session_id) = engine.begin_authentication();
        sessions.push((params.challenge, session_id));
    }

    let distinct: HashSet<&str> = sessions.iter().map(|(_, id)| id.as_str()).collect();
    assert_eq!(distinct.len(), sessions.len());

    // Finishing one ceremony leaves the others valid.
    let (challenge, session_id) = sessions.pop().unwrap();
    let assertion = authenticator.sign_assertion(&challenge, ORIGIN, RP_ID);
    engine
        .finish_authentication(&session_id, &assertion)
        .await
        .unwrap();

    let (challenge, session_id) = sessions.swap_remove(0);
    let assertion = authenticator.sign_assertion(&challenge, ORIGIN, RP_ID);
    engine
        .finish_authentication(&session_id, &assertion)
        .await
        .unwrap();
}

#[tokio::test]
async fn sweep_reports_purged_challenges() {
    let engine = CeremonyEngine::builder(relying_party(), CredentialStore::memory())
        .challenge_ttl(Duration::from_millis(1))
        .build();

    let _ = engine.begin_authentication();
    let _ = engine.begin_authentication();
    std::thread::sleep(Duration::from_millis(10));

    assert_eq!(engine.sweep_expired_challenges(), 2);
    assert_eq!(engine.sweep_expired_challenges(), 0);
}
