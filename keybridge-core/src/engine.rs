//! Ceremony engine
//!
//! Ties the challenge ledger, credential store, relying-party identity, and
//! signature verifier together. The registration and authentication state
//! machines themselves live in `registration` and `authentication`.

use std::sync::Arc;
use std::time::Duration;

use crate::ledger::{ChallengeLedger, DEFAULT_CHALLENGE_TTL};
use crate::rp::RelyingParty;
use crate::store::CredentialStore;
use crate::verify::{PlatformVerifier, SignatureVerifier, ALG_ES256, ALG_RS256};

/// COSE algorithm allow-list advertised in registration options, in
/// preference order.
pub const SUPPORTED_ALGORITHMS: [i64; 2] = [ALG_ES256, ALG_RS256];

/// Ceremony completion window advertised to the client, in milliseconds.
pub(crate) const CEREMONY_TIMEOUT_MS: u32 = 60_000;

/// Shared, process-wide ceremony engine. Handlers clone an `Arc` of this;
/// all cross-request state lives in the ledger and the store.
pub struct CeremonyEngine {
    pub(crate) rp: RelyingParty,
    pub(crate) ledger: ChallengeLedger,
    pub(crate) store: CredentialStore,
    pub(crate) verifier: Arc<dyn SignatureVerifier>,
    /// Skip the counter-regression check for authenticators that always
    /// report zero. Configuration, never inferred from observed values.
    pub(crate) accept_counterless: bool,
}

impl CeremonyEngine {
    pub fn builder(rp: RelyingParty, store: CredentialStore) -> CeremonyEngineBuilder {
        CeremonyEngineBuilder {
            rp,
            store,
            challenge_ttl: DEFAULT_CHALLENGE_TTL,
            verifier: Arc::new(PlatformVerifier),
            accept_counterless: true,
        }
    }

    pub fn relying_party(&self) -> &RelyingParty {
        &self.rp
    }

    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    /// Purge expired challenges; returns how many were dropped. Driven by a
    /// periodic task owned by the service lifecycle.
    pub fn sweep_expired_challenges(&self) -> usize {
        self.ledger.sweep()
    }
}

impl std::fmt::Debug for CeremonyEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CeremonyEngine")
            .field("rp", &self.rp.id)
            .field("ledger", &self.ledger)
            .field("store", &self.store)
            .field("accept_counterless", &self.accept_counterless)
            .finish()
    }
}

pub struct CeremonyEngineBuilder {
    rp: RelyingParty,
    store: CredentialStore,
    challenge_ttl: Duration,
    verifier: Arc<dyn SignatureVerifier>,
    accept_counterless: bool,
}

impl CeremonyEngineBuilder {
    /// Override the challenge validity window (default 5 minutes).
    pub fn challenge_ttl(mut self, ttl: Duration) -> Self {
        self.challenge_ttl = ttl;
        self
    }

    /// Swap the signature verifier, e.g. for deterministic test keys.
    pub fn signature_verifier(mut self, verifier: Arc<dyn SignatureVerifier>) -> Self {
        self.verifier = verifier;
        self
    }

    /// Whether zero-counter authenticators bypass the regression check.
    pub fn accept_counterless(mut self, accept: bool) -> Self {
        self.accept_counterless = accept;
        self
    }

    pub fn build(self) -> CeremonyEngine {
        CeremonyEngine {
            rp: self.rp,
            ledger: ChallengeLedger::new(self.challenge_ttl),
            store: self.store,
            verifier: self.verifier,
            accept_counterless: self.accept_counterless,
        }
    }
}
