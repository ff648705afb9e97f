use thiserror::Error;

use crate::store::StoreError;

/// Everything a ceremony step can reject a client for.
///
/// All variants except [`CeremonyError::Store`] are recoverable from the
/// caller's perspective: the client restarts the ceremony or falls back to
/// its original login method. A store failure means the request must fail
/// outright rather than proceed as if verification succeeded.
#[derive(Debug, Error)]
pub enum CeremonyError {
    /// No outstanding challenge for this ceremony key. Covers both "never
    /// issued" and "past its TTL"; the ledger does not distinguish them.
    #[error("no outstanding challenge for this ceremony, or it has expired")]
    ChallengeExpired,

    /// The assertion referenced a credential id that was never registered.
    #[error("credential is not registered")]
    UnknownCredential,

    /// A registration response failed challenge, origin, relying-party,
    /// user-verification, or signature validation.
    #[error("attestation rejected: {0}")]
    AttestationInvalid(String),

    /// An authentication response failed challenge, origin, relying-party,
    /// user-verification, or signature validation.
    #[error("assertion rejected: {0}")]
    AssertionInvalid(String),

    /// The authenticator reported a counter that did not strictly increase.
    #[error("authenticator counter did not advance: stored {stored}, reported {reported}")]
    PossibleClonedCredential { stored: u32, reported: u32 },

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, CeremonyError>;
