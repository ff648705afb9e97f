//! Challenge Ledger
//!
//! Single source of truth for "is this challenge still valid, and for whom".
//! Challenges are temporary (5 minute TTL) and live in memory; a periodic
//! sweep, owned by the service lifecycle, purges whatever was never consumed.

use std::time::{Duration, Instant};

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use dashmap::DashMap;
use rand::RngCore;

use crate::types::{SessionId, UserId};

/// Challenge entropy in bytes.
pub const CHALLENGE_LEN: usize = 32;

/// Maximum age of an unconsumed challenge.
pub const DEFAULT_CHALLENGE_TTL: Duration = Duration::from_secs(300);

/// Random challenge bytes issued for one ceremony.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Challenge([u8; CHALLENGE_LEN]);

impl Challenge {
    /// Fresh challenge from the OS RNG.
    pub fn generate() -> Self {
        let mut bytes = [0u8; CHALLENGE_LEN];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn to_base64url(&self) -> String {
        URL_SAFE_NO_PAD.encode(self.0)
    }

    /// Compare against the base64url challenge echoed in client data.
    pub fn matches_base64url(&self, encoded: &str) -> bool {
        self.to_base64url() == encoded
    }
}

/// Ceremony-scoped ledger key. A user has at most one outstanding
/// registration challenge; anonymous authentications get a fresh session key
/// each, so concurrent ceremonies never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CeremonyKey {
    Registration(UserId),
    Session(SessionId),
}

struct IssuedChallenge {
    challenge: Challenge,
    issued_at: Instant,
}

/// In-memory challenge ledger with atomic consume-once semantics.
pub struct ChallengeLedger {
    entries: DashMap<CeremonyKey, IssuedChallenge>,
    ttl: Duration,
}

impl ChallengeLedger {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    /// Store the challenge for `key`, stamping it with the current time.
    /// Overwriting an existing key silently invalidates the previous
    /// outstanding challenge; restarting a ceremony must do exactly that.
    pub fn issue(&self, key: CeremonyKey, challenge: Challenge) {
        self.entries.insert(
            key,
            IssuedChallenge {
                challenge,
                issued_at: Instant::now(),
            },
        );
    }

    /// Atomically remove and return the challenge for `key`. Absent, already
    /// consumed, swept, or expired records all come back as `None`; callers
    /// treat that as a normal `ChallengeExpired` outcome, not a crash.
    pub fn consume(&self, key: &CeremonyKey) -> Option<Challenge> {
        let (_, entry) = self.entries.remove(key)?;
        if entry.issued_at.elapsed() < self.ttl {
            Some(entry.challenge)
        } else {
            None
        }
    }

    /// Drop every record past the TTL. Returns how many were removed.
    /// Removal goes through the same shard locks as `consume`, so a record
    /// can never be handed out twice.
    pub fn sweep(&self) -> usize {
        let before = self.entries.len();
        let ttl = self.ttl;
        self.entries.retain(|_, entry| entry.issued_at.elapsed() < ttl);
        before.saturating_sub(self.entries.len())
    }

    pub fn outstanding(&self) -> usize {
        self.entries.len()
    }
}

impl std::fmt::Debug for ChallengeLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChallengeLedger")
            .field("outstanding", &self.entries.len())
            .field("ttl", &self.ttl)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reg_key(user: &str) -> CeremonyKey {
        CeremonyKey::Registration(UserId::from(user))
    }

    #[test]
    fn consume_is_single_use() {
        let ledger = ChallengeLedger::new(DEFAULT_CHALLENGE_TTL);
        let challenge = Challenge::generate();
        ledger.issue(reg_key("1001"), challenge.clone());

        assert_eq!(ledger.consume(&reg_key("1001")), Some(challenge));
        assert_eq!(ledger.consume(&reg_key("1001")), None);
    }

    #[test]
    fn reissue_replaces_previous_challenge() {
        let ledger = ChallengeLedger::new(DEFAULT_CHALLENGE_TTL);
        let first = Challenge::generate();
        let second = Challenge::generate();
        ledger.issue(reg_key("1001"), first.clone());
        ledger.issue(reg_key("1001"), second.clone());

        let consumed = ledger.consume(&reg_key("1001")).unwrap();
        assert_eq!(consumed, second);
        assert_ne!(consumed, first);
    }

    #[test]
    fn expired_records_are_not_consumable() {
        let ledger = ChallengeLedger::new(Duration::from_millis(1));
        ledger.issue(reg_key("1001"), Challenge::generate());
        std::thread::sleep(Duration::from_millis(10));

        assert_eq!(ledger.consume(&reg_key("1001")), None);
    }

    #[test]
    fn sweep_purges_only_expired_records() {
        let ledger = ChallengeLedger::new(Duration::from_millis(20));
        ledger.issue(reg_key("old"), Challenge::generate());
        std::thread::sleep(Duration::from_millis(40));
        ledger.issue(reg_key("fresh"), Challenge::generate());

        assert_eq!(ledger.sweep(), 1);
        assert_eq!(ledger.outstanding(), 1);
        assert!(ledger.consume(&reg_key("fresh")).is_some());
    }

    #[test]
    fn distinct_keys_do_not_interfere() {
        let ledger = ChallengeLedger::new(DEFAULT_CHALLENGE_TTL);
        let a = Challenge::generate();
        let b = Challenge::generate();
        ledger.issue(reg_key("a"), a.clone());
        ledger.issue(CeremonyKey::Session(SessionId::from("s-1")), b.clone());

        assert_eq!(ledger.consume(&reg_key("a")), Some(a));
        assert_eq!(
            ledger.consume(&CeremonyKey::Session(SessionId::from("s-1"))),
            Some(b)
        );
    }

    #[test]
    fn challenges_are_unique() {
        assert_ne!(Challenge::generate(), Challenge::generate());
    }
}
