//! Keybridge Core - WebAuthn ceremony engine for storefront biometric login
//!
//! This crate implements the security-critical half of passwordless login:
//! challenge issuance and expiry, registration-ceremony verification,
//! authentication-ceremony verification, and the credential store with its
//! anti-replay counter discipline. The server never sees a private key or
//! biometric data, only signed assertions checked against public keys
//! stored at registration.
//!
//! # Example
//!
//! ```no_run
//! use keybridge_core::{CeremonyEngine, CredentialStore, RelyingParty};
//!
//! # async fn example() -> keybridge_core::Result<()> {
//! let rp = RelyingParty::new("Demo Store", "shop.example", "https://shop.example")
//!     .expect("valid relying party");
//! let engine = CeremonyEngine::builder(rp, CredentialStore::memory()).build();
//!
//! // Hand the options and session id to the browser...
//! let (options, session_id) = engine.begin_authentication();
//! // ...then verify what comes back:
//! // let user = engine.finish_authentication(&session_id, &assertion).await?;
//! # Ok(())
//! # }
//! ```

pub mod engine;
pub mod error;
pub mod ledger;
pub mod rp;
pub mod store;
pub mod testkit;
pub mod types;
pub mod verify;

mod authentication;
mod registration;

// Re-export main types for convenience
pub use engine::{CeremonyEngine, CeremonyEngineBuilder, SUPPORTED_ALGORITHMS};
pub use error::{CeremonyError, Result};
pub use ledger::{CeremonyKey, Challenge, ChallengeLedger, DEFAULT_CHALLENGE_TTL};
pub use rp::{RelyingParty, RelyingPartyError};
pub use store::{Credential, CredentialStore, StoreError};
pub use types::{
    AssertionResponse, AuthenticationParameters, CredentialSummary, RegistrationParameters,
    RegistrationResponse, SessionId, UserId,
};
pub use verify::{CosePublicKey, PlatformVerifier, SignatureError, SignatureVerifier};
