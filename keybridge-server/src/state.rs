//! Application state module
//!
//! Defines shared state accessible across all request handlers.

use std::sync::Arc;
use std::time::Duration;

use keybridge_core::{CeremonyEngine, CredentialStore, RelyingParty};

use crate::config::Config;
use crate::error::ApiError;

/// Application state containing shared resources.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<CeremonyEngine>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Build state from configuration.
    ///
    /// Uses PostgreSQL credential storage when `DATABASE_URL` is set,
    /// otherwise falls back to in-memory (development only).
    pub async fn from_config(config: Config) -> Result<Self, ApiError> {
        let store = match &config.database_url {
            Some(url) => {
                tracing::info!("using PostgreSQL credential storage");
                CredentialStore::postgres(url)
                    .await
                    .map_err(|err| ApiError::internal(format!("credential store init: {err}")))?
            }
            None => CredentialStore::memory(),
        };

        let rp = RelyingParty::new(&config.rp_name, &config.rp_id, &config.rp_origin)
            .map_err(|err| ApiError::internal(format!("relying party config: {err}")))?;

        let engine = CeremonyEngine::builder(rp, store)
            .challenge_ttl(Duration::from_secs(config.challenge_ttl_secs))
            .accept_counterless(config.accept_counterless)
            .build();

        Ok(Self {
            engine: Arc::new(engine),
            config: Arc::new(config),
        })
    }
}
