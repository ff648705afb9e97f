//! Relying Party identity
//!
//! The relying party is the service a credential is scoped to: a display
//! name, a domain id, and the exact origin the browser must report.

use sha2::{Digest, Sha256};
use url::Url;

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum RelyingPartyError {
    #[error("Invalid origin URL: {0}")]
    InvalidOrigin(String),
    #[error("Relying party id {id:?} is not a suffix of the origin host {host:?}")]
    IdOriginMismatch { id: String, host: String },
}

/// Relying party identity every ceremony binds to.
#[derive(Debug, Clone)]
pub struct RelyingParty {
    /// Human-readable name shown by the platform authenticator prompt.
    pub name: String,
    /// Relying party id (a domain name).
    pub id: String,
    /// Full origin URL the browser must have seen.
    pub origin: Url,
}

impl RelyingParty {
    pub fn new(name: &str, id: &str, origin: &str) -> Result<Self, RelyingPartyError> {
        let origin = Url::parse(origin)
            .map_err(|e| RelyingPartyError::InvalidOrigin(format!("{origin}: {e}")))?;

        let host = origin.host_str().unwrap_or_default().to_string();
        if host != id && !host.ends_with(&format!(".{id}")) {
            return Err(RelyingPartyError::IdOriginMismatch {
                id: id.to_string(),
                host,
            });
        }

        Ok(Self {
            name: name.to_string(),
            id: id.to_string(),
            origin,
        })
    }

    /// SHA-256 of the relying party id, as embedded in authenticator data.
    pub fn id_hash(&self) -> [u8; 32] {
        Sha256::digest(self.id.as_bytes()).into()
    }

    /// Exact-origin comparison against what the authenticator's client data
    /// reports. Scheme, host, and port all participate.
    pub fn origin_matches(&self, reported: &str) -> bool {
        Url::parse(reported)
            .map(|url| url.origin() == self.origin.origin())
            .unwrap_or(false)
    }
}
