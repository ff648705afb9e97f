//! Credential Store
//!
//! Durable persistence and lookup of registered credentials:
//! - **PostgreSQL** (production): every mutating call commits before
//!   returning, and the user index is a SQL index maintained transactionally.
//! - **Memory** (development/tests fallback): dashmap-backed, selected when
//!   no database is configured.

mod memory;
mod postgres;

pub use memory::MemoryCredentialStore;
pub use postgres::PostgresCredentialStore;

use crate::types::UserId;

/// One registered authenticator. Everything except `counter` is immutable
/// after registration, and `counter` changes only through
/// [`CredentialStore::update_counter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    /// base64url credential id, assigned by the authenticator. Globally unique.
    pub id: String,
    pub user_id: UserId,
    /// COSE_Key CBOR exactly as produced at registration.
    pub public_key: Vec<u8>,
    pub counter: u32,
    /// Advisory transport hints; never security-relevant.
    pub transports: Vec<String>,
}

/// Storage errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database connection error: {0}")]
    Connection(String),

    #[error("database migration error: {0}")]
    Migration(String),

    #[error("query error: {0}")]
    Query(String),
}

/// Credential storage backend
pub enum CredentialStore {
    /// PostgreSQL storage (production)
    Postgres(PostgresCredentialStore),
    /// In-memory storage (development fallback)
    Memory(MemoryCredentialStore),
}

impl CredentialStore {
    /// Connect to PostgreSQL and run migrations.
    pub async fn postgres(database_url: &str) -> Result<Self, StoreError> {
        let store = PostgresCredentialStore::connect(database_url).await?;
        store.migrate().await?;
        Ok(Self::Postgres(store))
    }

    /// In-memory storage. Credentials are lost on restart.
    pub fn memory() -> Self {
        tracing::warn!("using in-memory credential storage - credentials will be lost on restart");
        Self::Memory(MemoryCredentialStore::new())
    }

    pub fn is_persistent(&self) -> bool {
        matches!(self, Self::Postgres(_))
    }

    pub async fn check_health(&self) -> Result<(), StoreError> {
        match self {
            Self::Postgres(pg) => pg.check_health().await,
            Self::Memory(_) => Ok(()),
        }
    }

    /// Insert a credential, overwriting any existing record with the same id.
    /// The user index gains the id at most once regardless of repeats.
    pub async fn save(&self, credential: Credential) -> Result<(), StoreError> {
        match self {
            Self::Postgres(pg) => pg.save(&credential).await,
            Self::Memory(mem) => {
                mem.save(credential);
                Ok(())
            }
        }
    }

    pub async fn get_by_id(&self, credential_id: &str) -> Result<Option<Credential>, StoreError> {
        match self {
            Self::Postgres(pg) => pg.get_by_id(credential_id).await,
            Self::Memory(mem) => Ok(mem.get_by_id(credential_id)),
        }
    }

    pub async fn get_by_user(&self, user_id: &UserId) -> Result<Vec<Credential>, StoreError> {
        match self {
            Self::Postgres(pg) => pg.get_by_user(user_id).await,
            Self::Memory(mem) => Ok(mem.get_by_user(user_id)),
        }
    }

    /// Overwrite the stored counter. A missing credential is a no-op, not an
    /// error; the caller already decided the assertion was acceptable.
    pub async fn update_counter(
        &self,
        credential_id: &str,
        counter: u32,
    ) -> Result<(), StoreError> {
        match self {
            Self::Postgres(pg) => pg.update_counter(credential_id, counter).await,
            Self::Memory(mem) => {
                mem.update_counter(credential_id, counter);
                Ok(())
            }
        }
    }
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let backend = match self {
            Self::Postgres(_) => "PostgreSQL",
            Self::Memory(_) => "Memory",
        };
        f.debug_struct("CredentialStore")
            .field("backend", &backend)
            .finish()
    }
}
