//! PostgreSQL credential storage (production)

use sqlx::PgPool;

use crate::types::UserId;

use super::{Credential, StoreError};

pub struct PostgresCredentialStore {
    pool: PgPool,
}

impl PostgresCredentialStore {
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        tracing::info!("connected to PostgreSQL credential store");
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Migration(e.to_string()))?;

        tracing::info!("credential store migrations completed");
        Ok(())
    }

    pub async fn check_health(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        Ok(())
    }

    pub async fn save(&self, credential: &Credential) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO credentials (credential_id, user_id, public_key, counter, transports)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (credential_id) DO UPDATE SET
                user_id = EXCLUDED.user_id,
                public_key = EXCLUDED.public_key,
                counter = EXCLUDED.counter,
                transports = EXCLUDED.transports,
                last_used_at = NOW()
            "#,
        )
        .bind(&credential.id)
        .bind(credential.user_id.as_str())
        .bind(&credential.public_key)
        .bind(credential.counter as i64)
        .bind(&credential.transports)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        tracing::info!(credential_id = %credential.id, "credential stored");
        Ok(())
    }

    pub async fn get_by_id(&self, credential_id: &str) -> Result<Option<Credential>, StoreError> {
        let row = sqlx::query_as::<_, CredentialRow>(
            r#"
            SELECT credential_id, user_id, public_key, counter, transports
            FROM credentials
            WHERE credential_id = $1
            "#,
        )
        .bind(credential_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        Ok(row.map(CredentialRow::into_credential))
    }

    pub async fn get_by_user(&self, user_id: &UserId) -> Result<Vec<Credential>, StoreError> {
        let rows = sqlx::query_as::<_, CredentialRow>(
            r#"
            SELECT credential_id, user_id, public_key, counter, transports
            FROM credentials
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        Ok(rows.into_iter().map(CredentialRow::into_credential).collect())
    }

    pub async fn update_counter(
        &self,
        credential_id: &str,
        counter: u32,
    ) -> Result<(), StoreError> {
        // Zero rows affected means the credential is gone; mirroring the
        // memory backend, that is a no-op rather than an error.
        sqlx::query(
            r#"
            UPDATE credentials
            SET counter = $2, last_used_at = NOW()
            WHERE credential_id = $1
            "#,
        )
        .bind(credential_id)
        .bind(counter as i64)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct CredentialRow {
    credential_id: String,
    user_id: String,
    public_key: Vec<u8>,
    counter: i64,
    transports: Vec<String>,
}

impl CredentialRow {
    fn into_credential(self) -> Credential {
        Credential {
            id: self.credential_id,
            user_id: UserId::from(self.user_id),
            public_key: self.public_key,
            counter: self.counter as u32,
            transports: self.transports,
        }
    }
}

impl std::fmt::Debug for PostgresCredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresCredentialStore")
            .field("pool", &"<PgPool>")
            .finish()
    }
}
