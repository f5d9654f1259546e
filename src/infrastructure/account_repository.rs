use crate::domain::account::UserAccount;
use crate::infrastructure::{AccountRepository, RepoResult};
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{error, instrument};

/// Reads the platform's user accounts (owned by the wider system; this
/// service never writes them). Legacy role tags are a `TEXT[]` column.
#[derive(Debug, Clone)]
pub struct PostgresAccountRepository {
    pub pool: PgPool,
}

impl PostgresAccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountRepository for PostgresAccountRepository {
    #[instrument(skip(self))]
    async fn get_account(&self, user_id: &str) -> RepoResult<Option<UserAccount>> {
        let row = sqlx::query_as::<_, (String, String, String, Vec<String>)>(
            "SELECT id, display_name, email, legacy_roles FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to get account");
            e
        })?;
        Ok(row.map(|(id, display_name, email, legacy_roles)| UserAccount {
            id,
            display_name,
            email,
            legacy_roles,
        }))
    }

    #[instrument(skip(self))]
    async fn list_accounts(&self) -> RepoResult<Vec<UserAccount>> {
        let rows = sqlx::query_as::<_, (String, String, String, Vec<String>)>(
            "SELECT id, display_name, email, legacy_roles FROM users ORDER BY display_name, id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to list accounts");
            e
        })?;
        Ok(rows
            .into_iter()
            .map(|(id, display_name, email, legacy_roles)| UserAccount {
                id,
                display_name,
                email,
                legacy_roles,
            })
            .collect())
    }
}
