use crate::domain::permission::Permission;
use crate::infrastructure::{PermissionRepository, RepoResult};
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{error, instrument};

#[derive(Debug, Clone)]
pub struct PostgresPermissionRepository {
    pub pool: PgPool,
}

impl PostgresPermissionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PermissionRepository for PostgresPermissionRepository {
    #[instrument(skip(self))]
    async fn create_permission(
        &self,
        name: &str,
        description: &str,
        category: &str,
        priority: i32,
    ) -> RepoResult<Permission> {
        let id = uuid::Uuid::new_v4().to_string();
        let rec = sqlx::query_as::<_, Permission>(
            "INSERT INTO permissions (id, name, description, category, priority, is_active, created_at) \
             VALUES ($1, $2, $3, $4, $5, TRUE, NOW()) \
             RETURNING id, name, description, category, priority, is_active, created_at",
        )
        .bind(&id)
        .bind(name)
        .bind(description)
        .bind(category)
        .bind(priority)
        .fetch_one(&self.pool)
        .await;
        if let Err(ref e) = rec {
            error!(error = %e, "Failed to create permission");
        }
        rec
    }

    #[instrument(skip(self))]
    async fn get_permission(&self, permission_id: &str) -> RepoResult<Option<Permission>> {
        let res = sqlx::query_as::<_, Permission>(
            "SELECT id, name, description, category, priority, is_active, created_at \
             FROM permissions WHERE id = $1",
        )
        .bind(permission_id)
        .fetch_optional(&self.pool)
        .await;
        if let Err(ref e) = res {
            error!(error = %e, "Failed to get permission");
        }
        res
    }

    #[instrument(skip(self))]
    async fn find_by_name(&self, name: &str) -> RepoResult<Option<Permission>> {
        let res = sqlx::query_as::<_, Permission>(
            "SELECT id, name, description, category, priority, is_active, created_at \
             FROM permissions WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await;
        if let Err(ref e) = res {
            error!(error = %e, "Failed to find permission by name");
        }
        res
    }

    #[instrument(skip(self))]
    async fn list_permissions(&self) -> RepoResult<Vec<Permission>> {
        let res = sqlx::query_as::<_, Permission>(
            "SELECT id, name, description, category, priority, is_active, created_at \
             FROM permissions ORDER BY category ASC, priority DESC, name ASC",
        )
        .fetch_all(&self.pool)
        .await;
        if let Err(ref e) = res {
            error!(error = %e, "Failed to list permissions");
        }
        res
    }

    #[instrument(skip(self))]
    async fn list_by_category(&self, category: &str) -> RepoResult<Vec<Permission>> {
        let res = sqlx::query_as::<_, Permission>(
            "SELECT id, name, description, category, priority, is_active, created_at \
             FROM permissions WHERE category = $1 AND is_active = TRUE \
             ORDER BY priority DESC, name ASC",
        )
        .bind(category)
        .fetch_all(&self.pool)
        .await;
        if let Err(ref e) = res {
            error!(error = %e, "Failed to list permissions by category");
        }
        res
    }

    #[instrument(skip(self))]
    async fn set_active(&self, permission_id: &str, active: bool) -> RepoResult<bool> {
        let result = sqlx::query("UPDATE permissions SET is_active = $2 WHERE id = $1")
            .bind(permission_id)
            .bind(active)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to update permission active flag");
                e
            })?;
        Ok(result.rows_affected() > 0)
    }
}
