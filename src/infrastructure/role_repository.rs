use crate::domain::role::Role;
use crate::infrastructure::{RepoResult, RoleRepository};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{error, instrument};

#[derive(Debug, Clone)]
pub struct PostgresRoleRepository {
    pub pool: PgPool,
}

impl PostgresRoleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn permission_ids(&self, role_id: &str) -> RepoResult<Vec<String>> {
        sqlx::query_scalar::<_, String>(
            "SELECT permission_id FROM role_permissions WHERE role_id = $1 ORDER BY permission_id",
        )
        .bind(role_id)
        .fetch_all(&self.pool)
        .await
    }
}

#[derive(sqlx::FromRow)]
struct RoleRow {
    id: String,
    name: String,
    description: String,
    priority: i32,
    is_active: bool,
    created_at: DateTime<Utc>,
}

impl RoleRow {
    fn into_role(self, permissions: Vec<String>) -> Role {
        Role {
            id: self.id,
            name: self.name,
            description: self.description,
            priority: self.priority,
            is_active: self.is_active,
            permissions,
            created_at: self.created_at,
        }
    }
}

#[async_trait]
impl RoleRepository for PostgresRoleRepository {
    #[instrument(skip(self))]
    async fn create_role(&self, name: &str, description: &str, priority: i32) -> RepoResult<Role> {
        let id = uuid::Uuid::new_v4().to_string();
        let rec = sqlx::query_as::<_, RoleRow>(
            "INSERT INTO roles (id, name, description, priority, is_active, created_at) \
             VALUES ($1, $2, $3, $4, TRUE, NOW()) \
             RETURNING id, name, description, priority, is_active, created_at",
        )
        .bind(&id)
        .bind(name)
        .bind(description)
        .bind(priority)
        .fetch_one(&self.pool)
        .await;
        match rec {
            Ok(row) => Ok(row.into_role(vec![])),
            Err(e) => {
                error!(error = %e, "Failed to create role");
                Err(e)
            }
        }
    }

    #[instrument(skip(self))]
    async fn get_role(&self, role_id: &str) -> RepoResult<Option<Role>> {
        let row = sqlx::query_as::<_, RoleRow>(
            "SELECT id, name, description, priority, is_active, created_at FROM roles WHERE id = $1",
        )
        .bind(role_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to get role");
            e
        })?;
        match row {
            Some(row) => {
                let permissions = self.permission_ids(&row.id).await?;
                Ok(Some(row.into_role(permissions)))
            }
            None => Ok(None),
        }
    }

    #[instrument(skip(self))]
    async fn find_by_name(&self, name: &str) -> RepoResult<Option<Role>> {
        let row = sqlx::query_as::<_, RoleRow>(
            "SELECT id, name, description, priority, is_active, created_at FROM roles WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to find role by name");
            e
        })?;
        match row {
            Some(row) => {
                let permissions = self.permission_ids(&row.id).await?;
                Ok(Some(row.into_role(permissions)))
            }
            None => Ok(None),
        }
    }

    #[instrument(skip(self))]
    async fn list_roles(&self) -> RepoResult<Vec<Role>> {
        let rows = sqlx::query_as::<_, RoleRow>(
            "SELECT id, name, description, priority, is_active, created_at \
             FROM roles ORDER BY priority DESC, name ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to list roles");
            e
        })?;

        let memberships = sqlx::query_as::<_, (String, String)>(
            "SELECT role_id, permission_id FROM role_permissions ORDER BY permission_id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to list role permissions");
            e
        })?;

        let mut by_role: std::collections::HashMap<String, Vec<String>> =
            std::collections::HashMap::new();
        for (role_id, permission_id) in memberships {
            by_role.entry(role_id).or_default().push(permission_id);
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let permissions = by_role.remove(&row.id).unwrap_or_default();
                row.into_role(permissions)
            })
            .collect())
    }

    #[instrument(skip(self))]
    async fn set_active(&self, role_id: &str, active: bool) -> RepoResult<bool> {
        let result = sqlx::query("UPDATE roles SET is_active = $2 WHERE id = $1")
            .bind(role_id)
            .bind(active)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to update role active flag");
                e
            })?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self))]
    async fn assign_permission(&self, role_id: &str, permission_id: &str) -> RepoResult<()> {
        sqlx::query(
            "INSERT INTO role_permissions (role_id, permission_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(role_id)
        .bind(permission_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to assign permission to role");
            e
        })?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn remove_permission(&self, role_id: &str, permission_id: &str) -> RepoResult<()> {
        sqlx::query("DELETE FROM role_permissions WHERE role_id = $1 AND permission_id = $2")
            .bind(role_id)
            .bind(permission_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to remove permission from role");
                e
            })?;
        Ok(())
    }
}
