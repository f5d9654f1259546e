use crate::domain::profile::{Profile, ProfileKind};
use crate::infrastructure::{ProfileRepository, RepoResult};
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{error, instrument};

/// Grant store rows live in three tables: `profiles`, `profile_permissions`
/// and `profile_roles`. Every mutation below is a single statement, so each
/// one commits (or fails) on its own.
#[derive(Debug, Clone)]
pub struct PostgresProfileRepository {
    pub pool: PgPool,
}

impl PostgresProfileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_grants(&self, profile_id: &str) -> RepoResult<(Vec<String>, Vec<String>)> {
        let permissions = sqlx::query_scalar::<_, String>(
            "SELECT permission_id FROM profile_permissions WHERE profile_id = $1 ORDER BY permission_id",
        )
        .bind(profile_id)
        .fetch_all(&self.pool)
        .await?;
        let roles = sqlx::query_scalar::<_, String>(
            "SELECT role_id FROM profile_roles WHERE profile_id = $1 ORDER BY role_id",
        )
        .bind(profile_id)
        .fetch_all(&self.pool)
        .await?;
        Ok((permissions, roles))
    }
}

fn parse_kind(raw: &str) -> Result<ProfileKind, sqlx::Error> {
    ProfileKind::parse(raw)
        .ok_or_else(|| sqlx::Error::Decode(format!("unknown profile kind: {raw}").into()))
}

#[async_trait]
impl ProfileRepository for PostgresProfileRepository {
    #[instrument(skip(self))]
    async fn create_profile(&self, user_id: &str, kind: ProfileKind) -> RepoResult<Profile> {
        let id = uuid::Uuid::new_v4().to_string();
        sqlx::query("INSERT INTO profiles (id, user_id, kind) VALUES ($1, $2, $3)")
            .bind(&id)
            .bind(user_id)
            .bind(kind.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to create profile");
                e
            })?;
        Ok(Profile::new(id, user_id.to_string(), kind))
    }

    #[instrument(skip(self))]
    async fn get_profile(&self, profile_id: &str) -> RepoResult<Option<Profile>> {
        let row = sqlx::query_as::<_, (String, String, String)>(
            "SELECT id, user_id, kind FROM profiles WHERE id = $1",
        )
        .bind(profile_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to get profile");
            e
        })?;
        match row {
            Some((id, user_id, kind)) => {
                let kind = parse_kind(&kind)?;
                let (direct_permissions, roles) = self.load_grants(&id).await?;
                Ok(Some(Profile {
                    id,
                    user_id,
                    kind,
                    direct_permissions,
                    roles,
                }))
            }
            None => Ok(None),
        }
    }

    #[instrument(skip(self))]
    async fn find_by_user(&self, user_id: &str, kind: ProfileKind) -> RepoResult<Option<Profile>> {
        let row = sqlx::query_as::<_, (String, String, String)>(
            "SELECT id, user_id, kind FROM profiles WHERE user_id = $1 AND kind = $2",
        )
        .bind(user_id)
        .bind(kind.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to find profile by user");
            e
        })?;
        match row {
            Some((id, user_id, _)) => {
                let (direct_permissions, roles) = self.load_grants(&id).await?;
                Ok(Some(Profile {
                    id,
                    user_id,
                    kind,
                    direct_permissions,
                    roles,
                }))
            }
            None => Ok(None),
        }
    }

    #[instrument(skip(self))]
    async fn list_profiles(&self, kind: Option<ProfileKind>) -> RepoResult<Vec<Profile>> {
        let rows = match kind {
            Some(kind) => {
                sqlx::query_as::<_, (String, String, String)>(
                    "SELECT id, user_id, kind FROM profiles WHERE kind = $1 ORDER BY user_id",
                )
                .bind(kind.as_str())
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query_as::<_, (String, String, String)>(
                    "SELECT id, user_id, kind FROM profiles ORDER BY user_id, kind",
                )
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(|e| {
            error!(error = %e, "Failed to list profiles");
            e
        })?;

        let permission_rows = sqlx::query_as::<_, (String, String)>(
            "SELECT profile_id, permission_id FROM profile_permissions ORDER BY permission_id",
        )
        .fetch_all(&self.pool)
        .await?;
        let role_rows = sqlx::query_as::<_, (String, String)>(
            "SELECT profile_id, role_id FROM profile_roles ORDER BY role_id",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut permissions_by_profile: std::collections::HashMap<String, Vec<String>> =
            std::collections::HashMap::new();
        for (profile_id, permission_id) in permission_rows {
            permissions_by_profile.entry(profile_id).or_default().push(permission_id);
        }
        let mut roles_by_profile: std::collections::HashMap<String, Vec<String>> =
            std::collections::HashMap::new();
        for (profile_id, role_id) in role_rows {
            roles_by_profile.entry(profile_id).or_default().push(role_id);
        }

        rows.into_iter()
            .map(|(id, user_id, kind)| {
                let kind = parse_kind(&kind)?;
                Ok(Profile {
                    direct_permissions: permissions_by_profile.remove(&id).unwrap_or_default(),
                    roles: roles_by_profile.remove(&id).unwrap_or_default(),
                    id,
                    user_id,
                    kind,
                })
            })
            .collect()
    }

    #[instrument(skip(self))]
    async fn grant_permission(&self, profile_id: &str, permission_id: &str) -> RepoResult<()> {
        sqlx::query(
            "INSERT INTO profile_permissions (profile_id, permission_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(profile_id)
        .bind(permission_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to grant permission");
            e
        })?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn revoke_permission(&self, profile_id: &str, permission_id: &str) -> RepoResult<()> {
        sqlx::query("DELETE FROM profile_permissions WHERE profile_id = $1 AND permission_id = $2")
            .bind(profile_id)
            .bind(permission_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to revoke permission");
                e
            })?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn assign_role(&self, profile_id: &str, role_id: &str) -> RepoResult<()> {
        sqlx::query(
            "INSERT INTO profile_roles (profile_id, role_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(profile_id)
        .bind(role_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to assign role");
            e
        })?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn unassign_role(&self, profile_id: &str, role_id: &str) -> RepoResult<()> {
        sqlx::query("DELETE FROM profile_roles WHERE profile_id = $1 AND role_id = $2")
            .bind(profile_id)
            .bind(role_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to unassign role");
                e
            })?;
        Ok(())
    }
}
