use crate::domain::account::UserAccount;
use crate::domain::permission::Permission;
use crate::domain::profile::{Profile, ProfileKind};
use crate::domain::role::Role;
use async_trait::async_trait;
use sqlx::Error;

pub type RepoResult<T> = Result<T, Error>;

// Infrastructure layer: database adapters and outbound ports

pub mod account_repository;
pub use account_repository::PostgresAccountRepository;

pub mod permission_repository;
pub use permission_repository::PostgresPermissionRepository;

pub mod profile_repository;
pub use profile_repository::PostgresProfileRepository;

pub mod role_repository;
pub use role_repository::PostgresRoleRepository;

#[async_trait]
pub trait PermissionRepository: Send + Sync {
    async fn create_permission(
        &self,
        name: &str,
        description: &str,
        category: &str,
        priority: i32,
    ) -> RepoResult<Permission>;
    async fn get_permission(&self, permission_id: &str) -> RepoResult<Option<Permission>>;
    async fn find_by_name(&self, name: &str) -> RepoResult<Option<Permission>>;
    /// All permissions (active and inactive) in catalog order.
    async fn list_permissions(&self) -> RepoResult<Vec<Permission>>;
    /// Active permissions in one category, by descending priority then name.
    async fn list_by_category(&self, category: &str) -> RepoResult<Vec<Permission>>;
    /// Flips the active flag. Returns false if the id does not exist.
    async fn set_active(&self, permission_id: &str, active: bool) -> RepoResult<bool>;
}

#[async_trait]
pub trait RoleRepository: Send + Sync {
    async fn create_role(&self, name: &str, description: &str, priority: i32) -> RepoResult<Role>;
    async fn get_role(&self, role_id: &str) -> RepoResult<Option<Role>>;
    async fn find_by_name(&self, name: &str) -> RepoResult<Option<Role>>;
    /// All roles (active and inactive) with their permission ids.
    async fn list_roles(&self) -> RepoResult<Vec<Role>>;
    /// Flips the active flag. Returns false if the id does not exist.
    async fn set_active(&self, role_id: &str, active: bool) -> RepoResult<bool>;
    async fn assign_permission(&self, role_id: &str, permission_id: &str) -> RepoResult<()>;
    async fn remove_permission(&self, role_id: &str, permission_id: &str) -> RepoResult<()>;
}

/// The grant store. Every mutation is a single-statement upsert/delete so
/// each bulk operation stays its own atomic unit and concurrent edits to
/// different grants on one profile never clobber each other.
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    async fn create_profile(&self, user_id: &str, kind: ProfileKind) -> RepoResult<Profile>;
    async fn get_profile(&self, profile_id: &str) -> RepoResult<Option<Profile>>;
    async fn find_by_user(&self, user_id: &str, kind: ProfileKind) -> RepoResult<Option<Profile>>;
    async fn list_profiles(&self, kind: Option<ProfileKind>) -> RepoResult<Vec<Profile>>;
    async fn grant_permission(&self, profile_id: &str, permission_id: &str) -> RepoResult<()>;
    async fn revoke_permission(&self, profile_id: &str, permission_id: &str) -> RepoResult<()>;
    async fn assign_role(&self, profile_id: &str, role_id: &str) -> RepoResult<()>;
    async fn unassign_role(&self, profile_id: &str, role_id: &str) -> RepoResult<()>;
}

#[async_trait]
pub trait AccountRepository: Send + Sync {
    async fn get_account(&self, user_id: &str) -> RepoResult<Option<UserAccount>>;
    async fn list_accounts(&self) -> RepoResult<Vec<UserAccount>>;
}

/// Outbound notification port: after a bulk batch, downstream read caches
/// keyed by profile id are told which profiles changed. Fire-and-forget.
#[async_trait]
pub trait ProfileCacheInvalidator: Send + Sync {
    async fn invalidate(&self, profile_ids: &[String]);
}

pub struct NoopProfileCacheInvalidator;

#[async_trait]
impl ProfileCacheInvalidator for NoopProfileCacheInvalidator {
    async fn invalidate(&self, _profile_ids: &[String]) {}
}

/// Test double that records every invalidation batch.
pub struct RecordingProfileCacheInvalidator {
    pub batches: std::sync::Mutex<Vec<Vec<String>>>,
}

impl RecordingProfileCacheInvalidator {
    pub fn new() -> Self {
        Self {
            batches: std::sync::Mutex::new(vec![]),
        }
    }
}

impl Default for RecordingProfileCacheInvalidator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProfileCacheInvalidator for RecordingProfileCacheInvalidator {
    async fn invalidate(&self, profile_ids: &[String]) {
        self.batches.lock().unwrap().push(profile_ids.to_vec());
    }
}

pub struct InMemoryPermissionRepository {
    pub permissions: std::sync::Mutex<Vec<Permission>>,
}

impl InMemoryPermissionRepository {
    pub fn new() -> Self {
        Self {
            permissions: std::sync::Mutex::new(vec![]),
        }
    }

    pub fn with_permissions(permissions: Vec<Permission>) -> Self {
        Self {
            permissions: std::sync::Mutex::new(permissions),
        }
    }
}

impl Default for InMemoryPermissionRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PermissionRepository for InMemoryPermissionRepository {
    async fn create_permission(
        &self,
        name: &str,
        description: &str,
        category: &str,
        priority: i32,
    ) -> RepoResult<Permission> {
        let permission = Permission::new(
            uuid::Uuid::new_v4().to_string(),
            name.to_string(),
            description.to_string(),
            category.to_string(),
            priority,
        );
        self.permissions.lock().unwrap().push(permission.clone());
        Ok(permission)
    }

    async fn get_permission(&self, permission_id: &str) -> RepoResult<Option<Permission>> {
        Ok(self
            .permissions
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == permission_id)
            .cloned())
    }

    async fn find_by_name(&self, name: &str) -> RepoResult<Option<Permission>> {
        Ok(self
            .permissions
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.name == name)
            .cloned())
    }

    async fn list_permissions(&self) -> RepoResult<Vec<Permission>> {
        let mut permissions = self.permissions.lock().unwrap().clone();
        permissions.sort_by(crate::domain::catalog::catalog_order);
        Ok(permissions)
    }

    async fn list_by_category(&self, category: &str) -> RepoResult<Vec<Permission>> {
        let mut permissions: Vec<Permission> = self
            .permissions
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.is_active && p.category == category)
            .cloned()
            .collect();
        permissions.sort_by(|a, b| b.priority.cmp(&a.priority).then_with(|| a.name.cmp(&b.name)));
        Ok(permissions)
    }

    async fn set_active(&self, permission_id: &str, active: bool) -> RepoResult<bool> {
        let mut permissions = self.permissions.lock().unwrap();
        match permissions.iter_mut().find(|p| p.id == permission_id) {
            Some(p) => {
                p.is_active = active;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

pub struct InMemoryRoleRepository {
    pub roles: std::sync::Mutex<Vec<Role>>,
}

impl InMemoryRoleRepository {
    pub fn new() -> Self {
        Self {
            roles: std::sync::Mutex::new(vec![]),
        }
    }

    pub fn with_roles(roles: Vec<Role>) -> Self {
        Self {
            roles: std::sync::Mutex::new(roles),
        }
    }
}

impl Default for InMemoryRoleRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RoleRepository for InMemoryRoleRepository {
    async fn create_role(&self, name: &str, description: &str, priority: i32) -> RepoResult<Role> {
        let role = Role::new(
            uuid::Uuid::new_v4().to_string(),
            name.to_string(),
            description.to_string(),
            priority,
        );
        self.roles.lock().unwrap().push(role.clone());
        Ok(role)
    }

    async fn get_role(&self, role_id: &str) -> RepoResult<Option<Role>> {
        Ok(self.roles.lock().unwrap().iter().find(|r| r.id == role_id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> RepoResult<Option<Role>> {
        Ok(self.roles.lock().unwrap().iter().find(|r| r.name == name).cloned())
    }

    async fn list_roles(&self) -> RepoResult<Vec<Role>> {
        let mut roles = self.roles.lock().unwrap().clone();
        roles.sort_by(|a, b| b.priority.cmp(&a.priority).then_with(|| a.name.cmp(&b.name)));
        Ok(roles)
    }

    async fn set_active(&self, role_id: &str, active: bool) -> RepoResult<bool> {
        let mut roles = self.roles.lock().unwrap();
        match roles.iter_mut().find(|r| r.id == role_id) {
            Some(r) => {
                r.is_active = active;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn assign_permission(&self, role_id: &str, permission_id: &str) -> RepoResult<()> {
        let mut roles = self.roles.lock().unwrap();
        if let Some(role) = roles.iter_mut().find(|r| r.id == role_id) {
            role.add_permission(permission_id.to_string());
        }
        Ok(())
    }

    async fn remove_permission(&self, role_id: &str, permission_id: &str) -> RepoResult<()> {
        let mut roles = self.roles.lock().unwrap();
        if let Some(role) = roles.iter_mut().find(|r| r.id == role_id) {
            role.remove_permission(permission_id);
        }
        Ok(())
    }
}

pub struct InMemoryProfileRepository {
    pub profiles: std::sync::Mutex<Vec<Profile>>,
}

impl InMemoryProfileRepository {
    pub fn new() -> Self {
        Self {
            profiles: std::sync::Mutex::new(vec![]),
        }
    }

    pub fn with_profiles(profiles: Vec<Profile>) -> Self {
        Self {
            profiles: std::sync::Mutex::new(profiles),
        }
    }
}

impl Default for InMemoryProfileRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProfileRepository for InMemoryProfileRepository {
    async fn create_profile(&self, user_id: &str, kind: ProfileKind) -> RepoResult<Profile> {
        let profile = Profile::new(uuid::Uuid::new_v4().to_string(), user_id.to_string(), kind);
        self.profiles.lock().unwrap().push(profile.clone());
        Ok(profile)
    }

    async fn get_profile(&self, profile_id: &str) -> RepoResult<Option<Profile>> {
        Ok(self
            .profiles
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == profile_id)
            .cloned())
    }

    async fn find_by_user(&self, user_id: &str, kind: ProfileKind) -> RepoResult<Option<Profile>> {
        Ok(self
            .profiles
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.user_id == user_id && p.kind == kind)
            .cloned())
    }

    async fn list_profiles(&self, kind: Option<ProfileKind>) -> RepoResult<Vec<Profile>> {
        Ok(self
            .profiles
            .lock()
            .unwrap()
            .iter()
            .filter(|p| kind.is_none_or(|k| p.kind == k))
            .cloned()
            .collect())
    }

    async fn grant_permission(&self, profile_id: &str, permission_id: &str) -> RepoResult<()> {
        let mut profiles = self.profiles.lock().unwrap();
        if let Some(profile) = profiles.iter_mut().find(|p| p.id == profile_id) {
            profile.grant_permission(permission_id.to_string());
        }
        Ok(())
    }

    async fn revoke_permission(&self, profile_id: &str, permission_id: &str) -> RepoResult<()> {
        let mut profiles = self.profiles.lock().unwrap();
        if let Some(profile) = profiles.iter_mut().find(|p| p.id == profile_id) {
            profile.revoke_permission(permission_id);
        }
        Ok(())
    }

    async fn assign_role(&self, profile_id: &str, role_id: &str) -> RepoResult<()> {
        let mut profiles = self.profiles.lock().unwrap();
        if let Some(profile) = profiles.iter_mut().find(|p| p.id == profile_id) {
            profile.assign_role(role_id.to_string());
        }
        Ok(())
    }

    async fn unassign_role(&self, profile_id: &str, role_id: &str) -> RepoResult<()> {
        let mut profiles = self.profiles.lock().unwrap();
        if let Some(profile) = profiles.iter_mut().find(|p| p.id == profile_id) {
            profile.unassign_role(role_id);
        }
        Ok(())
    }
}

pub struct InMemoryAccountRepository {
    pub accounts: std::sync::Mutex<Vec<UserAccount>>,
}

impl InMemoryAccountRepository {
    pub fn new(accounts: Vec<UserAccount>) -> Self {
        Self {
            accounts: std::sync::Mutex::new(accounts),
        }
    }
}

#[async_trait]
impl AccountRepository for InMemoryAccountRepository {
    async fn get_account(&self, user_id: &str) -> RepoResult<Option<UserAccount>> {
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.id == user_id)
            .cloned())
    }

    async fn list_accounts(&self) -> RepoResult<Vec<UserAccount>> {
        Ok(self.accounts.lock().unwrap().clone())
    }
}
