use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::application::validators::{CatalogValidator, FieldError};
use crate::domain::account::UserAccount;
use crate::domain::catalog::CatalogSnapshot;
use crate::domain::legacy::LegacyRoleMap;
use crate::domain::matrix::{PermissionGrid, RoleGrid, build_permission_grid, build_role_grid};
use crate::domain::permission::Permission;
use crate::domain::profile::{Profile, ProfileKind};
use crate::domain::resolution::{EffectiveSet, ResolutionEngine};
use crate::domain::role::Role;
use crate::infrastructure::{
    AccountRepository, PermissionRepository, ProfileCacheInvalidator, ProfileRepository,
    RoleRepository,
};

/// Error taxonomy for catalog and grant operations.
///
/// Catalog mutations fail fast with one of these; bulk mutations never
/// surface them directly, collecting per-operation reasons into the report
/// instead.
#[derive(Debug, thiserror::Error)]
pub enum AccessError {
    #[error("validation failed: {0}")]
    Validation(#[from] FieldError),
    #[error("{kind} name already in use: {name}")]
    DuplicateName { kind: &'static str, name: String },
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },
    /// Reserved for version-stamped grant mutations; the base service never
    /// produces it.
    #[error("profile {profile_id} was modified concurrently")]
    Conflict { profile_id: String },
    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

// ============================================================================
// CATALOG SERVICE
// ============================================================================

/// Permission and role catalog administration. Each call is all-or-nothing:
/// input is validated and duplicate names rejected before any row is written.
pub struct CatalogService {
    permission_repo: Arc<dyn PermissionRepository>,
    role_repo: Arc<dyn RoleRepository>,
}

impl CatalogService {
    pub fn new(
        permission_repo: Arc<dyn PermissionRepository>,
        role_repo: Arc<dyn RoleRepository>,
    ) -> Self {
        Self {
            permission_repo,
            role_repo,
        }
    }

    #[instrument(skip(self, description))]
    pub async fn create_permission(
        &self,
        name: &str,
        description: &str,
        category: &str,
        priority: i32,
    ) -> Result<Permission, AccessError> {
        CatalogValidator::validate_name(name)?;
        CatalogValidator::validate_description(description)?;
        CatalogValidator::validate_category(category)?;
        // Case-sensitive exact match; inactive entries also block the name.
        if self.permission_repo.find_by_name(name).await?.is_some() {
            return Err(AccessError::DuplicateName {
                kind: "permission",
                name: name.to_string(),
            });
        }
        let permission = self
            .permission_repo
            .create_permission(name, description, category, priority)
            .await?;
        info!(permission_id = %permission.id, name = %permission.name, "Permission created");
        Ok(permission)
    }

    #[instrument(skip(self))]
    pub async fn get_permission(&self, permission_id: &str) -> Result<Permission, AccessError> {
        self.permission_repo
            .get_permission(permission_id)
            .await?
            .ok_or(AccessError::NotFound {
                kind: "permission",
                id: permission_id.to_string(),
            })
    }

    pub async fn list_permissions(&self) -> Result<Vec<Permission>, AccessError> {
        Ok(self.permission_repo.list_permissions().await?)
    }

    /// Active permissions in one category, descending priority then name.
    pub async fn list_permissions_by_category(
        &self,
        category: &str,
    ) -> Result<Vec<Permission>, AccessError> {
        Ok(self.permission_repo.list_by_category(category).await?)
    }

    /// Soft-disable; calling twice is not an error.
    #[instrument(skip(self))]
    pub async fn deactivate_permission(&self, permission_id: &str) -> Result<(), AccessError> {
        if !self.permission_repo.set_active(permission_id, false).await? {
            return Err(AccessError::NotFound {
                kind: "permission",
                id: permission_id.to_string(),
            });
        }
        info!(permission_id, "Permission deactivated");
        Ok(())
    }

    /// Restores a soft-disabled permission; existing grant rows become
    /// effective again without re-granting.
    #[instrument(skip(self))]
    pub async fn activate_permission(&self, permission_id: &str) -> Result<(), AccessError> {
        if !self.permission_repo.set_active(permission_id, true).await? {
            return Err(AccessError::NotFound {
                kind: "permission",
                id: permission_id.to_string(),
            });
        }
        info!(permission_id, "Permission activated");
        Ok(())
    }

    #[instrument(skip(self, description))]
    pub async fn create_role(
        &self,
        name: &str,
        description: &str,
        priority: i32,
    ) -> Result<Role, AccessError> {
        CatalogValidator::validate_name(name)?;
        CatalogValidator::validate_description(description)?;
        if self.role_repo.find_by_name(name).await?.is_some() {
            return Err(AccessError::DuplicateName {
                kind: "role",
                name: name.to_string(),
            });
        }
        let role = self.role_repo.create_role(name, description, priority).await?;
        info!(role_id = %role.id, name = %role.name, "Role created");
        Ok(role)
    }

    #[instrument(skip(self))]
    pub async fn get_role(&self, role_id: &str) -> Result<Role, AccessError> {
        self.role_repo
            .get_role(role_id)
            .await?
            .ok_or(AccessError::NotFound {
                kind: "role",
                id: role_id.to_string(),
            })
    }

    pub async fn list_roles(&self) -> Result<Vec<Role>, AccessError> {
        Ok(self.role_repo.list_roles().await?)
    }

    #[instrument(skip(self))]
    pub async fn deactivate_role(&self, role_id: &str) -> Result<(), AccessError> {
        if !self.role_repo.set_active(role_id, false).await? {
            return Err(AccessError::NotFound {
                kind: "role",
                id: role_id.to_string(),
            });
        }
        info!(role_id, "Role deactivated");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn assign_permission_to_role(
        &self,
        role_id: &str,
        permission_id: &str,
    ) -> Result<(), AccessError> {
        self.get_role(role_id).await?;
        self.get_permission(permission_id).await?;
        self.role_repo.assign_permission(role_id, permission_id).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn remove_permission_from_role(
        &self,
        role_id: &str,
        permission_id: &str,
    ) -> Result<(), AccessError> {
        self.get_role(role_id).await?;
        self.role_repo.remove_permission(role_id, permission_id).await?;
        Ok(())
    }

    /// Loads both catalogs into an indexed snapshot for resolution.
    pub async fn snapshot(&self) -> Result<CatalogSnapshot, AccessError> {
        let permissions = self.permission_repo.list_permissions().await?;
        let roles = self.role_repo.list_roles().await?;
        Ok(CatalogSnapshot::new(permissions, roles))
    }
}

// ============================================================================
// RESOLUTION SERVICE
// ============================================================================

/// Read-side: loads a profile and its owning account, then runs the
/// resolution engine over a catalog snapshot. Takes no locks.
pub struct ResolutionService {
    permission_repo: Arc<dyn PermissionRepository>,
    role_repo: Arc<dyn RoleRepository>,
    profile_repo: Arc<dyn ProfileRepository>,
    account_repo: Arc<dyn AccountRepository>,
    legacy_map: Arc<LegacyRoleMap>,
}

impl ResolutionService {
    pub fn new(
        permission_repo: Arc<dyn PermissionRepository>,
        role_repo: Arc<dyn RoleRepository>,
        profile_repo: Arc<dyn ProfileRepository>,
        account_repo: Arc<dyn AccountRepository>,
        legacy_map: Arc<LegacyRoleMap>,
    ) -> Self {
        Self {
            permission_repo,
            role_repo,
            profile_repo,
            account_repo,
            legacy_map,
        }
    }

    async fn snapshot(&self) -> Result<CatalogSnapshot, AccessError> {
        let permissions = self.permission_repo.list_permissions().await?;
        let roles = self.role_repo.list_roles().await?;
        Ok(CatalogSnapshot::new(permissions, roles))
    }

    async fn legacy_tags(&self, user_id: &str) -> Result<Vec<String>, AccessError> {
        // A missing account row just means no legacy tags.
        Ok(self
            .account_repo
            .get_account(user_id)
            .await?
            .map(|account| account.legacy_roles)
            .unwrap_or_default())
    }

    /// Effective permission set with provenance for one profile.
    #[instrument(skip(self))]
    pub async fn effective_permissions(
        &self,
        profile_id: &str,
    ) -> Result<EffectiveSet, AccessError> {
        let profile = self
            .profile_repo
            .get_profile(profile_id)
            .await?
            .ok_or(AccessError::NotFound {
                kind: "profile",
                id: profile_id.to_string(),
            })?;
        let legacy_tags = self.legacy_tags(&profile.user_id).await?;
        let snapshot = self.snapshot().await?;
        Ok(ResolutionEngine::new(&snapshot, &self.legacy_map).resolve(&profile, &legacy_tags))
    }

    /// Audit view: the profile of the given user and kind plus its resolved
    /// set.
    #[instrument(skip(self))]
    pub async fn effective_permissions_for_user(
        &self,
        user_id: &str,
        kind: ProfileKind,
    ) -> Result<(Profile, EffectiveSet), AccessError> {
        let profile = self
            .profile_repo
            .find_by_user(user_id, kind)
            .await?
            .ok_or(AccessError::NotFound {
                kind: "profile",
                id: user_id.to_string(),
            })?;
        let legacy_tags = self.legacy_tags(user_id).await?;
        let snapshot = self.snapshot().await?;
        let effective =
            ResolutionEngine::new(&snapshot, &self.legacy_map).resolve(&profile, &legacy_tags);
        Ok((profile, effective))
    }

    /// One-off membership check. Callers probing many permissions should use
    /// `effective_permissions` once and check the returned set.
    pub async fn has_permission(
        &self,
        profile_id: &str,
        permission_name: &str,
    ) -> Result<bool, AccessError> {
        Ok(self
            .effective_permissions(profile_id)
            .await?
            .contains(permission_name))
    }
}

// ============================================================================
// MATRIX SERVICE
// ============================================================================

/// Everything the matrix endpoints need in one load: the grid plus the
/// account directory and the active role catalog.
pub struct MatrixData {
    pub grid: PermissionGrid,
    pub accounts: HashMap<String, UserAccount>,
    pub roles: Vec<Role>,
}

pub struct RoleMatrixData {
    pub grid: RoleGrid,
    pub accounts: HashMap<String, UserAccount>,
}

/// Builds review grids for all profiles. Resolution runs once per profile;
/// cell checks are O(1) against each precomputed effective set.
pub struct MatrixService {
    permission_repo: Arc<dyn PermissionRepository>,
    role_repo: Arc<dyn RoleRepository>,
    profile_repo: Arc<dyn ProfileRepository>,
    account_repo: Arc<dyn AccountRepository>,
    legacy_map: Arc<LegacyRoleMap>,
}

impl MatrixService {
    pub fn new(
        permission_repo: Arc<dyn PermissionRepository>,
        role_repo: Arc<dyn RoleRepository>,
        profile_repo: Arc<dyn ProfileRepository>,
        account_repo: Arc<dyn AccountRepository>,
        legacy_map: Arc<LegacyRoleMap>,
    ) -> Self {
        Self {
            permission_repo,
            role_repo,
            profile_repo,
            account_repo,
            legacy_map,
        }
    }

    async fn load(
        &self,
        kind: Option<ProfileKind>,
    ) -> Result<(CatalogSnapshot, Vec<Profile>, HashMap<String, UserAccount>), AccessError> {
        let permissions = self.permission_repo.list_permissions().await?;
        let roles = self.role_repo.list_roles().await?;
        let snapshot = CatalogSnapshot::new(permissions, roles);
        let profiles = self.profile_repo.list_profiles(kind).await?;
        let accounts = self
            .account_repo
            .list_accounts()
            .await?
            .into_iter()
            .map(|account| (account.id.clone(), account))
            .collect();
        Ok((snapshot, profiles, accounts))
    }

    #[instrument(skip(self))]
    pub async fn permission_matrix(
        &self,
        category: Option<&str>,
        kind: Option<ProfileKind>,
    ) -> Result<MatrixData, AccessError> {
        let (snapshot, profiles, accounts) = self.load(kind).await?;
        let entries: Vec<(Profile, Vec<String>)> = profiles
            .into_iter()
            .map(|profile| {
                let legacy_tags = accounts
                    .get(&profile.user_id)
                    .map(|account| account.legacy_roles.clone())
                    .unwrap_or_default();
                (profile, legacy_tags)
            })
            .collect();
        let grid = build_permission_grid(&entries, &snapshot, &self.legacy_map, category);
        let roles = snapshot.ordered_roles().into_iter().cloned().collect();
        Ok(MatrixData {
            grid,
            accounts,
            roles,
        })
    }

    #[instrument(skip(self))]
    pub async fn role_matrix(
        &self,
        kind: Option<ProfileKind>,
    ) -> Result<RoleMatrixData, AccessError> {
        let (snapshot, profiles, accounts) = self.load(kind).await?;
        let grid = build_role_grid(&profiles, &snapshot);
        Ok(RoleMatrixData { grid, accounts })
    }
}

// ============================================================================
// BULK UPDATE SERVICE
// ============================================================================

/// One grant/revoke instruction against one profile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BulkAction {
    AddPermission,
    RemovePermission,
    AddRole,
    RemoveRole,
}

impl BulkAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            BulkAction::AddPermission => "add_permission",
            BulkAction::RemovePermission => "remove_permission",
            BulkAction::AddRole => "add_role",
            BulkAction::RemoveRole => "remove_role",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "add_permission" => Some(BulkAction::AddPermission),
            "remove_permission" => Some(BulkAction::RemovePermission),
            "add_role" => Some(BulkAction::AddRole),
            "remove_role" => Some(BulkAction::RemoveRole),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BulkOperation {
    pub profile_id: String,
    pub action: BulkAction,
    pub target_id: String,
}

#[derive(Clone, Debug, serde::Serialize)]
pub struct BulkFailure {
    pub operation: BulkOperation,
    pub reason: String,
}

/// Outcome of a batch. `processed` counts the operations that survived
/// deduplication; `failures` always lists every operation that did not
/// apply, so partial progress is never lost.
#[derive(Clone, Debug, Default, serde::Serialize)]
pub struct BulkReport {
    pub processed: usize,
    pub successful: usize,
    pub failures: Vec<BulkFailure>,
}

/// Applies batched grant/revoke operations with best-effort semantics: each
/// operation is validated and applied independently (one storage statement
/// per operation, no shared transaction), and a failure in one never rolls
/// back or blocks the others.
pub struct BulkUpdateService {
    permission_repo: Arc<dyn PermissionRepository>,
    role_repo: Arc<dyn RoleRepository>,
    profile_repo: Arc<dyn ProfileRepository>,
    cache_invalidator: Arc<dyn ProfileCacheInvalidator>,
}

impl BulkUpdateService {
    pub fn new(
        permission_repo: Arc<dyn PermissionRepository>,
        role_repo: Arc<dyn RoleRepository>,
        profile_repo: Arc<dyn ProfileRepository>,
        cache_invalidator: Arc<dyn ProfileCacheInvalidator>,
    ) -> Self {
        Self {
            permission_repo,
            role_repo,
            profile_repo,
            cache_invalidator,
        }
    }

    /// Collapses repeated toggles of one cell: scanning in list order, of any
    /// two operations sharing `(profile_id, target_id)` (regardless of
    /// action) only the last survives. Dedup is authoritative here, not in
    /// the submitting UI.
    pub fn dedupe(operations: Vec<BulkOperation>) -> Vec<BulkOperation> {
        let mut last_index: HashMap<(String, String), usize> = HashMap::new();
        for (index, op) in operations.iter().enumerate() {
            last_index.insert((op.profile_id.clone(), op.target_id.clone()), index);
        }
        operations
            .into_iter()
            .enumerate()
            .filter(|(index, op)| {
                last_index[&(op.profile_id.clone(), op.target_id.clone())] == *index
            })
            .map(|(_, op)| op)
            .collect()
    }

    /// Applies a batch and reports per-operation outcomes. Never fails as a
    /// whole: storage errors on individual operations land in `failures`
    /// like any other reason. After the batch, changed profile ids are
    /// handed to the cache invalidation hook.
    #[instrument(skip(self, operations), fields(submitted = operations.len()))]
    pub async fn apply(&self, operations: Vec<BulkOperation>) -> BulkReport {
        let operations = Self::dedupe(operations);
        let mut report = BulkReport {
            processed: operations.len(),
            ..Default::default()
        };
        let mut touched: Vec<String> = vec![];

        for operation in operations {
            match self.apply_one(&operation).await {
                Ok(()) => {
                    report.successful += 1;
                    if !touched.contains(&operation.profile_id) {
                        touched.push(operation.profile_id.clone());
                    }
                }
                Err(error) => {
                    warn!(
                        profile_id = %operation.profile_id,
                        target_id = %operation.target_id,
                        action = operation.action.as_str(),
                        error = %error,
                        "Bulk operation failed"
                    );
                    report.failures.push(BulkFailure {
                        operation,
                        reason: error.to_string(),
                    });
                }
            }
        }

        if !touched.is_empty() {
            self.cache_invalidator.invalidate(&touched).await;
        }
        info!(
            processed = report.processed,
            successful = report.successful,
            failed = report.failures.len(),
            "Bulk update applied"
        );
        report
    }

    async fn apply_one(&self, operation: &BulkOperation) -> Result<(), AccessError> {
        if self
            .profile_repo
            .get_profile(&operation.profile_id)
            .await?
            .is_none()
        {
            return Err(AccessError::NotFound {
                kind: "profile",
                id: operation.profile_id.clone(),
            });
        }

        match operation.action {
            BulkAction::AddPermission | BulkAction::RemovePermission => {
                let permission = self
                    .permission_repo
                    .get_permission(&operation.target_id)
                    .await?
                    .ok_or(AccessError::NotFound {
                        kind: "permission",
                        id: operation.target_id.clone(),
                    })?;
                if !permission.is_active {
                    return Err(AccessError::Validation(FieldError {
                        field: "target_id".to_string(),
                        message: format!("permission '{}' is inactive", permission.name),
                    }));
                }
                match operation.action {
                    BulkAction::AddPermission => {
                        self.profile_repo
                            .grant_permission(&operation.profile_id, &operation.target_id)
                            .await?
                    }
                    _ => {
                        self.profile_repo
                            .revoke_permission(&operation.profile_id, &operation.target_id)
                            .await?
                    }
                }
            }
            BulkAction::AddRole | BulkAction::RemoveRole => {
                let role = self
                    .role_repo
                    .get_role(&operation.target_id)
                    .await?
                    .ok_or(AccessError::NotFound {
                        kind: "role",
                        id: operation.target_id.clone(),
                    })?;
                if !role.is_active {
                    return Err(AccessError::Validation(FieldError {
                        field: "target_id".to_string(),
                        message: format!("role '{}' is inactive", role.name),
                    }));
                }
                match operation.action {
                    BulkAction::AddRole => {
                        self.profile_repo
                            .assign_role(&operation.profile_id, &operation.target_id)
                            .await?
                    }
                    _ => {
                        self.profile_repo
                            .unassign_role(&operation.profile_id, &operation.target_id)
                            .await?
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op(profile_id: &str, action: BulkAction, target_id: &str) -> BulkOperation {
        BulkOperation {
            profile_id: profile_id.to_string(),
            action,
            target_id: target_id.to_string(),
        }
    }

    #[test]
    fn test_dedupe_last_wins_across_actions() {
        let ops = vec![
            op("p1", BulkAction::AddPermission, "x"),
            op("p1", BulkAction::RemovePermission, "x"),
        ];
        let deduped = BulkUpdateService::dedupe(ops);
        assert_eq!(deduped.len(), 1);
        assert_eq!(deduped[0].action, BulkAction::RemovePermission);
    }

    #[test]
    fn test_dedupe_keeps_distinct_cells_in_order() {
        let ops = vec![
            op("p1", BulkAction::AddPermission, "x"),
            op("p2", BulkAction::AddPermission, "x"),
            op("p1", BulkAction::AddRole, "y"),
            op("p1", BulkAction::AddPermission, "x"),
        ];
        let deduped = BulkUpdateService::dedupe(ops);
        assert_eq!(deduped.len(), 3);
        assert_eq!(deduped[0].profile_id, "p2");
        assert_eq!(deduped[1].target_id, "y");
        assert_eq!(deduped[2], op("p1", BulkAction::AddPermission, "x"));
    }

    #[test]
    fn test_bulk_action_string_round_trip() {
        for action in [
            BulkAction::AddPermission,
            BulkAction::RemovePermission,
            BulkAction::AddRole,
            BulkAction::RemoveRole,
        ] {
            assert_eq!(BulkAction::parse(action.as_str()), Some(action));
        }
        assert_eq!(BulkAction::parse("toggle"), None);
    }
}
