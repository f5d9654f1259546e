use crate::application::services::{
    BulkUpdateService, CatalogService, MatrixService, ResolutionService,
};
use crate::domain::account::UserAccount;
use crate::domain::legacy::LegacyRoleMap;
use crate::domain::permission::Permission;
use crate::domain::profile::{Profile, ProfileKind};
use crate::domain::role::Role;
use crate::infrastructure::{
    AccountRepository, InMemoryAccountRepository, InMemoryPermissionRepository,
    InMemoryProfileRepository, InMemoryRoleRepository, PermissionRepository,
    ProfileCacheInvalidator, ProfileRepository, RecordingProfileCacheInvalidator, RoleRepository,
};
use crate::interface::app_state::AppState;
use std::collections::HashMap;
use std::sync::Arc;

/// Creates a test permission
pub fn create_test_permission(id: &str, name: &str, category: &str, priority: i32) -> Permission {
    Permission::new(
        id.to_string(),
        name.to_string(),
        format!("{name} description"),
        category.to_string(),
        priority,
    )
}

/// Creates a test role holding the given permission ids
pub fn create_test_role(id: &str, name: &str, permission_ids: &[&str]) -> Role {
    let mut role = Role::new(
        id.to_string(),
        name.to_string(),
        format!("{name} description"),
        0,
    );
    for permission_id in permission_ids {
        role.add_permission(permission_id.to_string());
    }
    role
}

/// Creates a test profile with empty grant sets
pub fn create_test_profile(id: &str, user_id: &str, kind: ProfileKind) -> Profile {
    Profile::new(id.to_string(), user_id.to_string(), kind)
}

/// Creates a test account carrying the given legacy role tags
pub fn create_test_account(id: &str, display_name: &str, legacy_roles: &[&str]) -> UserAccount {
    let mut account = UserAccount::new(
        id.to_string(),
        display_name.to_string(),
        format!("{id}@example.com"),
    );
    account.legacy_roles = legacy_roles.iter().map(|t| t.to_string()).collect();
    account
}

/// The permission catalog used across integration tests
pub fn restaurant_catalog() -> Vec<Permission> {
    vec![
        create_test_permission("perm-dashboard", "view_dashboard", "dashboard", 10),
        create_test_permission("perm-kitchen", "manage_kitchen", "kitchen", 10),
        create_test_permission("perm-menu", "edit_menu", "menu", 5),
        create_test_permission("perm-orders-view", "view_orders", "orders", 10),
        create_test_permission("perm-orders-manage", "manage_orders", "orders", 5),
        create_test_permission("perm-logs", "view_logs", "admin", 1),
    ]
}

/// An empty legacy role map for tests that do not exercise legacy tags
pub fn empty_legacy_map() -> LegacyRoleMap {
    LegacyRoleMap {
        version: 1,
        entries: HashMap::new(),
    }
}

/// Everything a test needs to reach both the services and the raw
/// repositories behind them.
pub struct TestContext {
    pub state: Arc<AppState>,
    pub permission_repo: Arc<InMemoryPermissionRepository>,
    pub role_repo: Arc<InMemoryRoleRepository>,
    pub profile_repo: Arc<InMemoryProfileRepository>,
    pub account_repo: Arc<InMemoryAccountRepository>,
    pub cache_invalidator: Arc<RecordingProfileCacheInvalidator>,
}

/// Creates a test application state over in-memory repositories
pub fn create_test_context(
    permissions: Vec<Permission>,
    roles: Vec<Role>,
    profiles: Vec<Profile>,
    accounts: Vec<UserAccount>,
    legacy_map: LegacyRoleMap,
) -> TestContext {
    let permission_repo = Arc::new(InMemoryPermissionRepository::with_permissions(permissions));
    let role_repo = Arc::new(InMemoryRoleRepository::with_roles(roles));
    let profile_repo = Arc::new(InMemoryProfileRepository::with_profiles(profiles));
    let account_repo = Arc::new(InMemoryAccountRepository::new(accounts));
    let cache_invalidator = Arc::new(RecordingProfileCacheInvalidator::new());
    let legacy_map = Arc::new(legacy_map);

    let permission_port = permission_repo.clone() as Arc<dyn PermissionRepository>;
    let role_port = role_repo.clone() as Arc<dyn RoleRepository>;
    let profile_port = profile_repo.clone() as Arc<dyn ProfileRepository>;
    let account_port = account_repo.clone() as Arc<dyn AccountRepository>;
    let invalidator_port = cache_invalidator.clone() as Arc<dyn ProfileCacheInvalidator>;

    let catalog_service = Arc::new(CatalogService::new(permission_port.clone(), role_port.clone()));
    let resolution_service = Arc::new(ResolutionService::new(
        permission_port.clone(),
        role_port.clone(),
        profile_port.clone(),
        account_port.clone(),
        legacy_map.clone(),
    ));
    let matrix_service = Arc::new(MatrixService::new(
        permission_port.clone(),
        role_port.clone(),
        profile_port.clone(),
        account_port.clone(),
        legacy_map.clone(),
    ));
    let bulk_service = Arc::new(BulkUpdateService::new(
        permission_port.clone(),
        role_port.clone(),
        profile_port.clone(),
        invalidator_port,
    ));

    let state = Arc::new(AppState {
        permission_repo: permission_port,
        role_repo: role_port,
        profile_repo: profile_port,
        account_repo: account_port,
        catalog_service,
        resolution_service,
        matrix_service,
        bulk_service,
        legacy_map,
    });

    TestContext {
        state,
        permission_repo,
        role_repo,
        profile_repo,
        account_repo,
        cache_invalidator,
    }
}

/// Creates an empty test application state
pub fn create_test_app_state() -> Arc<AppState> {
    create_test_context(vec![], vec![], vec![], vec![], empty_legacy_map()).state
}
