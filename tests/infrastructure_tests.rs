use permission_service::domain::profile::ProfileKind;
use permission_service::infrastructure::{
    AccountRepository, InMemoryAccountRepository, InMemoryPermissionRepository,
    InMemoryProfileRepository, InMemoryRoleRepository, PermissionRepository,
    ProfileCacheInvalidator, ProfileRepository, RecordingProfileCacheInvalidator, RoleRepository,
};
use permission_service::test_utils::{create_test_account, create_test_permission};

#[tokio::test]
async fn test_permission_repository_create_and_lookup() {
    let repo = InMemoryPermissionRepository::new();
    let created = repo
        .create_permission("view_orders", "See incoming orders", "orders", 10)
        .await
        .unwrap();
    assert!(created.is_active);

    let by_id = repo.get_permission(&created.id).await.unwrap().unwrap();
    assert_eq!(by_id.name, "view_orders");
    let by_name = repo.find_by_name("view_orders").await.unwrap().unwrap();
    assert_eq!(by_name.id, created.id);
    assert!(repo.find_by_name("View_Orders").await.unwrap().is_none());
}

#[tokio::test]
async fn test_permission_repository_list_is_catalog_ordered() {
    let repo = InMemoryPermissionRepository::with_permissions(vec![
        create_test_permission("p1", "view_orders", "orders", 5),
        create_test_permission("p2", "manage_orders", "orders", 10),
        create_test_permission("p3", "edit_menu", "menu", 1),
    ]);
    let names: Vec<String> = repo
        .list_permissions()
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.name)
        .collect();
    assert_eq!(names, ["edit_menu", "manage_orders", "view_orders"]);
}

#[tokio::test]
async fn test_permission_repository_list_by_category_excludes_inactive() {
    let repo = InMemoryPermissionRepository::with_permissions(vec![
        create_test_permission("p1", "view_orders", "orders", 5),
        create_test_permission("p2", "manage_orders", "orders", 10),
    ]);
    repo.set_active("p2", false).await.unwrap();
    let names: Vec<String> = repo
        .list_by_category("orders")
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.name)
        .collect();
    assert_eq!(names, ["view_orders"]);
}

#[tokio::test]
async fn test_permission_repository_set_active_reports_missing_rows() {
    let repo = InMemoryPermissionRepository::new();
    assert!(!repo.set_active("ghost", false).await.unwrap());

    let created = repo
        .create_permission("view_orders", "desc", "orders", 0)
        .await
        .unwrap();
    assert!(repo.set_active(&created.id, false).await.unwrap());
    // flipping twice still succeeds
    assert!(repo.set_active(&created.id, false).await.unwrap());
    assert!(!repo.get_permission(&created.id).await.unwrap().unwrap().is_active);
}

#[tokio::test]
async fn test_role_repository_membership_mutations() {
    let repo = InMemoryRoleRepository::new();
    let role = repo.create_role("kitchen_manager_role", "desc", 1).await.unwrap();

    repo.assign_permission(&role.id, "p1").await.unwrap();
    repo.assign_permission(&role.id, "p1").await.unwrap();
    let loaded = repo.get_role(&role.id).await.unwrap().unwrap();
    assert_eq!(loaded.permissions, ["p1".to_string()]);

    repo.remove_permission(&role.id, "p1").await.unwrap();
    let loaded = repo.get_role(&role.id).await.unwrap().unwrap();
    assert!(loaded.permissions.is_empty());
}

#[tokio::test]
async fn test_profile_repository_grant_store_semantics() {
    let repo = InMemoryProfileRepository::new();
    let profile = repo.create_profile("user1", ProfileKind::Admin).await.unwrap();
    assert!(profile.direct_permissions.is_empty());
    assert!(profile.roles.is_empty());

    // upsert semantics: repeated grants do not duplicate
    repo.grant_permission(&profile.id, "p1").await.unwrap();
    repo.grant_permission(&profile.id, "p1").await.unwrap();
    repo.assign_role(&profile.id, "r1").await.unwrap();
    let loaded = repo.get_profile(&profile.id).await.unwrap().unwrap();
    assert_eq!(loaded.direct_permissions, ["p1".to_string()]);
    assert_eq!(loaded.roles, ["r1".to_string()]);

    // deleting an absent row is a no-op, not an error
    repo.revoke_permission(&profile.id, "p2").await.unwrap();
    repo.unassign_role(&profile.id, "r2").await.unwrap();
    let loaded = repo.get_profile(&profile.id).await.unwrap().unwrap();
    assert_eq!(loaded.direct_permissions, ["p1".to_string()]);

    // revoking a permission leaves the role membership alone
    repo.revoke_permission(&profile.id, "p1").await.unwrap();
    let loaded = repo.get_profile(&profile.id).await.unwrap().unwrap();
    assert!(loaded.direct_permissions.is_empty());
    assert_eq!(loaded.roles, ["r1".to_string()]);
}

#[tokio::test]
async fn test_profile_repository_one_profile_per_user_per_kind() {
    let repo = InMemoryProfileRepository::new();
    let admin = repo.create_profile("user1", ProfileKind::Admin).await.unwrap();
    let kitchen = repo.create_profile("user1", ProfileKind::Kitchen).await.unwrap();

    let found = repo
        .find_by_user("user1", ProfileKind::Admin)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id, admin.id);
    let found = repo
        .find_by_user("user1", ProfileKind::Kitchen)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id, kitchen.id);
    assert!(repo
        .find_by_user("user2", ProfileKind::Admin)
        .await
        .unwrap()
        .is_none());

    let all = repo.list_profiles(None).await.unwrap();
    assert_eq!(all.len(), 2);
    let kitchen_only = repo.list_profiles(Some(ProfileKind::Kitchen)).await.unwrap();
    assert_eq!(kitchen_only.len(), 1);
    assert_eq!(kitchen_only[0].id, kitchen.id);
}

#[tokio::test]
async fn test_account_repository_lookup() {
    let repo = InMemoryAccountRepository::new(vec![
        create_test_account("user1", "Dana", &["administrator"]),
        create_test_account("user2", "Jesse", &[]),
    ]);

    let account = repo.get_account("user1").await.unwrap().unwrap();
    assert_eq!(account.display_name, "Dana");
    assert_eq!(account.legacy_roles, ["administrator".to_string()]);
    assert!(repo.get_account("ghost").await.unwrap().is_none());
    assert_eq!(repo.list_accounts().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_recording_cache_invalidator_keeps_batches() {
    let invalidator = RecordingProfileCacheInvalidator::new();
    invalidator.invalidate(&["prof-1".to_string()]).await;
    invalidator
        .invalidate(&["prof-2".to_string(), "prof-3".to_string()])
        .await;

    let batches = invalidator.batches.lock().unwrap();
    assert_eq!(batches.len(), 2);
    assert_eq!(batches[0], ["prof-1".to_string()]);
    assert_eq!(batches[1], ["prof-2".to_string(), "prof-3".to_string()]);
}
