use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header::CONTENT_TYPE},
    routing::{delete, get, post},
};
use permission_service::domain::profile::ProfileKind;
use permission_service::interface::http_handlers::{
    bulk_update_handler, create_permission_handler, create_profile_handler,
    deactivate_permission_handler, list_permissions_handler, permission_matrix_handler,
    role_matrix_handler, user_permissions_handler,
};
use permission_service::interface::{
    AppState, BulkUpdateResponse, MatrixResponse, PermissionResponse, PermissionsListResponse,
    ProfileResponse, RoleMatrixResponse, UserPermissionsResponse,
};
use permission_service::test_utils::{
    TestContext, create_test_account, create_test_profile, create_test_role, empty_legacy_map,
    restaurant_catalog,
};
use std::sync::Arc;
use tower::ServiceExt;

fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/access/permissions", post(create_permission_handler))
        .route("/v1/access/permissions", get(list_permissions_handler))
        .route(
            "/v1/access/permissions/{permission_id}",
            delete(deactivate_permission_handler),
        )
        .route("/v1/access/profiles", post(create_profile_handler))
        .route("/v1/access/matrix", get(permission_matrix_handler))
        .route("/v1/access/matrix/roles", get(role_matrix_handler))
        .route("/v1/access/bulk-update", post(bulk_update_handler))
        .route(
            "/v1/access/users/{user_id}/permissions",
            get(user_permissions_handler),
        )
        .with_state(state)
}

fn seeded_context() -> TestContext {
    let permissions = restaurant_catalog();
    let roles = vec![create_test_role(
        "role-kitchen",
        "kitchen_manager_role",
        &["perm-dashboard", "perm-kitchen"],
    )];
    let mut kitchen_profile = create_test_profile("prof-u2", "user2", ProfileKind::Kitchen);
    kitchen_profile.assign_role("role-kitchen".to_string());
    let mut admin_profile = create_test_profile("prof-u1", "user1", ProfileKind::Admin);
    admin_profile.grant_permission("perm-menu".to_string());
    let profiles = vec![admin_profile, kitchen_profile];
    let accounts = vec![
        create_test_account("user1", "Dana", &[]),
        create_test_account("user2", "Jesse", &[]),
    ];
    permission_service::test_utils::create_test_context(
        permissions,
        roles,
        profiles,
        accounts,
        empty_legacy_map(),
    )
}

fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn response_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// ===== CATALOG ENDPOINTS =====

#[tokio::test]
async fn test_create_permission_endpoint() {
    let ctx = seeded_context();
    let response = app(ctx.state.clone())
        .oneshot(json_request(
            "POST",
            "/v1/access/permissions",
            serde_json::json!({
                "name": "manage_tables",
                "description": "Manage table assignments",
                "category": "orders",
                "priority": 2
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let created: PermissionResponse = response_json(response).await;
    assert_eq!(created.name, "manage_tables");
    assert!(created.is_active);
}

#[tokio::test]
async fn test_create_permission_endpoint_duplicate_is_conflict() {
    let ctx = seeded_context();
    let response = app(ctx.state.clone())
        .oneshot(json_request(
            "POST",
            "/v1/access/permissions",
            serde_json::json!({
                "name": "view_orders",
                "description": "Again",
                "category": "orders"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_create_permission_endpoint_invalid_is_bad_request() {
    let ctx = seeded_context();
    let response = app(ctx.state.clone())
        .oneshot(json_request(
            "POST",
            "/v1/access/permissions",
            serde_json::json!({
                "name": "ab",
                "description": "Too short a name",
                "category": "orders"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_permissions_endpoint_with_category_filter() {
    let ctx = seeded_context();
    let response = app(ctx.state.clone())
        .oneshot(
            Request::builder()
                .uri("/v1/access/permissions?category=orders")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let list: PermissionsListResponse = response_json(response).await;
    let names: Vec<&str> = list.permissions.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["view_orders", "manage_orders"]);
}

#[tokio::test]
async fn test_deactivate_permission_endpoint_and_matrix_exclusion() {
    let ctx = seeded_context();
    let response = app(ctx.state.clone())
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/v1/access/permissions/perm-menu")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app(ctx.state.clone())
        .oneshot(
            Request::builder()
                .uri("/v1/access/matrix")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let matrix: MatrixResponse = response_json(response).await;
    assert!(matrix
        .available_permissions
        .iter()
        .all(|p| p.name != "edit_menu"));
    // user1 only had edit_menu directly
    let row = matrix.matrix.iter().find(|r| r.user == "Dana").unwrap();
    assert!(row.permissions.is_empty());
}

#[tokio::test]
async fn test_deactivate_missing_permission_is_not_found() {
    let ctx = seeded_context();
    let response = app(ctx.state.clone())
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/v1/access/permissions/perm-ghost")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ===== PROFILE ENDPOINT =====

#[tokio::test]
async fn test_create_profile_endpoint() {
    let ctx = seeded_context();
    let response = app(ctx.state.clone())
        .oneshot(json_request(
            "POST",
            "/v1/access/profiles",
            serde_json::json!({"user_id": "user3", "kind": "kitchen"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let profile: ProfileResponse = response_json(response).await;
    assert_eq!(profile.user_id, "user3");
    assert_eq!(profile.kind, "kitchen");

    // second create for the same user and kind conflicts
    let response = app(ctx.state.clone())
        .oneshot(json_request(
            "POST",
            "/v1/access/profiles",
            serde_json::json!({"user_id": "user3", "kind": "kitchen"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // unknown kind is rejected up front
    let response = app(ctx.state.clone())
        .oneshot(json_request(
            "POST",
            "/v1/access/profiles",
            serde_json::json!({"user_id": "user4", "kind": "waiter"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ===== MATRIX ENDPOINTS =====

#[tokio::test]
async fn test_matrix_endpoint_shape() {
    let ctx = seeded_context();
    let response = app(ctx.state.clone())
        .oneshot(
            Request::builder()
                .uri("/v1/access/matrix")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let matrix: MatrixResponse = response_json(response).await;

    assert_eq!(matrix.users.len(), 2);
    assert_eq!(matrix.matrix.len(), 2);
    assert_eq!(matrix.available_permissions.len(), restaurant_catalog().len());
    assert_eq!(matrix.available_roles.len(), 1);
    assert_eq!(matrix.available_roles[0].permission_count, 2);

    let kitchen_row = matrix.matrix.iter().find(|r| r.user == "Jesse").unwrap();
    assert_eq!(
        kitchen_row.permissions,
        ["view_dashboard".to_string(), "manage_kitchen".to_string()]
    );
    assert_eq!(kitchen_row.permission_sources.from_roles, 2);
    assert_eq!(kitchen_row.permission_sources.direct, 0);

    let admin_row = matrix.matrix.iter().find(|r| r.user == "Dana").unwrap();
    assert_eq!(admin_row.permissions, ["edit_menu".to_string()]);
    assert_eq!(admin_row.permission_sources.direct, 1);
}

#[tokio::test]
async fn test_matrix_endpoint_kind_filter_and_bad_kind() {
    let ctx = seeded_context();
    let response = app(ctx.state.clone())
        .oneshot(
            Request::builder()
                .uri("/v1/access/matrix?kind=kitchen")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let matrix: MatrixResponse = response_json(response).await;
    assert_eq!(matrix.users.len(), 1);
    assert_eq!(matrix.users[0].display_name, "Jesse");

    let response = app(ctx.state.clone())
        .oneshot(
            Request::builder()
                .uri("/v1/access/matrix?kind=waiter")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_role_matrix_endpoint() {
    let ctx = seeded_context();
    let response = app(ctx.state.clone())
        .oneshot(
            Request::builder()
                .uri("/v1/access/matrix/roles")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let matrix: RoleMatrixResponse = response_json(response).await;
    assert_eq!(matrix.available_roles.len(), 1);

    let kitchen_row = matrix.matrix.iter().find(|r| r.user == "Jesse").unwrap();
    assert_eq!(kitchen_row.roles, ["kitchen_manager_role".to_string()]);
    let admin_row = matrix.matrix.iter().find(|r| r.user == "Dana").unwrap();
    assert!(admin_row.roles.is_empty());
}

// ===== BULK UPDATE ENDPOINT =====

#[tokio::test]
async fn test_bulk_update_endpoint_partial_failure_report() {
    let ctx = seeded_context();
    let response = app(ctx.state.clone())
        .oneshot(json_request(
            "POST",
            "/v1/access/bulk-update",
            serde_json::json!({
                "operations": [
                    {"user_id": "user1", "action": "add_permission", "target_id": "perm-logs"},
                    {"user_id": "user1", "action": "add_role", "target_id": "role-kitchen"},
                    {"user_id": "user9", "action": "remove_role", "target_id": "role-kitchen"}
                ]
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let report: BulkUpdateResponse = response_json(response).await;

    assert!(!report.success);
    assert_eq!(report.processed, 3);
    assert_eq!(report.successful, 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].user_id, "user9");
    assert!(report.failures[0].reason.contains("no admin profile"));
}

#[tokio::test]
async fn test_bulk_update_endpoint_dedupes_repeated_toggles() {
    let ctx = seeded_context();
    let response = app(ctx.state.clone())
        .oneshot(json_request(
            "POST",
            "/v1/access/bulk-update",
            serde_json::json!({
                "operations": [
                    {"user_id": "user1", "action": "add_permission", "target_id": "perm-logs"},
                    {"user_id": "user1", "action": "remove_permission", "target_id": "perm-logs"}
                ]
            }),
        ))
        .await
        .unwrap();
    let report: BulkUpdateResponse = response_json(response).await;
    assert!(report.success);
    assert_eq!(report.processed, 1);
    assert_eq!(report.successful, 1);

    let effective = ctx
        .state
        .resolution_service
        .effective_permissions("prof-u1")
        .await
        .unwrap();
    assert!(!effective.contains("view_logs"));
}

#[tokio::test]
async fn test_bulk_update_endpoint_unknown_action_is_a_failure_row() {
    let ctx = seeded_context();
    let response = app(ctx.state.clone())
        .oneshot(json_request(
            "POST",
            "/v1/access/bulk-update",
            serde_json::json!({
                "operations": [
                    {"user_id": "user1", "action": "toggle_permission", "target_id": "perm-logs"}
                ]
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let report: BulkUpdateResponse = response_json(response).await;
    assert_eq!(report.processed, 1);
    assert_eq!(report.successful, 0);
    assert!(report.failures[0].reason.contains("unknown action"));
}

#[tokio::test]
async fn test_bulk_update_endpoint_kitchen_kind_targets_kitchen_profile() {
    let ctx = seeded_context();
    let response = app(ctx.state.clone())
        .oneshot(json_request(
            "POST",
            "/v1/access/bulk-update",
            serde_json::json!({
                "profile_kind": "kitchen",
                "operations": [
                    {"user_id": "user2", "action": "add_permission", "target_id": "perm-logs"}
                ]
            }),
        ))
        .await
        .unwrap();
    let report: BulkUpdateResponse = response_json(response).await;
    assert!(report.success);

    let effective = ctx
        .state
        .resolution_service
        .effective_permissions("prof-u2")
        .await
        .unwrap();
    assert!(effective.contains("view_logs"));
}

// ===== AUDIT ENDPOINT =====

#[tokio::test]
async fn test_user_permissions_endpoint_provenance_tags() {
    let ctx = seeded_context();
    let response = app(ctx.state.clone())
        .oneshot(
            Request::builder()
                .uri("/v1/access/users/user2/permissions?kind=kitchen")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let detail: UserPermissionsResponse = response_json(response).await;

    assert_eq!(detail.user_id, "user2");
    assert_eq!(detail.profile_id, "prof-u2");
    assert_eq!(detail.kind, "kitchen");
    assert_eq!(detail.permissions.len(), 2);
    for permission in &detail.permissions {
        assert_eq!(permission.sources, ["role:kitchen_manager_role".to_string()]);
    }
}

#[tokio::test]
async fn test_user_permissions_endpoint_missing_profile() {
    let ctx = seeded_context();
    let response = app(ctx.state.clone())
        .oneshot(
            Request::builder()
                .uri("/v1/access/users/user2/permissions")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    // user2 only has a kitchen profile; the default kind is admin
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
