use crate::application::services::{AccessError, BulkAction, BulkOperation};
use crate::domain::permission::Permission;
use crate::domain::profile::ProfileKind;
use crate::domain::resolution::PermissionSource;
use crate::domain::role::Role;
use crate::interface::app_state::AppState;
use crate::interface::{
    BulkFailureDto, BulkUpdateRequest, BulkUpdateResponse, CreatePermissionRequest,
    CreateProfileRequest, CreateRoleRequest, EffectivePermissionDto, ErrorResponse, MatrixResponse,
    MatrixRowDto, MatrixUserDto, PermissionColumnDto, PermissionResponse, PermissionSourcesDto,
    PermissionsListResponse, ProfileResponse, RoleColumnDto, RoleMatrixResponse, RoleMatrixRowDto,
    RolePermissionRequest, RoleResponse, RolesListResponse, UserPermissionsResponse,
};
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use std::collections::HashMap;
use std::sync::Arc;

fn access_error_response(error: AccessError) -> Response {
    let status = match &error {
        AccessError::Validation(_) => StatusCode::BAD_REQUEST,
        AccessError::DuplicateName { .. } => StatusCode::CONFLICT,
        AccessError::NotFound { .. } => StatusCode::NOT_FOUND,
        AccessError::Conflict { .. } => StatusCode::CONFLICT,
        AccessError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
        .into_response()
}

fn permission_response(permission: Permission) -> PermissionResponse {
    PermissionResponse {
        id: permission.id,
        name: permission.name,
        description: permission.description,
        category: permission.category,
        priority: permission.priority,
        is_active: permission.is_active,
    }
}

fn role_response(role: Role) -> RoleResponse {
    RoleResponse {
        id: role.id,
        name: role.name,
        description: role.description,
        priority: role.priority,
        is_active: role.is_active,
        permissions: role.permissions,
    }
}

fn parse_kind_param(kind: Option<&str>) -> Result<Option<ProfileKind>, Response> {
    match kind {
        None => Ok(None),
        Some(raw) => match ProfileKind::parse(raw) {
            Some(kind) => Ok(Some(kind)),
            None => Err((
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: format!("unknown profile kind: {raw}"),
                }),
            )
                .into_response()),
        },
    }
}

// --- CATALOG HANDLERS ---

#[derive(serde::Deserialize)]
pub struct ListPermissionsParams {
    pub category: Option<String>,
}

#[axum::debug_handler]
#[utoipa::path(
    post,
    path = "/v1/access/permissions",
    request_body = CreatePermissionRequest,
    responses(
        (status = 201, description = "Permission created", body = PermissionResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 409, description = "Name already in use", body = ErrorResponse),
    ),
    tags = ["Catalog"],
    description = "Create a permission in the catalog."
)]
pub async fn create_permission_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreatePermissionRequest>,
) -> impl IntoResponse {
    match state
        .catalog_service
        .create_permission(
            &payload.name,
            &payload.description,
            &payload.category,
            payload.priority,
        )
        .await
    {
        Ok(permission) => {
            (StatusCode::CREATED, Json(permission_response(permission))).into_response()
        }
        Err(error) => access_error_response(error),
    }
}

#[axum::debug_handler]
#[utoipa::path(
    get,
    path = "/v1/access/permissions",
    responses(
        (status = 200, description = "Permissions listed", body = PermissionsListResponse),
    ),
    tags = ["Catalog"],
    description = "List permissions in catalog order; `category` narrows to one active category."
)]
pub async fn list_permissions_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListPermissionsParams>,
) -> impl IntoResponse {
    let result = match params.category.as_deref() {
        Some(category) => {
            state
                .catalog_service
                .list_permissions_by_category(category)
                .await
        }
        None => state.catalog_service.list_permissions().await,
    };
    match result {
        Ok(permissions) => Json(PermissionsListResponse {
            permissions: permissions.into_iter().map(permission_response).collect(),
        })
        .into_response(),
        Err(error) => access_error_response(error),
    }
}

#[axum::debug_handler]
#[utoipa::path(
    get,
    path = "/v1/access/permissions/{permission_id}",
    responses(
        (status = 200, description = "Permission retrieved", body = PermissionResponse),
        (status = 404, description = "Permission not found", body = ErrorResponse),
    ),
    tags = ["Catalog"],
    description = "Get a single permission by id."
)]
pub async fn get_permission_handler(
    State(state): State<Arc<AppState>>,
    Path(permission_id): Path<String>,
) -> impl IntoResponse {
    match state.catalog_service.get_permission(&permission_id).await {
        Ok(permission) => Json(permission_response(permission)).into_response(),
        Err(error) => access_error_response(error),
    }
}

#[axum::debug_handler]
#[utoipa::path(
    delete,
    path = "/v1/access/permissions/{permission_id}",
    responses(
        (status = 204, description = "Permission deactivated"),
        (status = 404, description = "Permission not found", body = ErrorResponse),
    ),
    tags = ["Catalog"],
    description = "Soft-disable a permission. Grant rows are kept; calling twice is not an error."
)]
pub async fn deactivate_permission_handler(
    State(state): State<Arc<AppState>>,
    Path(permission_id): Path<String>,
) -> impl IntoResponse {
    match state
        .catalog_service
        .deactivate_permission(&permission_id)
        .await
    {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => access_error_response(error),
    }
}

#[axum::debug_handler]
#[utoipa::path(
    post,
    path = "/v1/access/roles",
    request_body = CreateRoleRequest,
    responses(
        (status = 201, description = "Role created", body = RoleResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 409, description = "Name already in use", body = ErrorResponse),
    ),
    tags = ["Catalog"],
    description = "Create a role. Roles are flat and start with no permissions."
)]
pub async fn create_role_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateRoleRequest>,
) -> impl IntoResponse {
    match state
        .catalog_service
        .create_role(&payload.name, &payload.description, payload.priority)
        .await
    {
        Ok(role) => (StatusCode::CREATED, Json(role_response(role))).into_response(),
        Err(error) => access_error_response(error),
    }
}

#[axum::debug_handler]
#[utoipa::path(
    get,
    path = "/v1/access/roles",
    responses(
        (status = 200, description = "Roles listed", body = RolesListResponse),
    ),
    tags = ["Catalog"],
    description = "List all roles with their permission ids."
)]
pub async fn list_roles_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.catalog_service.list_roles().await {
        Ok(roles) => Json(RolesListResponse {
            roles: roles.into_iter().map(role_response).collect(),
        })
        .into_response(),
        Err(error) => access_error_response(error),
    }
}

#[axum::debug_handler]
#[utoipa::path(
    get,
    path = "/v1/access/roles/{role_id}",
    responses(
        (status = 200, description = "Role retrieved", body = RoleResponse),
        (status = 404, description = "Role not found", body = ErrorResponse),
    ),
    tags = ["Catalog"],
    description = "Get a single role by id."
)]
pub async fn get_role_handler(
    State(state): State<Arc<AppState>>,
    Path(role_id): Path<String>,
) -> impl IntoResponse {
    match state.catalog_service.get_role(&role_id).await {
        Ok(role) => Json(role_response(role)).into_response(),
        Err(error) => access_error_response(error),
    }
}

#[axum::debug_handler]
#[utoipa::path(
    delete,
    path = "/v1/access/roles/{role_id}",
    responses(
        (status = 204, description = "Role deactivated"),
        (status = 404, description = "Role not found", body = ErrorResponse),
    ),
    tags = ["Catalog"],
    description = "Soft-disable a role. Memberships are kept."
)]
pub async fn deactivate_role_handler(
    State(state): State<Arc<AppState>>,
    Path(role_id): Path<String>,
) -> impl IntoResponse {
    match state.catalog_service.deactivate_role(&role_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => access_error_response(error),
    }
}

#[axum::debug_handler]
#[utoipa::path(
    post,
    path = "/v1/access/roles/assign-permission",
    request_body = RolePermissionRequest,
    responses(
        (status = 204, description = "Permission assigned to role"),
        (status = 404, description = "Role or permission not found", body = ErrorResponse),
    ),
    tags = ["Catalog"],
    description = "Add a permission to a role's bundle."
)]
pub async fn assign_role_permission_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RolePermissionRequest>,
) -> impl IntoResponse {
    match state
        .catalog_service
        .assign_permission_to_role(&payload.role_id, &payload.permission_id)
        .await
    {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => access_error_response(error),
    }
}

#[axum::debug_handler]
#[utoipa::path(
    post,
    path = "/v1/access/roles/remove-permission",
    request_body = RolePermissionRequest,
    responses(
        (status = 204, description = "Permission removed from role"),
        (status = 404, description = "Role not found", body = ErrorResponse),
    ),
    tags = ["Catalog"],
    description = "Remove a permission from a role's bundle."
)]
pub async fn remove_role_permission_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RolePermissionRequest>,
) -> impl IntoResponse {
    match state
        .catalog_service
        .remove_permission_from_role(&payload.role_id, &payload.permission_id)
        .await
    {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => access_error_response(error),
    }
}

// --- PROFILE HANDLERS ---

#[axum::debug_handler]
#[utoipa::path(
    post,
    path = "/v1/access/profiles",
    request_body = CreateProfileRequest,
    responses(
        (status = 201, description = "Profile created", body = ProfileResponse),
        (status = 400, description = "Unknown profile kind", body = ErrorResponse),
        (status = 409, description = "Profile already exists", body = ErrorResponse),
    ),
    tags = ["Profiles"],
    description = "Create an empty profile for a user and kind. Grants start empty and are mutated only through bulk updates."
)]
pub async fn create_profile_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateProfileRequest>,
) -> impl IntoResponse {
    let kind = match ProfileKind::parse(&payload.kind) {
        Some(kind) => kind,
        None => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: format!("unknown profile kind: {}", payload.kind),
                }),
            )
                .into_response();
        }
    };
    match state.profile_repo.find_by_user(&payload.user_id, kind).await {
        Ok(Some(_)) => (
            StatusCode::CONFLICT,
            Json(ErrorResponse {
                error: format!(
                    "user {} already has a {} profile",
                    payload.user_id,
                    kind.as_str()
                ),
            }),
        )
            .into_response(),
        Ok(None) => match state.profile_repo.create_profile(&payload.user_id, kind).await {
            Ok(profile) => (
                StatusCode::CREATED,
                Json(ProfileResponse {
                    id: profile.id,
                    user_id: profile.user_id,
                    kind: profile.kind.as_str().to_string(),
                }),
            )
                .into_response(),
            Err(error) => access_error_response(AccessError::Storage(error)),
        },
        Err(error) => access_error_response(AccessError::Storage(error)),
    }
}

// --- MATRIX HANDLERS ---

#[derive(serde::Deserialize)]
pub struct MatrixParams {
    pub category: Option<String>,
    pub kind: Option<String>,
}

#[axum::debug_handler]
#[utoipa::path(
    get,
    path = "/v1/access/matrix",
    responses(
        (status = 200, description = "Permission matrix built", body = MatrixResponse),
        (status = 400, description = "Unknown profile kind", body = ErrorResponse),
    ),
    tags = ["Matrix"],
    description = "All profiles × all permissions. `category` narrows the columns, `kind` narrows the rows."
)]
pub async fn permission_matrix_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<MatrixParams>,
) -> impl IntoResponse {
    let kind = match parse_kind_param(params.kind.as_deref()) {
        Ok(kind) => kind,
        Err(response) => return response,
    };
    let data = match state
        .matrix_service
        .permission_matrix(params.category.as_deref(), kind)
        .await
    {
        Ok(data) => data,
        Err(error) => return access_error_response(error),
    };

    let display_name = |user_id: &str| {
        data.accounts
            .get(user_id)
            .map(|account| account.display_name.clone())
            .unwrap_or_else(|| user_id.to_string())
    };

    let users = data
        .grid
        .rows
        .iter()
        .map(|row| MatrixUserDto {
            user_id: row.user_id.clone(),
            display_name: display_name(&row.user_id),
            profile_id: row.profile_id.clone(),
        })
        .collect();

    let available_permissions = data
        .grid
        .columns
        .iter()
        .map(|column| PermissionColumnDto {
            id: column.id.clone(),
            name: column.name.clone(),
            category: column.category.clone(),
            priority: column.priority,
        })
        .collect();

    let available_roles = data
        .roles
        .iter()
        .map(|role| RoleColumnDto {
            id: role.id.clone(),
            name: role.name.clone(),
            permission_count: role.permissions.len(),
        })
        .collect();

    let matrix = data
        .grid
        .rows
        .iter()
        .map(|row| {
            let mut permissions = vec![];
            let mut sources = PermissionSourcesDto::default();
            for (cell, column) in row.cells.iter().zip(&data.grid.columns) {
                if !cell.has {
                    continue;
                }
                permissions.push(column.name.clone());
                if cell.sources.contains(&PermissionSource::Direct) {
                    sources.direct += 1;
                }
                if cell.sources.iter().any(|s| matches!(s, PermissionSource::Role(_))) {
                    sources.from_roles += 1;
                }
                if cell.sources.contains(&PermissionSource::Legacy) {
                    sources.legacy += 1;
                }
            }
            MatrixRowDto {
                user: display_name(&row.user_id),
                permissions,
                permission_sources: sources,
            }
        })
        .collect();

    Json(MatrixResponse {
        users,
        available_permissions,
        available_roles,
        matrix,
    })
    .into_response()
}

#[derive(serde::Deserialize)]
pub struct RoleMatrixParams {
    pub kind: Option<String>,
}

#[axum::debug_handler]
#[utoipa::path(
    get,
    path = "/v1/access/matrix/roles",
    responses(
        (status = 200, description = "Role matrix built", body = RoleMatrixResponse),
        (status = 400, description = "Unknown profile kind", body = ErrorResponse),
    ),
    tags = ["Matrix"],
    description = "All profiles × all roles; cells are direct membership, no resolution."
)]
pub async fn role_matrix_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RoleMatrixParams>,
) -> impl IntoResponse {
    let kind = match parse_kind_param(params.kind.as_deref()) {
        Ok(kind) => kind,
        Err(response) => return response,
    };
    let data = match state.matrix_service.role_matrix(kind).await {
        Ok(data) => data,
        Err(error) => return access_error_response(error),
    };

    let display_name = |user_id: &str| {
        data.accounts
            .get(user_id)
            .map(|account| account.display_name.clone())
            .unwrap_or_else(|| user_id.to_string())
    };

    let users = data
        .grid
        .rows
        .iter()
        .map(|row| MatrixUserDto {
            user_id: row.user_id.clone(),
            display_name: display_name(&row.user_id),
            profile_id: row.profile_id.clone(),
        })
        .collect();

    let available_roles = data
        .grid
        .columns
        .iter()
        .map(|role| RoleColumnDto {
            id: role.id.clone(),
            name: role.name.clone(),
            permission_count: role.permissions.len(),
        })
        .collect();

    let matrix = data
        .grid
        .rows
        .iter()
        .map(|row| RoleMatrixRowDto {
            user: display_name(&row.user_id),
            roles: row
                .cells
                .iter()
                .zip(&data.grid.columns)
                .filter(|(held, _)| **held)
                .map(|(_, role)| role.name.clone())
                .collect(),
        })
        .collect();

    Json(RoleMatrixResponse {
        users,
        available_roles,
        matrix,
    })
    .into_response()
}

// --- BULK UPDATE HANDLER ---

#[axum::debug_handler]
#[utoipa::path(
    post,
    path = "/v1/access/bulk-update",
    request_body = BulkUpdateRequest,
    responses(
        (status = 200, description = "Batch processed; inspect failures for partial outcomes", body = BulkUpdateResponse),
        (status = 400, description = "Unknown profile kind", body = ErrorResponse),
    ),
    tags = ["Bulk"],
    description = "Apply batched grant/revoke operations. Repeated toggles of one cell collapse to the last; each surviving operation applies independently and failures are reported, never thrown."
)]
pub async fn bulk_update_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<BulkUpdateRequest>,
) -> impl IntoResponse {
    let kind = match payload.profile_kind.as_deref() {
        None => ProfileKind::Admin,
        Some(raw) => match ProfileKind::parse(raw) {
            Some(kind) => kind,
            None => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(ErrorResponse {
                        error: format!("unknown profile kind: {raw}"),
                    }),
                )
                    .into_response();
            }
        },
    };

    let mut pre_failures: Vec<BulkFailureDto> = vec![];
    let mut operations: Vec<BulkOperation> = vec![];
    let mut user_by_profile: HashMap<String, String> = HashMap::new();

    for dto in payload.operations {
        let Some(action) = BulkAction::parse(&dto.action) else {
            pre_failures.push(BulkFailureDto {
                reason: format!("unknown action: {}", dto.action),
                user_id: dto.user_id,
                action: dto.action,
                target_id: dto.target_id,
            });
            continue;
        };
        match state.profile_repo.find_by_user(&dto.user_id, kind).await {
            Ok(Some(profile)) => {
                user_by_profile.insert(profile.id.clone(), dto.user_id);
                operations.push(BulkOperation {
                    profile_id: profile.id,
                    action,
                    target_id: dto.target_id,
                });
            }
            Ok(None) => pre_failures.push(BulkFailureDto {
                reason: format!("no {} profile for user {}", kind.as_str(), dto.user_id),
                user_id: dto.user_id,
                action: dto.action,
                target_id: dto.target_id,
            }),
            Err(error) => pre_failures.push(BulkFailureDto {
                reason: format!("storage error: {error}"),
                user_id: dto.user_id,
                action: dto.action,
                target_id: dto.target_id,
            }),
        }
    }

    let report = state.bulk_service.apply(operations).await;

    let processed = report.processed + pre_failures.len();
    let successful = report.successful;
    let mut failures = pre_failures;
    failures.extend(report.failures.into_iter().map(|failure| BulkFailureDto {
        user_id: user_by_profile
            .get(&failure.operation.profile_id)
            .cloned()
            .unwrap_or_else(|| failure.operation.profile_id.clone()),
        action: failure.operation.action.as_str().to_string(),
        target_id: failure.operation.target_id,
        reason: failure.reason,
    }));

    Json(BulkUpdateResponse {
        success: failures.is_empty(),
        processed,
        successful,
        failures,
    })
    .into_response()
}

// --- AUDIT HANDLER ---

#[derive(serde::Deserialize)]
pub struct UserPermissionsParams {
    pub kind: Option<String>,
}

#[axum::debug_handler]
#[utoipa::path(
    get,
    path = "/v1/access/users/{user_id}/permissions",
    responses(
        (status = 200, description = "Effective permissions with provenance", body = UserPermissionsResponse),
        (status = 404, description = "No profile for that user and kind", body = ErrorResponse),
    ),
    tags = ["Audit"],
    description = "Why does this user have X: the resolved permission set with provenance tags. `kind` defaults to admin."
)]
pub async fn user_permissions_handler(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Query(params): Query<UserPermissionsParams>,
) -> impl IntoResponse {
    let kind = match params.kind.as_deref() {
        None => ProfileKind::Admin,
        Some(raw) => match ProfileKind::parse(raw) {
            Some(kind) => kind,
            None => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(ErrorResponse {
                        error: format!("unknown profile kind: {raw}"),
                    }),
                )
                    .into_response();
            }
        },
    };

    match state
        .resolution_service
        .effective_permissions_for_user(&user_id, kind)
        .await
    {
        Ok((profile, effective)) => {
            let permissions = effective
                .names()
                .into_iter()
                .map(|name| EffectivePermissionDto {
                    name: name.to_string(),
                    sources: effective
                        .sources(name)
                        .map(|sources| sources.iter().map(|s| s.tag()).collect())
                        .unwrap_or_default(),
                })
                .collect();
            Json(UserPermissionsResponse {
                user_id,
                profile_id: profile.id,
                kind: kind.as_str().to_string(),
                permissions,
            })
            .into_response()
        }
        Err(error) => access_error_response(error),
    }
}
