// Interface layer: HTTP APIs, handlers, DTOs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct CreatePermissionRequest {
    pub name: String,
    pub description: String,
    pub category: String,
    #[serde(default)]
    pub priority: i32,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct PermissionResponse {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: String,
    pub priority: i32,
    pub is_active: bool,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct PermissionsListResponse {
    pub permissions: Vec<PermissionResponse>,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateRoleRequest {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub priority: i32,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct RoleResponse {
    pub id: String,
    pub name: String,
    pub description: String,
    pub priority: i32,
    pub is_active: bool,
    pub permissions: Vec<String>, // permission IDs
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct RolesListResponse {
    pub roles: Vec<RoleResponse>,
}

#[derive(Deserialize, ToSchema)]
pub struct RolePermissionRequest {
    pub role_id: String,
    pub permission_id: String,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateProfileRequest {
    pub user_id: String,
    pub kind: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct ProfileResponse {
    pub id: String,
    pub user_id: String,
    pub kind: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct MatrixUserDto {
    pub user_id: String,
    pub display_name: String,
    pub profile_id: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct PermissionColumnDto {
    pub id: String,
    pub name: String,
    pub category: String,
    pub priority: i32,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct RoleColumnDto {
    pub id: String,
    pub name: String,
    pub permission_count: usize,
}

#[derive(Serialize, Deserialize, ToSchema, Default)]
pub struct PermissionSourcesDto {
    pub direct: usize,
    pub from_roles: usize,
    pub legacy: usize,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct MatrixRowDto {
    pub user: String,
    pub permissions: Vec<String>,
    pub permission_sources: PermissionSourcesDto,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct MatrixResponse {
    pub users: Vec<MatrixUserDto>,
    pub available_permissions: Vec<PermissionColumnDto>,
    pub available_roles: Vec<RoleColumnDto>,
    pub matrix: Vec<MatrixRowDto>,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct RoleMatrixRowDto {
    pub user: String,
    pub roles: Vec<String>,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct RoleMatrixResponse {
    pub users: Vec<MatrixUserDto>,
    pub available_roles: Vec<RoleColumnDto>,
    pub matrix: Vec<RoleMatrixRowDto>,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct BulkOperationDto {
    pub user_id: String,
    pub action: String,
    pub target_id: String,
}

#[derive(Deserialize, ToSchema)]
pub struct BulkUpdateRequest {
    pub operations: Vec<BulkOperationDto>,
    /// Which profile kind the operations target; defaults to `admin`.
    pub profile_kind: Option<String>,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct BulkFailureDto {
    pub user_id: String,
    pub action: String,
    pub target_id: String,
    pub reason: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct BulkUpdateResponse {
    pub success: bool,
    pub processed: usize,
    pub successful: usize,
    pub failures: Vec<BulkFailureDto>,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct EffectivePermissionDto {
    pub name: String,
    /// Provenance tags: `direct`, `role:<name>`, `legacy`.
    pub sources: Vec<String>,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct UserPermissionsResponse {
    pub user_id: String,
    pub profile_id: String,
    pub kind: String,
    pub permissions: Vec<EffectivePermissionDto>,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

pub mod app_state;
pub mod http_handlers;

pub use app_state::AppState;
pub use http_handlers::*;
