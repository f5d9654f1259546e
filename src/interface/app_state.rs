use crate::application::services::{
    BulkUpdateService, CatalogService, MatrixService, ResolutionService,
};
use crate::domain::legacy::LegacyRoleMap;
use crate::infrastructure::{
    AccountRepository, PermissionRepository, ProfileRepository, RoleRepository,
};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub permission_repo: Arc<dyn PermissionRepository>,
    pub role_repo: Arc<dyn RoleRepository>,
    pub profile_repo: Arc<dyn ProfileRepository>,
    pub account_repo: Arc<dyn AccountRepository>,
    pub catalog_service: Arc<CatalogService>,
    pub resolution_service: Arc<ResolutionService>,
    pub matrix_service: Arc<MatrixService>,
    pub bulk_service: Arc<BulkUpdateService>,
    pub legacy_map: Arc<LegacyRoleMap>,
}
