use permission_service::interface::{
    BulkFailureDto,
    BulkOperationDto,
    BulkUpdateRequest,
    BulkUpdateResponse,
    CreatePermissionRequest,
    CreateProfileRequest,
    CreateRoleRequest,
    EffectivePermissionDto,
    ErrorResponse,
    // DTOs
    MatrixResponse,
    MatrixRowDto,
    MatrixUserDto,
    PermissionColumnDto,
    PermissionResponse,
    PermissionSourcesDto,
    PermissionsListResponse,
    ProfileResponse,
    RoleColumnDto,
    RoleMatrixResponse,
    RoleMatrixRowDto,
    RolePermissionRequest,
    RoleResponse,
    RolesListResponse,
    UserPermissionsResponse,
    assign_role_permission_handler,
    bulk_update_handler,
    create_permission_handler,
    create_profile_handler,
    create_role_handler,
    deactivate_permission_handler,
    deactivate_role_handler,
    get_permission_handler,
    get_role_handler,
    list_permissions_handler,
    list_roles_handler,
    permission_matrix_handler,
    remove_role_permission_handler,
    role_matrix_handler,
    user_permissions_handler,
};
use permission_service::{AppConfig, AppStateBuilder};

use axum::{Router, routing::post};
use dotenvy::dotenv;
use sqlx::PgPool;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(utoipa::OpenApi)]
#[openapi(
    paths(
        permission_service::interface::http_handlers::create_permission_handler,
        permission_service::interface::http_handlers::list_permissions_handler,
        permission_service::interface::http_handlers::get_permission_handler,
        permission_service::interface::http_handlers::deactivate_permission_handler,
        permission_service::interface::http_handlers::create_role_handler,
        permission_service::interface::http_handlers::list_roles_handler,
        permission_service::interface::http_handlers::get_role_handler,
        permission_service::interface::http_handlers::deactivate_role_handler,
        permission_service::interface::http_handlers::assign_role_permission_handler,
        permission_service::interface::http_handlers::remove_role_permission_handler,
        permission_service::interface::http_handlers::create_profile_handler,
        permission_service::interface::http_handlers::permission_matrix_handler,
        permission_service::interface::http_handlers::role_matrix_handler,
        permission_service::interface::http_handlers::bulk_update_handler,
        permission_service::interface::http_handlers::user_permissions_handler,
    ),
    components(schemas(
        CreatePermissionRequest, PermissionResponse, PermissionsListResponse,
        CreateRoleRequest, RoleResponse, RolesListResponse, RolePermissionRequest,
        CreateProfileRequest, ProfileResponse,
        MatrixResponse, MatrixRowDto, MatrixUserDto, PermissionColumnDto, RoleColumnDto,
        PermissionSourcesDto, RoleMatrixResponse, RoleMatrixRowDto,
        BulkUpdateRequest, BulkOperationDto, BulkUpdateResponse, BulkFailureDto,
        UserPermissionsResponse, EffectivePermissionDto, ErrorResponse
    )),
    tags(
        (name = "Catalog", description = "Permission and role catalog administration"),
        (name = "Profiles", description = "Staff profile lifecycle"),
        (name = "Matrix", description = "Permission and role review grids"),
        (name = "Bulk", description = "Batched grant/revoke operations"),
        (name = "Audit", description = "Per-user effective permission views")
    )
)]
pub struct ApiDoc;

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Parse environment variables
    let config = AppConfig::from_env().expect("Failed to parse environment variables");

    // Connect to database
    let pool = PgPool::connect(&config.database_url)
        .await
        .expect("Failed to connect to DB");

    // Setup application state
    let app_state = AppStateBuilder::new()
        .with_pool(pool)
        .with_config(config.clone())
        .build()
        .await
        .expect("Failed to setup application");

    let http_addr = config.http_address();
    let openapi = ApiDoc::openapi();

    let v1_routes = Router::new()
        .route("/access/permissions", post(create_permission_handler))
        .route(
            "/access/permissions",
            axum::routing::get(list_permissions_handler),
        )
        .route(
            "/access/permissions/{permission_id}",
            axum::routing::get(get_permission_handler),
        )
        .route(
            "/access/permissions/{permission_id}",
            axum::routing::delete(deactivate_permission_handler),
        )
        .route("/access/roles", post(create_role_handler))
        .route("/access/roles", axum::routing::get(list_roles_handler))
        .route("/access/roles/{role_id}", axum::routing::get(get_role_handler))
        .route(
            "/access/roles/{role_id}",
            axum::routing::delete(deactivate_role_handler),
        )
        .route(
            "/access/roles/assign-permission",
            post(assign_role_permission_handler),
        )
        .route(
            "/access/roles/remove-permission",
            post(remove_role_permission_handler),
        )
        .route("/access/profiles", post(create_profile_handler))
        .route("/access/matrix", axum::routing::get(permission_matrix_handler))
        .route("/access/matrix/roles", axum::routing::get(role_matrix_handler))
        .route("/access/bulk-update", post(bulk_update_handler))
        .route(
            "/access/users/{user_id}/permissions",
            axum::routing::get(user_permissions_handler),
        );

    let app = Router::new()
        .nest("/v1", v1_routes)
        .merge(SwaggerUi::new("/swagger").url("/openapi.json", openapi.clone()))
        .with_state(app_state);

    let listener = TcpListener::bind(&http_addr).await.expect("Failed to bind");
    println!("HTTP server running at http://{http_addr}");
    axum::serve(listener, app).await.unwrap();
}
