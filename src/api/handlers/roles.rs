//! Role administration and the role/permission matrix.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;
use uuid::Uuid;

use crate::api::doc::ROLE_TAG;
use crate::api::dto::{
    CreateRoleRequest, ErrorResponse, MessageResponse, RoleDto, RolePermissionsDto,
    UpdatePermissionsRequest, UpdateUserRolesRequest, UserRolesDto,
};
use crate::api::middleware::AuthUser;
use crate::error::AppResult;
use crate::models::{Permission, PermissionAction, PermissionModule};
use crate::state::AppState;
use crate::utils::validate::ValidatedJson;

const fn roles(action: PermissionAction) -> Permission {
    Permission::new(PermissionModule::Roles, action)
}

pub fn role_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(list_roles, create_role))
        .routes(routes!(get_role, delete_role))
        .routes(routes!(get_user_roles))
        .routes(routes!(update_user_roles))
        .routes(routes!(get_role_permissions))
        .routes(routes!(update_role_permissions))
}

#[utoipa::path(
    get,
    path = "/",
    tag = ROLE_TAG,
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Roles with their user counts", body = Vec<RoleDto>),
        (status = 403, description = "Missing Roles.View permission", body = ErrorResponse)
    )
)]
async fn list_roles(State(state): State<AppState>, auth: AuthUser) -> AppResult<Json<Vec<RoleDto>>> {
    auth.require(roles(PermissionAction::View))?;
    let roles = state.services.roles.list_roles().await?;
    Ok(Json(
        roles
            .into_iter()
            .map(|(role, count)| RoleDto::with_count(role, count))
            .collect(),
    ))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = ROLE_TAG,
    security(("bearerAuth" = [])),
    params(("id" = Uuid, Path, description = "Role ID")),
    responses(
        (status = 200, description = "Role found", body = RoleDto),
        (status = 404, description = "Unknown role", body = ErrorResponse)
    )
)]
async fn get_role(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<RoleDto>> {
    auth.require(roles(PermissionAction::View))?;
    let role = state.services.roles.get_role(id).await?;
    Ok(Json(role.into()))
}

#[utoipa::path(
    post,
    path = "/",
    tag = ROLE_TAG,
    security(("bearerAuth" = [])),
    request_body = CreateRoleRequest,
    responses(
        (status = 201, description = "Role created", body = RoleDto),
        (status = 409, description = "Role name taken", body = ErrorResponse)
    )
)]
async fn create_role(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(payload): ValidatedJson<CreateRoleRequest>,
) -> AppResult<(StatusCode, Json<RoleDto>)> {
    auth.require(roles(PermissionAction::Create))?;
    let role = state.services.roles.create_role(&payload.name).await?;
    Ok((StatusCode::CREATED, Json(role.into())))
}

/// Built-in roles cannot be deleted.
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = ROLE_TAG,
    security(("bearerAuth" = [])),
    params(("id" = Uuid, Path, description = "Role ID")),
    responses(
        (status = 200, description = "Role deleted", body = MessageResponse),
        (status = 400, description = "Built-in role", body = ErrorResponse),
        (status = 404, description = "Unknown role", body = ErrorResponse)
    )
)]
async fn delete_role(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    auth.require(roles(PermissionAction::Delete))?;
    state.services.roles.delete_role(id).await?;
    Ok(Json(MessageResponse::new("Role deleted successfully")))
}

#[utoipa::path(
    get,
    path = "/manage-user-roles/{user_id}",
    tag = ROLE_TAG,
    security(("bearerAuth" = [])),
    params(("user_id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "Every role and whether the user holds it", body = UserRolesDto),
        (status = 404, description = "Unknown user", body = ErrorResponse)
    )
)]
async fn get_user_roles(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<UserRolesDto>> {
    auth.require(roles(PermissionAction::Update))?;
    let assignments = state.services.roles.user_roles(user_id).await?;
    Ok(Json(assignments.into()))
}

#[utoipa::path(
    put,
    path = "/update-role",
    tag = ROLE_TAG,
    security(("bearerAuth" = [])),
    request_body = UpdateUserRolesRequest,
    responses(
        (status = 200, description = "User roles replaced", body = MessageResponse),
        (status = 404, description = "Unknown user or role", body = ErrorResponse)
    )
)]
async fn update_user_roles(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(payload): ValidatedJson<UpdateUserRolesRequest>,
) -> AppResult<Json<MessageResponse>> {
    auth.require(roles(PermissionAction::Update))?;
    state
        .services
        .roles
        .update_user_roles(payload.user_id, payload.selected_role_ids())
        .await?;
    Ok(Json(MessageResponse::new("User roles updated successfully")))
}

#[utoipa::path(
    get,
    path = "/manage-permissions/{role_id}",
    tag = ROLE_TAG,
    security(("bearerAuth" = [])),
    params(("role_id" = Uuid, Path, description = "Role ID")),
    responses(
        (status = 200, description = "Permission matrix for the role", body = RolePermissionsDto),
        (status = 404, description = "Unknown role", body = ErrorResponse)
    )
)]
async fn get_role_permissions(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(role_id): Path<Uuid>,
) -> AppResult<Json<RolePermissionsDto>> {
    auth.require(roles(PermissionAction::Update))?;
    let (role, matrix) = state.services.roles.role_permissions(role_id).await?;
    Ok(Json(RolePermissionsDto::new(role, matrix)))
}

/// Replaces the role's permissions with the selected entries.
#[utoipa::path(
    put,
    path = "/update-permissions/{role_id}",
    tag = ROLE_TAG,
    security(("bearerAuth" = [])),
    params(("role_id" = Uuid, Path, description = "Role ID")),
    request_body = UpdatePermissionsRequest,
    responses(
        (status = 200, description = "Permissions replaced", body = MessageResponse),
        (status = 400, description = "Unknown permission name", body = ErrorResponse),
        (status = 404, description = "Unknown role", body = ErrorResponse)
    )
)]
async fn update_role_permissions(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(role_id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdatePermissionsRequest>,
) -> AppResult<Json<MessageResponse>> {
    auth.require(roles(PermissionAction::Update))?;
    state
        .services
        .roles
        .update_role_permissions(role_id, &payload.selected_names())
        .await?;
    Ok(Json(MessageResponse::new("Permissions updated successfully")))
}
