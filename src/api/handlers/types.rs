//! Product type handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::api::doc::TYPE_TAG;
use crate::api::dto::{TypeDto, ErrorResponse, NameRequest};
use crate::api::middleware::AuthUser;
use crate::error::AppResult;
use crate::models::{Permission, PermissionAction, PermissionModule};
use crate::state::AppState;
use crate::utils::validate::ValidatedJson;

const fn types(action: PermissionAction) -> Permission {
    Permission::new(PermissionModule::Types, action)
}

pub fn type_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(list_types, create_type))
        .routes(routes!(get_type, update_type, delete_type))
}

#[utoipa::path(
    get,
    path = "/",
    tag = TYPE_TAG,
    responses((status = 200, description = "All product types", body = Vec<TypeDto>))
)]
async fn list_types(State(state): State<AppState>) -> AppResult<Json<Vec<TypeDto>>> {
    let types = state.services.catalog.list_types().await?;
    Ok(Json(types.into_iter().map(TypeDto::from).collect()))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = TYPE_TAG,
    params(("id" = i32, Path, description = "Type ID")),
    responses(
        (status = 200, description = "Type found", body = TypeDto),
        (status = 404, description = "Unknown type", body = ErrorResponse)
    )
)]
async fn get_type(State(state): State<AppState>, Path(id): Path<i32>) -> AppResult<Json<TypeDto>> {
    let product_type = state.services.catalog.get_type(id).await?;
    Ok(Json(product_type.into()))
}

#[utoipa::path(
    post,
    path = "/",
    tag = TYPE_TAG,
    security(("bearerAuth" = [])),
    request_body = NameRequest,
    responses(
        (status = 201, description = "Type created", body = TypeDto),
        (status = 409, description = "Type name taken", body = ErrorResponse)
    )
)]
async fn create_type(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(payload): ValidatedJson<NameRequest>,
) -> AppResult<(StatusCode, Json<TypeDto>)> {
    auth.require(types(PermissionAction::Create))?;
    let product_type = state.services.catalog.create_type(&payload.name).await?;
    Ok((StatusCode::CREATED, Json(product_type.into())))
}

#[utoipa::path(
    put,
    path = "/{id}",
    tag = TYPE_TAG,
    security(("bearerAuth" = [])),
    params(("id" = i32, Path, description = "Type ID")),
    request_body = NameRequest,
    responses(
        (status = 200, description = "Type renamed", body = TypeDto),
        (status = 404, description = "Unknown type", body = ErrorResponse),
        (status = 409, description = "Type name taken", body = ErrorResponse)
    )
)]
async fn update_type(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i32>,
    ValidatedJson(payload): ValidatedJson<NameRequest>,
) -> AppResult<Json<TypeDto>> {
    auth.require(types(PermissionAction::Update))?;
    let product_type = state.services.catalog.update_type(id, &payload.name).await?;
    Ok(Json(product_type.into()))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = TYPE_TAG,
    security(("bearerAuth" = [])),
    params(("id" = i32, Path, description = "Type ID")),
    responses(
        (status = 204, description = "Type deleted"),
        (status = 400, description = "Type still used by products", body = ErrorResponse),
        (status = 404, description = "Unknown type", body = ErrorResponse)
    )
)]
async fn delete_type(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    auth.require(types(PermissionAction::Delete))?;
    state.services.catalog.delete_type(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
