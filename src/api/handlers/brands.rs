//! Product brand handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::api::doc::BRAND_TAG;
use crate::api::dto::{BrandDto, ErrorResponse, NameRequest};
use crate::api::middleware::AuthUser;
use crate::error::AppResult;
use crate::models::{Permission, PermissionAction, PermissionModule};
use crate::state::AppState;
use crate::utils::validate::ValidatedJson;

const fn brands(action: PermissionAction) -> Permission {
    Permission::new(PermissionModule::Brands, action)
}

pub fn brand_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(list_brands, create_brand))
        .routes(routes!(get_brand, update_brand, delete_brand))
}

#[utoipa::path(
    get,
    path = "/",
    tag = BRAND_TAG,
    responses((status = 200, description = "All brands", body = Vec<BrandDto>))
)]
async fn list_brands(State(state): State<AppState>) -> AppResult<Json<Vec<BrandDto>>> {
    let brands = state.services.catalog.list_brands().await?;
    Ok(Json(brands.into_iter().map(BrandDto::from).collect()))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = BRAND_TAG,
    params(("id" = i32, Path, description = "Brand ID")),
    responses(
        (status = 200, description = "Brand found", body = BrandDto),
        (status = 404, description = "Unknown brand", body = ErrorResponse)
    )
)]
async fn get_brand(State(state): State<AppState>, Path(id): Path<i32>) -> AppResult<Json<BrandDto>> {
    let brand = state.services.catalog.get_brand(id).await?;
    Ok(Json(brand.into()))
}

#[utoipa::path(
    post,
    path = "/",
    tag = BRAND_TAG,
    security(("bearerAuth" = [])),
    request_body = NameRequest,
    responses(
        (status = 201, description = "Brand created", body = BrandDto),
        (status = 409, description = "Brand name taken", body = ErrorResponse)
    )
)]
async fn create_brand(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(payload): ValidatedJson<NameRequest>,
) -> AppResult<(StatusCode, Json<BrandDto>)> {
    auth.require(brands(PermissionAction::Create))?;
    let brand = state.services.catalog.create_brand(&payload.name).await?;
    Ok((StatusCode::CREATED, Json(brand.into())))
}

#[utoipa::path(
    put,
    path = "/{id}",
    tag = BRAND_TAG,
    security(("bearerAuth" = [])),
    params(("id" = i32, Path, description = "Brand ID")),
    request_body = NameRequest,
    responses(
        (status = 200, description = "Brand renamed", body = BrandDto),
        (status = 404, description = "Unknown brand", body = ErrorResponse),
        (status = 409, description = "Brand name taken", body = ErrorResponse)
    )
)]
async fn update_brand(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i32>,
    ValidatedJson(payload): ValidatedJson<NameRequest>,
) -> AppResult<Json<BrandDto>> {
    auth.require(brands(PermissionAction::Update))?;
    let brand = state.services.catalog.update_brand(id, &payload.name).await?;
    Ok(Json(brand.into()))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = BRAND_TAG,
    security(("bearerAuth" = [])),
    params(("id" = i32, Path, description = "Brand ID")),
    responses(
        (status = 204, description = "Brand deleted"),
        (status = 400, description = "Brand still used by products", body = ErrorResponse),
        (status = 404, description = "Unknown brand", body = ErrorResponse)
    )
)]
async fn delete_brand(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    auth.require(brands(PermissionAction::Delete))?;
    state.services.catalog.delete_brand(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
