//! Product catalogue and review handlers.
//!
//! Create and update take `multipart/form-data` so the image travels with
//! the product fields.

use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::api::doc::PRODUCT_TAG;
use crate::api::dto::{
    CreateReviewRequest, ErrorResponse, PagedResponse, ProductDto, ProductForm, ProductListQuery,
    ReviewDto,
};
use crate::api::middleware::AuthUser;
use crate::error::AppResult;
use crate::models::{Permission, PermissionAction, PermissionModule};
use crate::state::AppState;
use crate::utils::validate::{ValidatedJson, ValidatedQuery};

const fn products(action: PermissionAction) -> Permission {
    Permission::new(PermissionModule::Products, action)
}

pub fn product_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(list_products, create_product))
        .routes(routes!(get_product, update_product, delete_product))
        .routes(routes!(list_reviews, add_review))
}

#[utoipa::path(
    get,
    path = "/",
    tag = PRODUCT_TAG,
    params(ProductListQuery),
    responses(
        (status = 200, description = "One page of products", body = PagedResponse<ProductDto>),
        (status = 400, description = "Invalid paging or filter values", body = ErrorResponse)
    )
)]
async fn list_products(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<ProductListQuery>,
) -> AppResult<Json<PagedResponse<ProductDto>>> {
    let products = &state.services.products;
    let (rows, count) = products.list_products(&query.to_query()).await?;
    let data = rows
        .into_iter()
        .map(|row| ProductDto::new(row, products.files()))
        .collect();
    Ok(Json(PagedResponse::new(data, &query.pagination(), count)))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = PRODUCT_TAG,
    params(("id" = i32, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product found", body = ProductDto),
        (status = 404, description = "Unknown product", body = ErrorResponse)
    )
)]
async fn get_product(State(state): State<AppState>, Path(id): Path<i32>) -> AppResult<Json<ProductDto>> {
    let products = &state.services.products;
    let row = products.get_product(id).await?;
    Ok(Json(ProductDto::new(row, products.files())))
}

#[utoipa::path(
    post,
    path = "/",
    tag = PRODUCT_TAG,
    security(("bearerAuth" = [])),
    request_body(content = ProductForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Product created", body = ProductDto),
        (status = 400, description = "Invalid product data or image", body = ErrorResponse),
        (status = 404, description = "Unknown brand or type", body = ErrorResponse)
    )
)]
async fn create_product(
    State(state): State<AppState>,
    auth: AuthUser,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<ProductDto>)> {
    auth.require(products(PermissionAction::Create))?;
    let (input, image, _) = ProductForm::from_multipart(multipart).await?.into_parts()?;

    let products = &state.services.products;
    let row = products.create_product(input, image).await?;
    Ok((StatusCode::CREATED, Json(ProductDto::new(row, products.files()))))
}

/// A new image replaces the stored one; `RemoveImage` clears it when no
/// image is sent.
#[utoipa::path(
    put,
    path = "/{id}",
    tag = PRODUCT_TAG,
    security(("bearerAuth" = [])),
    params(("id" = i32, Path, description = "Product ID")),
    request_body(content = ProductForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Product updated", body = ProductDto),
        (status = 400, description = "Invalid product data or image", body = ErrorResponse),
        (status = 404, description = "Unknown product, brand or type", body = ErrorResponse)
    )
)]
async fn update_product(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i32>,
    multipart: Multipart,
) -> AppResult<Json<ProductDto>> {
    auth.require(products(PermissionAction::Update))?;
    let (input, image, remove_image) = ProductForm::from_multipart(multipart).await?.into_parts()?;

    let products = &state.services.products;
    let row = products.update_product(id, input, image, remove_image).await?;
    Ok(Json(ProductDto::new(row, products.files())))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = PRODUCT_TAG,
    security(("bearerAuth" = [])),
    params(("id" = i32, Path, description = "Product ID")),
    responses(
        (status = 204, description = "Product and its image deleted"),
        (status = 404, description = "Unknown product", body = ErrorResponse)
    )
)]
async fn delete_product(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    auth.require(products(PermissionAction::Delete))?;
    state.services.products.delete_product(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/{id}/reviews",
    tag = PRODUCT_TAG,
    params(("id" = i32, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Reviews, newest first", body = Vec<ReviewDto>),
        (status = 404, description = "Unknown product", body = ErrorResponse)
    )
)]
async fn list_reviews(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<Vec<ReviewDto>>> {
    let reviews = state.services.products.list_reviews(id).await?;
    Ok(Json(
        reviews
            .into_iter()
            .map(|(review, user_name)| ReviewDto::new(review, user_name))
            .collect(),
    ))
}

/// One review per user and product.
#[utoipa::path(
    post,
    path = "/{id}/reviews",
    tag = PRODUCT_TAG,
    security(("bearerAuth" = [])),
    params(("id" = i32, Path, description = "Product ID")),
    request_body = CreateReviewRequest,
    responses(
        (status = 201, description = "Review added", body = ReviewDto),
        (status = 404, description = "Unknown product", body = ErrorResponse),
        (status = 409, description = "Already reviewed", body = ErrorResponse)
    )
)]
async fn add_review(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i32>,
    ValidatedJson(payload): ValidatedJson<CreateReviewRequest>,
) -> AppResult<(StatusCode, Json<ReviewDto>)> {
    let review = state
        .services
        .products
        .add_review(id, auth.user_id, payload.rating, payload.comment)
        .await?;
    Ok((StatusCode::CREATED, Json(ReviewDto::new(review, auth.username))))
}
