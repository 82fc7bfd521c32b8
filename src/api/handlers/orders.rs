//! Checkout, order history and order administration.

use axum::{
    Json,
    extract::{Path, State},
};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::api::doc::ORDER_TAG;
use crate::api::dto::{
    AllOrdersDto, CreateOrderRequest, DeliveryMethodDto, ErrorResponse, OrderDto, OrderListQuery,
    PagedResponse, UpdateOrderStatusRequest,
};
use crate::api::middleware::AuthUser;
use crate::error::AppResult;
use crate::models::{Permission, PermissionAction, PermissionModule};
use crate::state::AppState;
use crate::utils::validate::{ValidatedJson, ValidatedQuery};

const fn orders(action: PermissionAction) -> Permission {
    Permission::new(PermissionModule::Orders, action)
}

pub fn order_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(delivery_methods))
        .routes(routes!(list_my_orders, create_order))
        .routes(routes!(list_all_orders))
        .routes(routes!(get_order))
        .routes(routes!(cancel_order))
        .routes(routes!(update_order_status))
}

#[utoipa::path(
    get,
    path = "/deliveryMethods",
    tag = ORDER_TAG,
    responses((status = 200, description = "Delivery methods, cheapest first", body = Vec<DeliveryMethodDto>))
)]
async fn delivery_methods(State(state): State<AppState>) -> AppResult<Json<Vec<DeliveryMethodDto>>> {
    let methods = state.services.orders.delivery_methods().await?;
    Ok(Json(methods.into_iter().map(DeliveryMethodDto::from).collect()))
}

/// Places an order from the caller's basket. The basket is kept.
#[utoipa::path(
    post,
    path = "/",
    tag = ORDER_TAG,
    security(("bearerAuth" = [])),
    request_body = CreateOrderRequest,
    responses(
        (status = 200, description = "Order placed", body = OrderDto),
        (status = 400, description = "Missing or empty basket, or invalid address", body = ErrorResponse)
    )
)]
async fn create_order(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(payload): ValidatedJson<CreateOrderRequest>,
) -> AppResult<Json<OrderDto>> {
    let (order, items) = state
        .services
        .orders
        .create_order(
            &auth.email,
            &payload.basket_id,
            payload.delivery_method_id,
            payload.ship_to_address.into(),
        )
        .await?;
    Ok(Json(OrderDto::new(order, items, state.services.products.files())))
}

#[utoipa::path(
    get,
    path = "/",
    tag = ORDER_TAG,
    security(("bearerAuth" = [])),
    responses((status = 200, description = "The caller's orders, newest first", body = Vec<OrderDto>))
)]
async fn list_my_orders(State(state): State<AppState>, auth: AuthUser) -> AppResult<Json<Vec<OrderDto>>> {
    let files = state.services.products.files();
    let orders = state.services.orders.orders_for_buyer(&auth.email).await?;
    Ok(Json(
        orders
            .into_iter()
            .map(|(order, items)| OrderDto::new(order, items, files))
            .collect(),
    ))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = ORDER_TAG,
    security(("bearerAuth" = [])),
    params(("id" = i32, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order found", body = OrderDto),
        (status = 404, description = "No such order for this buyer", body = ErrorResponse)
    )
)]
async fn get_order(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<Json<OrderDto>> {
    let (order, items) = state.services.orders.order_for_buyer(id, &auth.email).await?;
    Ok(Json(OrderDto::new(order, items, state.services.products.files())))
}

#[utoipa::path(
    post,
    path = "/{id}/cancel",
    tag = ORDER_TAG,
    security(("bearerAuth" = [])),
    params(("id" = i32, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order cancelled", body = AllOrdersDto),
        (status = 400, description = "Order is no longer pending", body = ErrorResponse),
        (status = 404, description = "No such order for this buyer", body = ErrorResponse)
    )
)]
async fn cancel_order(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<Json<AllOrdersDto>> {
    let order = state.services.orders.cancel_order(id, &auth.email).await?;
    Ok(Json(order.into()))
}

#[utoipa::path(
    get,
    path = "/admin",
    tag = ORDER_TAG,
    security(("bearerAuth" = [])),
    params(OrderListQuery),
    responses(
        (status = 200, description = "One page of orders", body = PagedResponse<AllOrdersDto>),
        (status = 400, description = "Unknown status filter", body = ErrorResponse),
        (status = 403, description = "Missing Orders.View permission", body = ErrorResponse)
    )
)]
async fn list_all_orders(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedQuery(query): ValidatedQuery<OrderListQuery>,
) -> AppResult<Json<PagedResponse<AllOrdersDto>>> {
    auth.require(orders(PermissionAction::View))?;
    let (orders, count) = state.services.orders.list_orders(&query.to_query()?).await?;
    Ok(Json(PagedResponse::new(
        orders.into_iter().map(AllOrdersDto::from).collect(),
        &query.pagination(),
        count,
    )))
}

#[utoipa::path(
    put,
    path = "/{id}/status",
    tag = ORDER_TAG,
    security(("bearerAuth" = [])),
    params(("id" = i32, Path, description = "Order ID")),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = AllOrdersDto),
        (status = 400, description = "Unknown status", body = ErrorResponse),
        (status = 404, description = "Unknown order", body = ErrorResponse)
    )
)]
async fn update_order_status(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i32>,
    ValidatedJson(payload): ValidatedJson<UpdateOrderStatusRequest>,
) -> AppResult<Json<AllOrdersDto>> {
    auth.require(orders(PermissionAction::Update))?;
    let order = state.services.orders.update_status(id, &payload.status).await?;
    Ok(Json(order.into()))
}
