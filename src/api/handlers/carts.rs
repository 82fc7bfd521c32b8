//! Basket and wishlist handlers.
//!
//! Both documents share one operation set; `cart_handlers!` stamps out a
//! module per kind so each gets its own OpenAPI paths and tag.

use axum::Json;

use crate::api::dto::{CartDto, CartItemDto, MessageResponse, cart_id};
use crate::error::AppResult;
use crate::models::CartKind;
use crate::state::AppState;

async fn get_cart(state: &AppState, kind: CartKind, id: &str) -> AppResult<Json<CartDto>> {
    let cart = state.services.carts.get(kind, id).await?;
    Ok(Json(cart.into()))
}

async fn upsert_cart(state: &AppState, kind: CartKind, payload: CartDto) -> AppResult<Json<CartDto>> {
    let cart = state.services.carts.upsert(payload.into_cart(kind)?).await?;
    Ok(Json(cart.into()))
}

async fn add_item(
    state: &AppState,
    kind: CartKind,
    id: &str,
    item: CartItemDto,
) -> AppResult<Json<CartDto>> {
    let id = cart_id(id)?;
    let cart = state
        .services
        .carts
        .add_item(kind, id, item.into_line()?)
        .await?;
    Ok(Json(cart.into()))
}

async fn increment_item(
    state: &AppState,
    kind: CartKind,
    id: &str,
    product_id: i32,
) -> AppResult<Json<CartDto>> {
    let cart = state.services.carts.increment_item(kind, id, product_id).await?;
    Ok(Json(cart.into()))
}

async fn decrement_item(
    state: &AppState,
    kind: CartKind,
    id: &str,
    product_id: i32,
) -> AppResult<Json<CartDto>> {
    let cart = state.services.carts.decrement_item(kind, id, product_id).await?;
    Ok(Json(cart.into()))
}

async fn delete_cart(state: &AppState, kind: CartKind, id: &str) -> AppResult<Json<MessageResponse>> {
    state.services.carts.delete(kind, id).await?;
    Ok(Json(MessageResponse::new(format!(
        "{} with ID '{id}' deleted successfully.",
        kind.label()
    ))))
}

macro_rules! cart_handlers {
    ($module:ident, $routes:ident, $kind:expr, $tag:ident) => {
        pub mod $module {
            use axum::{
                Json,
                extract::{Path, State},
            };
            use utoipa_axum::router::OpenApiRouter;
            use utoipa_axum::routes;

            use crate::api::doc::$tag;
            use crate::api::dto::{CartDto, CartItemDto, ErrorResponse, MessageResponse};
            use crate::error::AppResult;
            use crate::models::CartKind;
            use crate::state::AppState;
            use crate::utils::validate::ValidatedJson;

            const KIND: CartKind = $kind;

            pub fn $routes() -> OpenApiRouter<AppState> {
                OpenApiRouter::new()
                    .routes(routes!(upsert_cart))
                    .routes(routes!(get_cart, delete_cart))
                    .routes(routes!(add_item))
                    .routes(routes!(increment_item))
                    .routes(routes!(decrement_item))
            }

            #[utoipa::path(
                get,
                path = "/{id}",
                tag = $tag,
                params(("id" = String, Path, description = "Client-chosen document ID")),
                responses(
                    (status = 200, description = "Document found", body = CartDto),
                    (status = 404, description = "Unknown document", body = ErrorResponse)
                )
            )]
            async fn get_cart(
                State(state): State<AppState>,
                Path(id): Path<String>,
            ) -> AppResult<Json<CartDto>> {
                super::get_cart(&state, KIND, &id).await
            }

            #[utoipa::path(
                post,
                path = "/",
                tag = $tag,
                request_body = CartDto,
                responses(
                    (status = 200, description = "Document stored", body = CartDto),
                    (status = 400, description = "Invalid lines", body = ErrorResponse)
                )
            )]
            async fn upsert_cart(
                State(state): State<AppState>,
                ValidatedJson(payload): ValidatedJson<CartDto>,
            ) -> AppResult<Json<CartDto>> {
                super::upsert_cart(&state, KIND, payload).await
            }

            #[utoipa::path(
                post,
                path = "/{id}/items",
                tag = $tag,
                params(("id" = String, Path, description = "Document ID")),
                request_body = CartItemDto,
                responses(
                    (status = 200, description = "Line added or merged", body = CartDto),
                    (status = 400, description = "Invalid document ID or line", body = ErrorResponse)
                )
            )]
            async fn add_item(
                State(state): State<AppState>,
                Path(id): Path<String>,
                ValidatedJson(item): ValidatedJson<CartItemDto>,
            ) -> AppResult<Json<CartDto>> {
                super::add_item(&state, KIND, &id, item).await
            }

            #[utoipa::path(
                post,
                path = "/{id}/items/{product_id}/increment",
                tag = $tag,
                params(
                    ("id" = String, Path, description = "Document ID"),
                    ("product_id" = i32, Path, description = "Product ID of the line")
                ),
                responses(
                    (status = 200, description = "Quantity increased", body = CartDto),
                    (status = 404, description = "Unknown document or line", body = ErrorResponse)
                )
            )]
            async fn increment_item(
                State(state): State<AppState>,
                Path((id, product_id)): Path<(String, i32)>,
            ) -> AppResult<Json<CartDto>> {
                super::increment_item(&state, KIND, &id, product_id).await
            }

            /// Removes the line once its quantity reaches zero.
            #[utoipa::path(
                post,
                path = "/{id}/items/{product_id}/decrement",
                tag = $tag,
                params(
                    ("id" = String, Path, description = "Document ID"),
                    ("product_id" = i32, Path, description = "Product ID of the line")
                ),
                responses(
                    (status = 200, description = "Quantity decreased", body = CartDto),
                    (status = 404, description = "Unknown document or line", body = ErrorResponse)
                )
            )]
            async fn decrement_item(
                State(state): State<AppState>,
                Path((id, product_id)): Path<(String, i32)>,
            ) -> AppResult<Json<CartDto>> {
                super::decrement_item(&state, KIND, &id, product_id).await
            }

            #[utoipa::path(
                delete,
                path = "/{id}",
                tag = $tag,
                params(("id" = String, Path, description = "Document ID")),
                responses(
                    (status = 200, description = "Document deleted", body = MessageResponse),
                    (status = 404, description = "Unknown document", body = ErrorResponse)
                )
            )]
            async fn delete_cart(
                State(state): State<AppState>,
                Path(id): Path<String>,
            ) -> AppResult<Json<MessageResponse>> {
                super::delete_cart(&state, KIND, &id).await
            }
        }
    };
}

cart_handlers!(baskets, basket_routes, CartKind::Basket, BASKET_TAG);
cart_handlers!(wishlists, wishlist_routes, CartKind::Wishlist, WISHLIST_TAG);
