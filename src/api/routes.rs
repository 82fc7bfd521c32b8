//! Router configuration for the API.
//!
//! Assembles the `/api` resource routers, the OpenAPI document, static
//! image serving and the middleware stack.

use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::{Router, middleware};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::services::ServeDir;
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::doc::ApiDoc;
use crate::api::handlers::{
    account, brands, carts, health, orders, products, profiles, roles, types,
};
use crate::api::middleware::{
    REQUEST_ID_HEADER, auth_middleware, global_error_handler, logging_middleware,
    request_id_middleware,
};
use crate::config::{CorsConfig, UploadsConfig};
use crate::state::AppState;

/// Room for the non-file form fields on top of the image size limit.
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

/// Builds the application router.
///
/// # Middleware Order
/// Layers run outermost first:
/// 1. CORS and compression
/// 2. Request ID - generates/propagates `x-request-id`
/// 3. Logging - one span per request
/// 4. Error normalization - every 4xx/5xx becomes an `ErrorResponse`
/// 5. Authentication - decodes the bearer token when present
pub fn create_router(state: AppState) -> Router {
    let (router, openapi) = documented_routes().split_for_parts();
    let images_dir = state.services.products.files().images_dir();
    let settings = state.settings.clone();

    router
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
        .nest_service("/images", ServeDir::new(images_dir))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .layer(DefaultBodyLimit::max(body_limit(&settings.uploads)))
        .layer(middleware::from_fn(global_error_handler))
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(CompressionLayer::new())
        .layer(cors_layer(&settings.cors))
        .with_state(state)
}

/// Every route that appears in the OpenAPI document.
fn documented_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::with_openapi(ApiDoc::openapi())
        .nest("/api", api_routes())
        .merge(health::health_routes())
}

fn api_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/account", account::account_routes())
        .nest("/profiles", profiles::profile_routes())
        .nest("/roles", roles::role_routes())
        .nest("/productbrands", brands::brand_routes())
        .nest("/producttypes", types::type_routes())
        .nest("/products", products::product_routes())
        .nest("/baskets", carts::baskets::basket_routes())
        .nest("/wishlists", carts::wishlists::wishlist_routes())
        .nest("/orders", orders::order_routes())
}

fn body_limit(uploads: &UploadsConfig) -> usize {
    usize::try_from(uploads.max_bytes)
        .unwrap_or(usize::MAX)
        .saturating_add(FORM_OVERHEAD_BYTES)
}

/// Credentialed CORS for the configured origins. Invalid origins are
/// skipped with a warning.
fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin.trim_end_matches('/')) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(origin = %origin, error = %e, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .expose_headers([axum::http::HeaderName::from_static(REQUEST_ID_HEADER)])
        .allow_credentials(true)
}
