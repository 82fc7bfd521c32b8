use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

pub const ACCOUNT_TAG: &str = "Account";
pub const PROFILE_TAG: &str = "Profiles";
pub const ROLE_TAG: &str = "Roles";
pub const BRAND_TAG: &str = "Product Brands";
pub const TYPE_TAG: &str = "Product Types";
pub const PRODUCT_TAG: &str = "Products";
pub const BASKET_TAG: &str = "Baskets";
pub const WISHLIST_TAG: &str = "Wishlists";
pub const ORDER_TAG: &str = "Orders";
pub const HEALTH_TAG: &str = "Health";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "E-commerce API",
        description = "Storefront and back-office API: catalog, baskets, orders and accounts",
    ),
    modifiers(&SecurityAddon),
    components(
        schemas(
            crate::api::dto::ErrorResponse,
            crate::error::ValidationFieldError,
            crate::models::OrderStatus,
        )
    ),
    tags(
        (name = ACCOUNT_TAG, description = "Registration, login, tokens and password reset"),
        (name = PROFILE_TAG, description = "Profile self-service and user administration"),
        (name = ROLE_TAG, description = "Roles and permission administration"),
        (name = BRAND_TAG, description = "Product brand endpoints"),
        (name = TYPE_TAG, description = "Product type endpoints"),
        (name = PRODUCT_TAG, description = "Product catalog and reviews"),
        (name = BASKET_TAG, description = "Shopping basket endpoints"),
        (name = WISHLIST_TAG, description = "Wishlist endpoints"),
        (name = ORDER_TAG, description = "Order placement and administration"),
        (name = HEALTH_TAG, description = "Health check endpoints"),
    )
)]
pub struct ApiDoc;

pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearerAuth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("JWT Bearer Token Authentication"))
                        .build(),
                ),
            )
        }
    }
}
