//! Data Transfer Objects for API requests and responses, one module per
//! resource. JSON field names are camelCase throughout.

mod account;
mod cart;
mod catalog;
mod error;
mod health;
mod order;
mod pagination;
mod product;
mod profile;
mod role;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub use account::{
    ForgotPasswordRequest, LoginRequest, RefreshTokenRequest, RegisterRequest,
    ResetPasswordRequest, UserDto,
};
pub use cart::{CartDto, CartItemDto, cart_id};
pub use catalog::{BrandDto, NameRequest, TypeDto};
pub use error::ErrorResponse;
pub use health::{ComponentHealth, HealthResponse, HealthStatus};
pub use order::{
    AllOrdersDto, CreateOrderRequest, DeliveryMethodDto, OrderDto, OrderItemDto, OrderListQuery,
    ShipToAddressDto, UpdateOrderStatusRequest,
};
pub use pagination::{PagedResponse, PaginationParams};
pub use product::{CreateReviewRequest, ProductDto, ProductForm, ProductListQuery, ReviewDto};
pub use profile::{
    AddressDto, ChangePasswordRequest, DeleteProfileRequest, PasswordRequest, ProfileDto,
    UpdateProfileRequest, UserListQuery, UserSummaryDto,
};
pub use role::{
    CreateRoleRequest, PermissionSelection, RoleDto, RolePermissionsDto, UpdatePermissionsRequest,
    UpdateUserRolesRequest, UserRoleSelection, UserRolesDto,
};

/// Plain confirmation message.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
