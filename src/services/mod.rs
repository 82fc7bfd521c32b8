//! Service layer for business logic operations.
//!
//! Services encapsulate business rules and coordinate between
//! repositories, file storage and outgoing email.

pub mod auth_service;
pub mod cart_service;
mod catalog_service;
pub mod email;
pub mod file_storage;
mod notification_service;
pub mod order_service;
mod product_service;
mod profile_service;
mod role_service;

pub use auth_service::{AuthService, AuthSession, Caller, Registration};
pub use cart_service::{Cart, CartLine, CartService};
pub use catalog_service::CatalogService;
pub use file_storage::FileStorageService;
pub use notification_service::{DispatchReport, NotificationService};
pub use order_service::{OrderService, ShippingAddress};
pub use product_service::{ImageUpload, ProductInput, ProductService};
pub use profile_service::{ProfileService, UserSummary};
pub use role_service::{RoleService, UserRoleAssignments};

use std::sync::Arc;

use crate::config::Settings;
use crate::repositories::Repositories;
use crate::services::email::EmailSender;

/// Aggregates all services for convenient access.
///
/// This struct is designed to be used as Axum application state.
/// Cloning is cheap since underlying pools use `Arc` internally.
#[derive(Clone)]
pub struct Services {
    pub auth: AuthService,
    pub profiles: ProfileService,
    pub roles: RoleService,
    pub catalog: CatalogService,
    pub products: ProductService,
    pub carts: CartService,
    pub orders: OrderService,
    pub notifications: NotificationService,
}

impl Services {
    pub fn new(repos: Repositories, settings: &Settings, email: Arc<dyn EmailSender>) -> Self {
        let files = FileStorageService::new(&settings.uploads, &settings.server.public_url);
        let carts = CartService::new(repos.carts);

        Self {
            auth: AuthService::new(
                repos.users.clone(),
                repos.roles.clone(),
                repos.tokens.clone(),
                settings.jwt.clone(),
                settings.security.clone(),
                settings.email.ui_url.clone(),
                email.clone(),
            ),
            profiles: ProfileService::new(
                repos.users.clone(),
                repos.roles.clone(),
                repos.tokens,
                files.clone(),
            ),
            roles: RoleService::new(repos.roles, repos.users),
            catalog: CatalogService::new(repos.brands.clone(), repos.product_types.clone()),
            products: ProductService::new(repos.products, repos.brands, repos.product_types, files),
            orders: OrderService::new(repos.orders.clone(), carts.clone()),
            carts,
            notifications: NotificationService::new(repos.notifications, repos.orders, email),
        }
    }
}
