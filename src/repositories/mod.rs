//! Repository layer for data access operations.
//!
//! Each repository owns a pool handle and runs its queries on a freshly
//! checked-out connection.

mod brand_repo;
mod cart_repo;
mod notification_repo;
mod order_repo;
mod product_repo;
mod product_type_repo;
mod role_repo;
mod token_repo;
mod user_repo;

pub use brand_repo::BrandRepository;
pub use cart_repo::CartRepository;
pub use notification_repo::NotificationRepository;
pub use order_repo::{OrderLineDraft, OrderQuery, OrderRepository, OrderSort};
pub use product_repo::{ProductQuery, ProductRepository, ProductSort, ProductWithNames};
pub use product_type_repo::ProductTypeRepository;
pub use role_repo::RoleRepository;
pub use token_repo::TokenRepository;
pub use user_repo::{UserQuery, UserRepository, UserSort};

use crate::db::AsyncDbPool;

/// Aggregates all repositories for convenient access.
///
/// Since `AsyncDbPool` uses `Arc` internally, cloning is cheap.
#[derive(Clone)]
pub struct Repositories {
    pub users: UserRepository,
    pub roles: RoleRepository,
    pub tokens: TokenRepository,
    pub brands: BrandRepository,
    pub product_types: ProductTypeRepository,
    pub products: ProductRepository,
    pub carts: CartRepository,
    pub orders: OrderRepository,
    pub notifications: NotificationRepository,
}

impl Repositories {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self {
            users: UserRepository::new(pool.clone()),
            roles: RoleRepository::new(pool.clone()),
            tokens: TokenRepository::new(pool.clone()),
            brands: BrandRepository::new(pool.clone()),
            product_types: ProductTypeRepository::new(pool.clone()),
            products: ProductRepository::new(pool.clone()),
            carts: CartRepository::new(pool.clone()),
            orders: OrderRepository::new(pool.clone()),
            notifications: NotificationRepository::new(pool),
        }
    }
}
