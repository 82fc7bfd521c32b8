//! HTTP request handlers, one module per resource.

pub mod account;
pub mod brands;
pub mod carts;
pub mod health;
pub mod orders;
pub mod products;
pub mod profiles;
pub mod roles;
pub mod types;
