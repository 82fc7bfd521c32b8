//! Database access: connection pool, embedded migrations and seed data.

pub mod migrations;
mod pool;
pub mod seed;

pub use migrations::{MIGRATIONS, pending_migrations, revert_migrations, run_pending_migrations};
pub use pool::{AsyncDbPool, DbConnection, establish_async_connection_pool};
