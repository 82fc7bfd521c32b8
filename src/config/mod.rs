//! Configuration management
//!
//! # Configuration Priority (lowest to highest)
//! 1. `default.toml`
//! 2. `{environment}.toml`
//! 3. `local.toml` (not committed)
//! 4. `ECOMMERCE_*` environment variables

pub mod environment;
pub mod error;
pub mod loader;
pub mod settings;
pub mod validation;

pub use environment::Environment;
pub use error::ConfigError;
pub use loader::{ConfigLoader, ConfigSource};
pub use settings::{
    CorsConfig, DatabaseConfig, EmailConfig, JobsConfig, JwtConfig, SecurityConfig, SeedConfig,
    ServerConfig, Settings, UploadsConfig,
};
