//! Seed command handler

use crate::config::settings::Settings;
use crate::db::{establish_async_connection_pool, seed::seed_reference_data};
use crate::error::AppResult;
use crate::repositories::Repositories;

/// Handler for the seed command
pub struct SeedCommandHandler {
    config: Settings,
}

impl SeedCommandHandler {
    pub fn new(config: Settings) -> Self {
        Self { config }
    }

    /// Inserts whatever reference data is missing and prints what was added.
    ///
    /// # Errors
    /// - Database configuration or connection errors
    /// - Invalid `seed.admin_*` settings
    pub async fn execute(&self) -> AppResult<()> {
        self.config.database.validate()?;

        println!("Seeding reference data...");
        let pool = establish_async_connection_pool(&self.config.database).await?;
        let report = seed_reference_data(&Repositories::new(pool), &self.config.seed).await?;
        tracing::info!(?report, "Reference data seeded");

        println!("✓ Roles created: {}", report.roles);
        println!("✓ Permissions granted: {}", report.permissions);
        println!("✓ Product brands created: {}", report.brands);
        println!("✓ Product types created: {}", report.product_types);
        println!("✓ Delivery methods created: {}", report.delivery_methods);
        if report.admin_created {
            println!("✓ Super admin account created");
        }
        println!("Seeding completed successfully");
        Ok(())
    }

    pub fn config(&self) -> &Settings {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    #[tokio::test]
    async fn test_seed_requires_database_url() {
        let handler = SeedCommandHandler::new(Settings::default());
        assert!(matches!(
            handler.execute().await,
            Err(AppError::Configuration { key, .. }) if key == "database.url"
        ));
    }
}
