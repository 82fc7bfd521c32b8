//! Migrate command handler
//!
//! Applies, previews or reverts the embedded schema migrations.

use crate::config::settings::Settings;
use crate::db::{pending_migrations, revert_migrations, run_pending_migrations};
use crate::error::{AppError, AppResult};

/// Handler for the migrate command
pub struct MigrateCommandHandler {
    config: Settings,
}

impl MigrateCommandHandler {
    pub fn new(config: Settings) -> Self {
        Self { config }
    }

    /// Runs the migrate command.
    ///
    /// # Arguments
    /// * `dry_run` - List pending migrations without applying them
    /// * `rollback` - Revert this many of the most recent migrations
    ///
    /// # Errors
    /// - Database configuration or connection errors
    /// - Migration execution errors
    pub async fn execute(&self, dry_run: bool, rollback: Option<u32>) -> AppResult<()> {
        self.config.database.validate()?;

        match (dry_run, rollback) {
            (true, Some(_)) => Err(AppError::Validation {
                field: "rollback".to_string(),
                reason: "Cannot use --dry-run and --rollback together".to_string(),
            }),
            (true, None) => self.show_pending_migrations().await,
            (false, Some(steps)) => self.rollback_migrations(steps).await,
            (false, None) => self.run_migrations().await,
        }
    }

    async fn show_pending_migrations(&self) -> AppResult<()> {
        println!("Checking for pending migrations...");
        let pending = pending_migrations(&self.config.database.url).await?;

        if pending.is_empty() {
            println!("✓ No pending migrations found - database is up to date");
        } else {
            println!("Found {} pending migration(s):", pending.len());
            for name in &pending {
                println!("  - {name}");
            }
            println!("\nRun without --dry-run to apply these migrations");
        }
        Ok(())
    }

    async fn run_migrations(&self) -> AppResult<()> {
        println!("Running database migrations...");
        let applied = run_pending_migrations(&self.config.database.url).await?;
        tracing::info!(count = applied.len(), migrations = ?applied, "Migrations applied");

        if applied.is_empty() {
            println!("✓ No migrations to apply - database is already up to date");
        } else {
            println!("✓ Applied {} migration(s):", applied.len());
            for version in &applied {
                println!("  - {version}");
            }
        }
        Ok(())
    }

    async fn rollback_migrations(&self, steps: u32) -> AppResult<()> {
        println!("Rolling back {steps} migration(s)...");
        let reverted = revert_migrations(&self.config.database.url, steps).await?;
        tracing::warn!(count = reverted.len(), migrations = ?reverted, "Migrations reverted");

        println!("✓ Rolled back {} migration(s):", reverted.len());
        for version in &reverted {
            println!("  - {version}");
        }
        Ok(())
    }

    pub fn config(&self) -> &Settings {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_valid_config() -> Settings {
        let mut config = Settings::default();
        config.database.url = "postgres://localhost/ecommerce_test".to_string();
        config
    }

    #[test]
    fn test_migrate_handler_new() {
        let config = create_valid_config();
        let handler = MigrateCommandHandler::new(config.clone());
        assert_eq!(handler.config(), &config);
    }

    #[tokio::test]
    async fn test_zero_rollback_steps_rejected_before_connecting() {
        let handler = MigrateCommandHandler::new(create_valid_config());

        match handler.execute(false, Some(0)).await {
            Err(AppError::Validation { field, reason }) => {
                assert_eq!(field, "rollback");
                assert!(reason.contains("greater than 0"));
            }
            other => panic!("Expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_dry_run_with_rollback_rejected() {
        let handler = MigrateCommandHandler::new(create_valid_config());
        assert!(matches!(
            handler.execute(true, Some(1)).await,
            Err(AppError::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn test_missing_database_url_rejected() {
        let handler = MigrateCommandHandler::new(Settings::default());
        assert!(matches!(
            handler.execute(false, None).await,
            Err(AppError::Configuration { .. })
        ));
    }
}
