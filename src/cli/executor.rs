//! Command executor for dispatching CLI commands

use super::handlers::{MigrateCommandHandler, SeedCommandHandler, ServeCommandHandler};
use super::parser::{Cli, Commands};
use crate::config::settings::Settings;
use crate::error::{AppError, AppResult};

/// Runs the selected subcommand with merged settings. A bare invocation
/// starts the server.
///
/// # Errors
/// Returns argument validation failures and whatever the handler returns.
pub async fn execute_command(cli: &Cli, settings: Settings) -> AppResult<()> {
    validate_command_args(cli)?;

    match cli.command_or_default() {
        Commands::Serve { dry_run, .. } => ServeCommandHandler::new(settings).execute(dry_run).await,
        Commands::Migrate { dry_run, rollback } => {
            MigrateCommandHandler::new(settings)
                .execute(dry_run, rollback)
                .await
        }
        Commands::Seed => SeedCommandHandler::new(settings).execute().await,
    }
}

fn validate_command_args(cli: &Cli) -> AppResult<()> {
    cli.validate().map_err(|reason| AppError::Validation {
        field: "cli_arguments".to_string(),
        reason,
    })?;

    if let Some(Commands::Migrate {
        rollback: Some(steps),
        ..
    }) = &cli.command
    {
        if *steps > 50 {
            tracing::warn!(
                steps,
                "Rolling back many migrations at once; consider smaller steps"
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn create_valid_config() -> Settings {
        let mut config = Settings::default();
        config.database.url = "postgres://localhost/ecommerce_test".to_string();
        config.jwt.secret = "a-test-signing-secret-of-at-least-32-chars".to_string();
        config
    }

    #[tokio::test]
    async fn test_execute_serve_dry_run() {
        let cli = Cli::try_parse_from(["ecommerce-rs", "serve", "--dry-run"]).unwrap();
        assert!(execute_command(&cli, create_valid_config()).await.is_ok());
    }

    #[test]
    fn test_validate_command_args_accepts_port() {
        let cli = Cli::try_parse_from(["ecommerce-rs", "serve", "--port", "8080"]).unwrap();
        assert!(validate_command_args(&cli).is_ok());
    }

    #[tokio::test]
    async fn test_conflicting_migrate_args_rejected() {
        let cli = Cli {
            command: Some(Commands::Migrate {
                dry_run: true,
                rollback: Some(5),
            }),
            config: None,
            env: None,
            verbose: false,
            quiet: false,
        };

        match execute_command(&cli, create_valid_config()).await {
            Err(AppError::Validation { field, .. }) => assert_eq!(field, "cli_arguments"),
            other => panic!("Expected validation error, got {other:?}"),
        }
    }
}
