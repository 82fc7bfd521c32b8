//! Serve command handler
//!
//! Either checks the configuration (`--dry-run`) or runs the HTTP server
//! until shutdown.

use crate::config::settings::Settings;
use crate::error::AppResult;
use crate::server::Server;

/// Handler for the serve command
pub struct ServeCommandHandler {
    config: Settings,
}

impl ServeCommandHandler {
    pub fn new(config: Settings) -> Self {
        Self { config }
    }

    /// Runs the server, or only validates when `dry_run` is set.
    ///
    /// # Errors
    /// - Configuration validation errors
    /// - Database, bind or scheduler failures during startup
    pub async fn execute(self, dry_run: bool) -> AppResult<()> {
        if dry_run {
            return self.validate_only();
        }
        Server::new(self.config).run().await.map_err(Into::into)
    }

    /// Validates everything `serve` needs without touching the network or
    /// the database.
    pub fn validate_only(&self) -> AppResult<()> {
        self.config.validate()?;
        self.config.jwt.validate()?;

        println!("✓ Configuration is valid");
        println!("✓ Server would bind to: {}", self.config.server.address());
        println!("✓ Public URL: {}", self.config.server.public_url);
        println!(
            "✓ Uploads stored under '{}' (max {} bytes)",
            self.config.uploads.root, self.config.uploads.max_bytes
        );
        println!(
            "✓ Email delivery {}",
            if self.config.email.enabled { "enabled" } else { "disabled (logged only)" }
        );
        println!(
            "✓ Background jobs {}",
            if self.config.jobs.enabled { "enabled" } else { "disabled" }
        );

        println!("Dry run completed successfully - configuration is ready for deployment");
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
        config.jwt.secret = "a-test-signing-secret-of-at-least-32-chars".to_string();
        config
    }

    #[test]
    fn test_serve_handler_new() {
        let config = create_valid_config();
        let handler = ServeCommandHandler::new(config.clone());
        assert_eq!(handler.config(), &config);
    }

    #[tokio::test]
    async fn test_serve_handler_dry_run() {
        let handler = ServeCommandHandler::new(create_valid_config());
        assert!(handler.execute(true).await.is_ok());
    }

    #[tokio::test]
    async fn test_serve_handler_dry_run_invalid_port() {
        let mut config = create_valid_config();
        config.server.port = 0;
        let handler = ServeCommandHandler::new(config);
        assert!(handler.execute(true).await.is_err());
    }

    #[test]
    fn test_dry_run_requires_signing_secret() {
        let mut config = create_valid_config();
        config.jwt.secret = "short".to_string();
        let handler = ServeCommandHandler::new(config);
        assert!(handler.validate_only().is_err());
    }
}
