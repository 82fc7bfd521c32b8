//! Configuration merger for CLI arguments and config files
//!
//! CLI flags sit on top of the file and environment layers: a command's own
//! flags beat the global `--verbose`/`--quiet`, which beat the files.

use super::parser::{Cli, Commands};
use crate::config::error::ConfigError;
use crate::config::{ConfigLoader, settings::Settings};

/// Applies CLI overrides to settings loaded from files.
pub struct ConfigurationMerger {
    base_config: Settings,
}

impl ConfigurationMerger {
    pub fn new(base_config: Settings) -> Self {
        Self { base_config }
    }

    /// Loads the base settings the CLI selects: `--config` picks a single
    /// file, otherwise the layered directory is used. `--env` overrides
    /// `ECOMMERCE_APP_ENV` in both cases.
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let loader = match &cli.config {
            Some(path) => ConfigLoader::with_file(path.clone()),
            None => ConfigLoader::new()?,
        };
        let loader = match cli.env {
            Some(env) => loader.with_environment(env.into()),
            None => loader,
        };

        Ok(Self::new(loader.load()?))
    }

    /// Returns a copy of the base settings with every CLI override applied,
    /// validated again.
    pub fn merge_cli_args(&self, cli: &Cli) -> Result<Settings, ConfigError> {
        let mut config = self.base_config.clone();

        if cli.verbose {
            config.logger.level = "debug".to_string();
        } else if cli.quiet {
            config.logger.level = "error".to_string();
        }

        if let Some(command) = &cli.command {
            apply_command_overrides(&mut config, command);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn config(&self) -> &Settings {
        &self.base_config
    }
}

fn apply_command_overrides(config: &mut Settings, command: &Commands) {
    match command {
        Commands::Serve {
            host,
            port,
            log_level,
            dry_run: _,
        } => {
            if let Some(host) = host {
                config.server.host = host.clone();
            }
            if let Some(port) = port {
                config.server.port = *port;
            }
            if let Some(level) = log_level {
                config.logger.level = level.as_str().to_string();
            }
        }
        // Database-only commands keep the file settings.
        Commands::Migrate { .. } | Commands::Seed => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn merger() -> ConfigurationMerger {
        let mut config = Settings::default();
        config.database.url = "postgres://localhost/ecommerce_test".to_string();
        ConfigurationMerger::new(config)
    }

    fn merge(args: &[&str]) -> Settings {
        let cli = Cli::try_parse_from(args).unwrap();
        merger().merge_cli_args(&cli).unwrap()
    }

    #[test]
    fn test_no_flags_keeps_base_config() {
        let merger = merger();
        let cli = Cli::try_parse_from(["ecommerce-rs"]).unwrap();
        assert_eq!(&merger.merge_cli_args(&cli).unwrap(), merger.config());
    }

    #[test]
    fn test_global_log_flags() {
        assert_eq!(merge(&["ecommerce-rs", "--verbose"]).logger.level, "debug");
        assert_eq!(merge(&["ecommerce-rs", "--quiet"]).logger.level, "error");
    }

    #[test]
    fn test_serve_overrides_host_and_port() {
        let merged = merge(&["ecommerce-rs", "serve", "--host", "0.0.0.0", "--port", "8080"]);
        assert_eq!(merged.server.host, "0.0.0.0");
        assert_eq!(merged.server.port, 8080);
    }

    #[test]
    fn test_command_log_level_overrides_global() {
        let merged = merge(&["ecommerce-rs", "--verbose", "serve", "--log-level", "warn"]);
        assert_eq!(merged.logger.level, "warn");
    }

    #[test]
    fn test_seed_leaves_server_settings_alone() {
        let base = merger().config().clone();
        let merged = merge(&["ecommerce-rs", "seed"]);
        assert_eq!(merged.server, base.server);
    }

    #[test]
    fn test_from_cli_reads_single_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("app.toml");
        std::fs::write(
            &file,
            "[server]\nport = 9100\n\n[database]\nurl = \"postgres://localhost/shop\"\n",
        )
        .unwrap();

        let cli = Cli::try_parse_from(["ecommerce-rs", "--config", file.to_str().unwrap(), "--env", "test"])
            .unwrap();
        let merger = ConfigurationMerger::from_cli(&cli).unwrap();
        assert_eq!(merger.config().server.port, 9100);
        assert_eq!(merger.config().database.url, "postgres://localhost/shop");
    }
}
