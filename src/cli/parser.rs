//! CLI argument parsing with clap
//!
//! Defines the command-line surface: global configuration flags and the
//! `serve`, `migrate` and `seed` subcommands.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// E-commerce backend: catalog, baskets, orders and accounts over HTTP
#[derive(Parser, Debug)]
#[command(name = "ecommerce-rs")]
#[command(about = "E-commerce backend API server")]
#[command(long_about = "
ecommerce-rs serves the store's REST API: accounts and profiles, roles and
permissions, the product catalog with reviews, baskets and wishlists, and
orders with email notifications.

EXAMPLES:
    # Start the server with the layered configuration in ./config
    ecommerce-rs serve

    # Start server on custom host and port
    ecommerce-rs serve --host 0.0.0.0 --port 8080

    # Use a single configuration file
    ecommerce-rs --config /etc/ecommerce-rs/production.toml serve

    # Load config/staging.toml on top of the defaults
    ecommerce-rs --env staging serve

    # Check configuration without starting server
    ecommerce-rs serve --dry-run

    # Apply pending migrations, or preview them
    ecommerce-rs migrate
    ecommerce-rs migrate --dry-run

    # Rollback last 2 migrations
    ecommerce-rs migrate --rollback 2

    # Insert roles, permissions, catalog lookups and delivery methods
    ecommerce-rs seed
")]
#[command(version = crate::build::CLAP_LONG_VERSION)]
pub struct Cli {
    /// Subcommand to execute (defaults to `serve`)
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Configuration file path
    ///
    /// Loads only this TOML file (plus `ECOMMERCE_*` environment variables)
    /// instead of the layered files under `config/`.
    ///
    /// Example: --config /etc/ecommerce-rs/production.toml
    #[arg(short, long, value_name = "FILE", value_parser = super::validation::validate_config_file_path)]
    pub config: Option<PathBuf>,

    /// Override environment detection
    ///
    /// Selects which `config/{env}.toml` layer is loaded, taking precedence
    /// over `ECOMMERCE_APP_ENV`.
    ///
    /// Available values: development (dev), test, staging (stage), production (prod)
    #[arg(short, long, value_enum)]
    pub env: Option<Environment>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Start the web server (default)
    ///
    /// Examples:
    ///   ecommerce-rs serve                           # Start with defaults
    ///   ecommerce-rs serve --host 0.0.0.0 --port 80 # Bind to all interfaces on port 80
    ///   ecommerce-rs serve --dry-run                 # Validate config without starting
    Serve {
        /// Host address to bind to
        ///
        /// Use 127.0.0.1 for localhost only, or 0.0.0.0 to accept connections
        /// from any interface.
        #[arg(long, value_name = "ADDRESS", value_parser = super::validation::validate_host_address)]
        host: Option<String>,

        /// Port number to listen on (1-65535)
        #[arg(short, long, value_name = "PORT", value_parser = super::validation::validate_port)]
        port: Option<u16>,

        /// Log level override
        ///
        /// Takes precedence over the configuration file and the global
        /// --verbose/--quiet flags.
        #[arg(long, value_enum)]
        log_level: Option<LogLevel>,

        /// Validate configuration and exit
        #[arg(long)]
        dry_run: bool,
    },
    /// Database migration operations
    ///
    /// Examples:
    ///   ecommerce-rs migrate                    # Apply all pending migrations
    ///   ecommerce-rs migrate --dry-run          # Show pending migrations without applying
    ///   ecommerce-rs migrate --rollback 3       # Rollback the last 3 migrations
    Migrate {
        /// Show pending migrations without applying
        #[arg(long, conflicts_with = "rollback")]
        dry_run: bool,

        /// Number of migrations to rollback (1-100)
        #[arg(long, value_name = "STEPS", conflicts_with = "dry_run", value_parser = super::validation::validate_rollback_steps)]
        rollback: Option<u32>,
    },
    /// Insert reference data
    ///
    /// Creates the built-in roles and permissions, product brands and types,
    /// delivery methods and, when `seed.admin` is configured, the super
    /// admin account. Existing rows are left untouched, so the command can
    /// be run repeatedly.
    Seed,
}

/// Environment options
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Environment {
    #[value(name = "development", alias = "dev")]
    Development,
    #[value(name = "test")]
    Test,
    #[value(name = "staging", alias = "stage")]
    Staging,
    #[value(name = "production", alias = "prod")]
    Production,
}

/// Log level options
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    #[value(name = "error")]
    Error,
    #[value(name = "warn", alias = "warning")]
    Warn,
    #[value(name = "info")]
    Info,
    #[value(name = "debug")]
    Debug,
    #[value(name = "trace")]
    Trace,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl Cli {
    /// Checks argument combinations clap cannot express.
    pub fn validate(&self) -> Result<(), String> {
        match &self.command {
            Some(Commands::Migrate {
                dry_run: true,
                rollback: Some(_),
            }) => return Err("Cannot use --dry-run and --rollback together".to_string()),
            Some(Commands::Serve {
                host: Some(host),
                port: Some(port),
                ..
            }) if host == "0.0.0.0" && *port < 1024 => {
                return Err(format!(
                    "Binding to 0.0.0.0 on privileged port {port} typically requires root privileges"
                ));
            }
            _ => {}
        }

        if self.verbose && self.quiet {
            return Err("Cannot use --verbose and --quiet together".to_string());
        }

        Ok(())
    }

    /// The subcommand to run; a bare invocation serves.
    pub fn command_or_default(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Serve {
            host: None,
            port: None,
            log_level: None,
            dry_run: false,
        })
    }
}

impl From<LogLevel> for String {
    fn from(level: LogLevel) -> Self {
        level.as_str().to_string()
    }
}

impl From<Environment> for crate::config::Environment {
    fn from(env: Environment) -> Self {
        match env {
            Environment::Development => crate::config::Environment::Development,
            Environment::Test => crate::config::Environment::Test,
            Environment::Staging => crate::config::Environment::Staging,
            Environment::Production => crate::config::Environment::Production,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_help_flag() {
        let err = Cli::try_parse_from(["ecommerce-rs", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_version_flag() {
        let err = Cli::try_parse_from(["ecommerce-rs", "--version"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_default_behavior() {
        let cli = Cli::try_parse_from(["ecommerce-rs"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.verbose);
        assert!(!cli.quiet);
        assert!(cli.config.is_none());
        assert!(cli.env.is_none());
        assert!(matches!(
            cli.command_or_default(),
            Commands::Serve { dry_run: false, .. }
        ));
    }

    #[test]
    fn test_serve_command() {
        let cli = Cli::try_parse_from([
            "ecommerce-rs",
            "serve",
            "--host",
            "0.0.0.0",
            "--port",
            "8080",
            "--log-level",
            "warning",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Serve {
                host,
                port,
                log_level,
                dry_run,
            }) => {
                assert_eq!(host.as_deref(), Some("0.0.0.0"));
                assert_eq!(port, Some(8080));
                assert_eq!(log_level, Some(LogLevel::Warn));
                assert!(!dry_run);
            }
            other => panic!("Expected Serve command, got {other:?}"),
        }
    }

    #[test]
    fn test_migrate_command() {
        let cli = Cli::try_parse_from(["ecommerce-rs", "migrate", "--dry-run"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Commands::Migrate {
                dry_run: true,
                rollback: None
            })
        );
    }

    #[test]
    fn test_migrate_flags_conflict() {
        let err = Cli::try_parse_from(["ecommerce-rs", "migrate", "--dry-run", "--rollback", "2"])
            .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn test_seed_command() {
        let cli = Cli::try_parse_from(["ecommerce-rs", "seed"]).unwrap();
        assert_eq!(cli.command, Some(Commands::Seed));
    }

    #[test]
    fn test_environment_aliases() {
        for (arg, expected) in [
            ("dev", Environment::Development),
            ("stage", Environment::Staging),
            ("prod", Environment::Production),
            ("test", Environment::Test),
        ] {
            let cli = Cli::try_parse_from(["ecommerce-rs", "--env", arg]).unwrap();
            assert_eq!(cli.env, Some(expected), "alias {arg}");
        }
        assert_eq!(
            crate::config::Environment::from(Environment::Staging),
            crate::config::Environment::Staging
        );
    }

    #[test]
    fn test_conflicting_verbose_quiet() {
        let err = Cli::try_parse_from(["ecommerce-rs", "--verbose", "--quiet"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn test_validate_rejects_privileged_wildcard_bind() {
        let cli = Cli::try_parse_from(["ecommerce-rs", "serve", "--host", "0.0.0.0", "--port", "80"])
            .unwrap();
        assert!(cli.validate().is_err());

        let cli = Cli::try_parse_from(["ecommerce-rs", "serve", "--port", "80"]).unwrap();
        assert!(cli.validate().is_ok());
    }
}
