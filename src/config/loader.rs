//! Layered configuration loading

use std::path::{Path, PathBuf};

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File, FileFormat};

use crate::config::environment::Environment as AppEnvironment;
use crate::config::error::ConfigError;
use crate::config::settings::Settings;

const CONFIG_DIR_ENV: &str = "ECOMMERCE_CONFIG_DIR";
const CONFIG_FILE_ENV: &str = "ECOMMERCE_CONFIG_FILE";
const DEFAULT_CONFIG_DIR: &str = "config";
const ENV_PREFIX: &str = "ECOMMERCE";
const ENV_SEPARATOR: &str = "__";

/// Where the file layers come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// `default.toml`, then `{env}.toml`, then `local.toml`
    Layered(PathBuf),
    /// One explicit file, no further file layers
    SingleFile(PathBuf),
}

/// Loads `Settings` from TOML layers topped by `ECOMMERCE_*` variables.
///
/// `ECOMMERCE_SERVER__PORT=8080` overrides `server.port`.
#[derive(Debug)]
pub struct ConfigLoader {
    source: ConfigSource,
    environment: AppEnvironment,
}

impl ConfigLoader {
    /// Builds a loader from `ECOMMERCE_CONFIG_DIR` / `ECOMMERCE_CONFIG_FILE`
    /// and `ECOMMERCE_APP_ENV`.
    pub fn new() -> Result<Self, ConfigError> {
        let dir = std::env::var(CONFIG_DIR_ENV).ok();
        let file = std::env::var(CONFIG_FILE_ENV).ok();

        let source = match (dir, file) {
            (Some(_), Some(_)) => {
                return Err(ConfigError::mutual_exclusivity(format!(
                    "{CONFIG_DIR_ENV} and {CONFIG_FILE_ENV} cannot both be set"
                )));
            }
            (_, Some(file)) => ConfigSource::SingleFile(PathBuf::from(file)),
            (Some(dir), None) => ConfigSource::Layered(PathBuf::from(dir)),
            (None, None) => ConfigSource::Layered(PathBuf::from(DEFAULT_CONFIG_DIR)),
        };

        Ok(Self {
            source,
            environment: AppEnvironment::from_env(),
        })
    }

    /// Loads only `path` (plus environment variables).
    pub fn with_file(path: impl Into<PathBuf>) -> Self {
        Self {
            source: ConfigSource::SingleFile(path.into()),
            environment: AppEnvironment::from_env(),
        }
    }

    pub fn with_environment(mut self, environment: AppEnvironment) -> Self {
        self.environment = environment;
        self
    }

    pub fn environment(&self) -> AppEnvironment {
        self.environment
    }

    pub fn source(&self) -> &ConfigSource {
        &self.source
    }

    /// Loads and validates the settings.
    pub fn load(&self) -> Result<Settings, ConfigError> {
        let settings: Settings = self.build_config()?.try_deserialize().map_err(|e| {
            ConfigError::ParseError(format!("Failed to deserialize configuration: {}", e))
        })?;

        settings.validate()?;
        Ok(settings)
    }

    fn build_config(&self) -> Result<Config, ConfigError> {
        let builder = match &self.source {
            ConfigSource::SingleFile(path) => add_file(Config::builder(), path, true)?,
            ConfigSource::Layered(dir) => {
                let builder = add_file(Config::builder(), &dir.join("default.toml"), true)?;
                let env_file = dir.join(format!("{}.toml", self.environment.as_str()));
                let builder = add_file(builder, &env_file, false)?;
                add_file(builder, &dir.join("local.toml"), false)?
            }
        };

        builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator(ENV_SEPARATOR)
                    .list_separator(",")
                    .with_list_parse_key("cors.allowed_origins")
                    .with_list_parse_key("uploads.allowed_extensions")
                    .ignore_empty(true)
                    .try_parsing(true),
            )
            .build()
            .map_err(ConfigError::from)
    }
}

fn add_file(
    builder: ConfigBuilder<DefaultState>,
    path: &Path,
    required: bool,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    if required && !path.exists() {
        return Err(ConfigError::file_not_found(path.display().to_string()));
    }

    let name = path
        .to_str()
        .ok_or_else(|| ConfigError::ParseError(format!("Non UTF-8 path: {}", path.display())))?;

    Ok(builder.add_source(File::new(name, FileFormat::Toml).required(required)))
}
