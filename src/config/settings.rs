//! Settings loaded from TOML files and `ECOMMERCE_*` environment variables

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::error::ConfigError;
use crate::logger::{ConsoleConfig, FileConfig, LogFormat, LoggerConfig, RotationConfig};

// ============================================================================
// Default value functions
// ============================================================================

fn default_app_name() -> String {
    "ecommerce-rs".to_string()
}

fn default_app_version() -> String {
    crate::pkg_version().to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_request_timeout() -> u64 {
    30
}

fn default_keep_alive_timeout() -> u64 {
    75
}

fn default_public_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_connection_timeout() -> u64 {
    30
}

fn default_issuer() -> String {
    "ecommerce-api".to_string()
}

fn default_audience() -> String {
    "ecommerce-client".to_string()
}

fn default_access_token_expiration() -> i64 {
    1
}

fn default_refresh_token_expiration() -> i64 {
    168 // 7 days
}

fn default_leeway() -> u64 {
    60
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_log_path() -> String {
    "logs/ecommerce.log".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_rotation_strategy() -> String {
    "size".to_string()
}

fn default_max_size() -> u64 {
    10 * 1024 * 1024
}

fn default_max_files() -> usize {
    5
}

fn default_job_timeout() -> u64 {
    120
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay() -> u64 {
    5
}

fn default_retry_backoff() -> f64 {
    2.0
}

fn default_order_emails_schedule() -> String {
    "0 * * * * *".to_string()
}

fn default_batch_size() -> i64 {
    20
}

fn default_max_attempts() -> i32 {
    5
}

fn default_token_cleanup_schedule() -> String {
    "0 30 3 * * *".to_string()
}

fn default_cart_ttl_days() -> i64 {
    30
}

fn default_allowed_origins() -> Vec<String> {
    vec!["http://localhost:4200".to_string()]
}

fn default_uploads_root() -> String {
    "wwwroot".to_string()
}

fn default_max_upload_bytes() -> u64 {
    5 * 1024 * 1024
}

fn default_allowed_extensions() -> Vec<String> {
    [".jpg", ".jpeg", ".png", ".gif", ".bmp", ".webp"]
        .iter()
        .map(|e| e.to_string())
        .collect()
}

fn default_smtp_host() -> String {
    "localhost".to_string()
}

fn default_smtp_port() -> u16 {
    587
}

fn default_from_address() -> String {
    "no-reply@ecommerce.local".to_string()
}

fn default_from_name() -> String {
    "E-Commerce Store".to_string()
}

fn default_ui_url() -> String {
    "http://localhost:4200".to_string()
}

fn default_max_failed_access_attempts() -> i32 {
    5
}

fn default_lockout_minutes() -> i64 {
    5
}

fn default_reset_token_minutes() -> i64 {
    60
}

// ============================================================================
// Sections
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationConfig {
    #[serde(default = "default_app_name")]
    pub name: String,

    #[serde(default = "default_app_version")]
    pub version: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            version: default_app_version(),
        }
    }
}

/// Axum HTTP server configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,

    /// Keep-alive timeout in seconds
    #[serde(default = "default_keep_alive_timeout")]
    pub keep_alive_timeout: u64,

    /// Base URL clients use to reach this server; prefixes image paths
    #[serde(default = "default_public_url")]
    pub public_url: String,
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout: default_request_timeout(),
            keep_alive_timeout: default_keep_alive_timeout(),
            public_url: default_public_url(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Connection timeout in seconds
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout: u64,

    /// Run pending migrations before serving
    #[serde(default)]
    pub auto_migrate: bool,

    /// Insert reference data (roles, brands, types, delivery methods) before serving
    #[serde(default)]
    pub seed_on_start: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connection_timeout: default_connection_timeout(),
            auto_migrate: false,
            seed_on_start: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtConfig {
    /// HS256 signing key; supply through `ECOMMERCE_JWT__SECRET` outside development
    #[serde(default)]
    pub secret: String,

    #[serde(default = "default_issuer")]
    pub issuer: String,

    #[serde(default = "default_audience")]
    pub audience: String,

    /// Access token lifetime in hours
    #[serde(default = "default_access_token_expiration")]
    pub access_token_expiration: i64,

    /// Refresh token lifetime in hours
    #[serde(default = "default_refresh_token_expiration")]
    pub refresh_token_expiration: i64,

    /// Clock skew tolerated when checking `exp`, in seconds
    #[serde(default = "default_leeway")]
    pub leeway: u64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            issuer: default_issuer(),
            audience: default_audience(),
            access_token_expiration: default_access_token_expiration(),
            refresh_token_expiration: default_refresh_token_expiration(),
            leeway: default_leeway(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_true")]
    pub colored: bool,
}

impl Default for ConsoleSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            colored: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotationSettings {
    /// "size" or "daily"
    #[serde(default = "default_rotation_strategy")]
    pub strategy: String,

    #[serde(default = "default_max_size")]
    pub max_size: u64,

    #[serde(default = "default_max_files")]
    pub max_files: usize,

    #[serde(default)]
    pub compress: bool,
}

impl Default for RotationSettings {
    fn default() -> Self {
        Self {
            strategy: default_rotation_strategy(),
            max_size: default_max_size(),
            max_files: default_max_files(),
            compress: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSettings {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_log_path")]
    pub path: String,

    #[serde(default = "default_true")]
    pub append: bool,

    /// "full", "compact" or "json"
    #[serde(default = "default_log_format")]
    pub format: String,

    #[serde(default)]
    pub rotation: RotationSettings,
}

impl Default for FileSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            path: default_log_path(),
            append: true,
            format: default_log_format(),
            rotation: RotationSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggerSettings {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub console: ConsoleSettings,

    #[serde(default)]
    pub file: FileSettings,
}

impl Default for LoggerSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            console: ConsoleSettings::default(),
            file: FileSettings::default(),
        }
    }
}

impl LoggerSettings {
    /// Converts the file representation into the runtime logger config.
    pub fn to_logger_config(&self) -> Result<LoggerConfig, ConfigError> {
        let format: LogFormat = self
            .file
            .format
            .parse()
            .map_err(|e: crate::logger::LoggerError| {
                ConfigError::validation("logger.file.format", e.to_string())
            })?;

        let rotation = RotationConfig {
            strategy: self.file.rotation.strategy.parse().map_err(
                |e: crate::logger::LoggerError| {
                    ConfigError::validation("logger.file.rotation.strategy", e.to_string())
                },
            )?,
            max_size: self.file.rotation.max_size,
            max_files: self.file.rotation.max_files,
            compress: self.file.rotation.compress,
        };

        let file = FileConfig {
            enabled: self.file.enabled,
            path: PathBuf::from(&self.file.path),
            append: self.file.append,
            format,
            rotation,
        };

        let console = ConsoleConfig {
            enabled: self.console.enabled,
            colored: self.console.colored,
        };

        LoggerConfig::new(self.level.clone(), console, file)
            .map_err(|e| ConfigError::validation("logger", e.to_string()))
    }
}

/// Dispatch of queued order notification emails
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderEmailsJobConfig {
    /// Six-field cron expression (seconds first)
    #[serde(default = "default_order_emails_schedule")]
    pub schedule: String,

    /// Notifications claimed per run
    #[serde(default = "default_batch_size")]
    pub batch_size: i64,

    /// Send attempts before a notification is marked failed
    #[serde(default = "default_max_attempts")]
    pub max_attempts: i32,
}

impl Default for OrderEmailsJobConfig {
    fn default() -> Self {
        Self {
            schedule: default_order_emails_schedule(),
            batch_size: default_batch_size(),
            max_attempts: default_max_attempts(),
        }
    }
}

/// Purge of expired tokens and abandoned carts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenCleanupJobConfig {
    #[serde(default = "default_token_cleanup_schedule")]
    pub schedule: String,

    /// Carts untouched for this many days are deleted
    #[serde(default = "default_cart_ttl_days")]
    pub cart_ttl_days: i64,
}

impl Default for TokenCleanupJobConfig {
    fn default() -> Self {
        Self {
            schedule: default_token_cleanup_schedule(),
            cart_ttl_days: default_cart_ttl_days(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Per-run timeout in seconds
    #[serde(default = "default_job_timeout")]
    pub job_timeout: u64,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Initial retry delay in seconds
    #[serde(default = "default_retry_delay")]
    pub retry_delay: u64,

    #[serde(default = "default_retry_backoff")]
    pub retry_backoff_multiplier: f64,

    #[serde(default)]
    pub order_emails: OrderEmailsJobConfig,

    #[serde(default)]
    pub token_cleanup: TokenCleanupJobConfig,
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            job_timeout: default_job_timeout(),
            max_retries: default_max_retries(),
            retry_delay: default_retry_delay(),
            retry_backoff_multiplier: default_retry_backoff(),
            order_emails: OrderEmailsJobConfig::default(),
            token_cleanup: TokenCleanupJobConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Origins allowed to send credentialed requests
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: default_allowed_origins(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadsConfig {
    /// Directory that holds `images/`; served under `/images`
    #[serde(default = "default_uploads_root")]
    pub root: String,

    #[serde(default = "default_max_upload_bytes")]
    pub max_bytes: u64,

    /// Lower-case extensions including the dot
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,
}

impl Default for UploadsConfig {
    fn default() -> Self {
        Self {
            root: default_uploads_root(),
            max_bytes: default_max_upload_bytes(),
            allowed_extensions: default_allowed_extensions(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailConfig {
    /// When false, emails are written to the log instead of sent
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_smtp_host")]
    pub smtp_host: String,

    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,

    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub password: String,

    #[serde(default = "default_from_address")]
    pub from_address: String,

    #[serde(default = "default_from_name")]
    pub from_name: String,

    /// Storefront base URL used in password reset links
    #[serde(default = "default_ui_url")]
    pub ui_url: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            smtp_host: default_smtp_host(),
            smtp_port: default_smtp_port(),
            username: String::new(),
            password: String::new(),
            from_address: default_from_address(),
            from_name: default_from_name(),
            ui_url: default_ui_url(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Failed logins before the account is locked
    #[serde(default = "default_max_failed_access_attempts")]
    pub max_failed_access_attempts: i32,

    #[serde(default = "default_lockout_minutes")]
    pub lockout_minutes: i64,

    /// Lifetime of password reset tokens in minutes
    #[serde(default = "default_reset_token_minutes")]
    pub reset_token_minutes: i64,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_failed_access_attempts: default_max_failed_access_attempts(),
            lockout_minutes: default_lockout_minutes(),
            reset_token_minutes: default_reset_token_minutes(),
        }
    }
}

/// Optional super admin account created by the `seed` command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SeedConfig {
    #[serde(default)]
    pub admin_email: Option<String>,

    #[serde(default)]
    pub admin_username: Option<String>,

    #[serde(default)]
    pub admin_password: Option<String>,
}

// ============================================================================
// Main Settings Structure
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub application: ApplicationConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub jwt: JwtConfig,

    #[serde(default)]
    pub logger: LoggerSettings,

    #[serde(default)]
    pub jobs: JobsConfig,

    #[serde(default)]
    pub cors: CorsConfig,

    #[serde(default)]
    pub uploads: UploadsConfig,

    #[serde(default)]
    pub email: EmailConfig,

    #[serde(default)]
    pub security: SecurityConfig,

    #[serde(default)]
    pub seed: SeedConfig,
}
