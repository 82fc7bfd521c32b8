//! Range and format checks for every settings section

use crate::config::error::ConfigError;
use crate::config::settings::{
    CorsConfig, DatabaseConfig, EmailConfig, JobsConfig, JwtConfig, SecurityConfig, ServerConfig,
    Settings, UploadsConfig,
};

impl ServerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::validation(
                "server.port",
                "Port must be between 1 and 65535.",
            ));
        }
        if self.request_timeout == 0 {
            return Err(ConfigError::validation(
                "server.request_timeout",
                "Request timeout must be greater than 0 seconds.",
            ));
        }
        if self.keep_alive_timeout == 0 {
            return Err(ConfigError::validation(
                "server.keep_alive_timeout",
                "Keep-alive timeout must be greater than 0 seconds.",
            ));
        }
        if !is_http_url(&self.public_url) {
            return Err(ConfigError::validation(
                "server.public_url",
                "Public URL must start with http:// or https://",
            ));
        }
        Ok(())
    }
}

impl DatabaseConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.url.is_empty() {
            return Err(ConfigError::validation(
                "database.url",
                "Database URL is required. Set database.url or ECOMMERCE_DATABASE__URL.",
            ));
        }
        if !(self.url.starts_with("postgres://") || self.url.starts_with("postgresql://")) {
            return Err(ConfigError::validation(
                "database.url",
                "Expected a PostgreSQL URL: postgres://[user:password@]host[:port]/database",
            ));
        }
        if self.max_connections == 0 {
            return Err(ConfigError::validation(
                "database.max_connections",
                "Max connections must be greater than 0.",
            ));
        }
        if self.min_connections > self.max_connections {
            return Err(ConfigError::validation(
                "database.min_connections",
                format!(
                    "Min connections ({}) cannot exceed max connections ({}).",
                    self.min_connections, self.max_connections
                ),
            ));
        }
        if self.connection_timeout == 0 {
            return Err(ConfigError::validation(
                "database.connection_timeout",
                "Connection timeout must be greater than 0 seconds.",
            ));
        }
        Ok(())
    }
}

impl JwtConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.secret.len() < 32 {
            return Err(ConfigError::validation(
                "jwt.secret",
                "JWT secret must be at least 32 characters.",
            ));
        }
        if self.issuer.trim().is_empty() {
            return Err(ConfigError::validation("jwt.issuer", "Issuer cannot be empty."));
        }
        if self.audience.trim().is_empty() {
            return Err(ConfigError::validation(
                "jwt.audience",
                "Audience cannot be empty.",
            ));
        }
        if self.access_token_expiration <= 0 {
            return Err(ConfigError::validation(
                "jwt.access_token_expiration",
                "Access token expiration must be positive.",
            ));
        }
        if self.refresh_token_expiration <= self.access_token_expiration {
            return Err(ConfigError::validation(
                "jwt.refresh_token_expiration",
                "Refresh token expiration must be longer than access token expiration.",
            ));
        }
        Ok(())
    }
}

impl JobsConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.job_timeout == 0 {
            return Err(ConfigError::validation(
                "jobs.job_timeout",
                "Job timeout must be greater than 0 seconds.",
            ));
        }
        if self.retry_backoff_multiplier < 1.0 {
            return Err(ConfigError::validation(
                "jobs.retry_backoff_multiplier",
                "Backoff multiplier must be at least 1.0.",
            ));
        }
        if self.order_emails.batch_size <= 0 {
            return Err(ConfigError::validation(
                "jobs.order_emails.batch_size",
                "Batch size must be positive.",
            ));
        }
        if self.order_emails.max_attempts <= 0 {
            return Err(ConfigError::validation(
                "jobs.order_emails.max_attempts",
                "Max attempts must be positive.",
            ));
        }
        if self.token_cleanup.cart_ttl_days <= 0 {
            return Err(ConfigError::validation(
                "jobs.token_cleanup.cart_ttl_days",
                "Cart TTL must be at least one day.",
            ));
        }
        for (field, schedule) in [
            ("jobs.order_emails.schedule", &self.order_emails.schedule),
            ("jobs.token_cleanup.schedule", &self.token_cleanup.schedule),
        ] {
            let parts = schedule.split_whitespace().count();
            if !(6..=7).contains(&parts) {
                return Err(ConfigError::validation(
                    field,
                    format!("Cron expression '{}' must have 6 or 7 fields.", schedule),
                ));
            }
        }
        Ok(())
    }
}

impl CorsConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.allowed_origins.iter().find(|o| !is_http_url(o)) {
            Some(origin) => Err(ConfigError::validation(
                "cors.allowed_origins",
                format!("'{}' is not an http(s) origin.", origin),
            )),
            None => Ok(()),
        }
    }
}

impl UploadsConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.root.trim().is_empty() {
            return Err(ConfigError::validation("uploads.root", "Upload root cannot be empty."));
        }
        if self.max_bytes == 0 {
            return Err(ConfigError::validation(
                "uploads.max_bytes",
                "Maximum upload size must be greater than 0.",
            ));
        }
        if let Some(ext) = self
            .allowed_extensions
            .iter()
            .find(|e| !e.starts_with('.') || e.len() < 2)
        {
            return Err(ConfigError::validation(
                "uploads.allowed_extensions",
                format!("Extension '{}' must start with a dot.", ext),
            ));
        }
        Ok(())
    }
}

impl EmailConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.from_address.contains('@') {
            return Err(ConfigError::validation(
                "email.from_address",
                "Sender address must be an email address.",
            ));
        }
        if !is_http_url(&self.ui_url) {
            return Err(ConfigError::validation(
                "email.ui_url",
                "UI URL must start with http:// or https://",
            ));
        }
        if self.enabled && self.smtp_host.trim().is_empty() {
            return Err(ConfigError::validation(
                "email.smtp_host",
                "SMTP host is required when email is enabled.",
            ));
        }
        Ok(())
    }
}

impl SecurityConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_failed_access_attempts <= 0 {
            return Err(ConfigError::validation(
                "security.max_failed_access_attempts",
                "Must allow at least one attempt.",
            ));
        }
        if self.lockout_minutes <= 0 {
            return Err(ConfigError::validation(
                "security.lockout_minutes",
                "Lockout duration must be positive.",
            ));
        }
        if self.reset_token_minutes <= 0 {
            return Err(ConfigError::validation(
                "security.reset_token_minutes",
                "Reset token lifetime must be positive.",
            ));
        }
        Ok(())
    }
}

impl Settings {
    /// Validates every section; the first failure wins.
    ///
    /// The JWT section is checked separately by `serve`, so `migrate` and
    /// `seed` work without a signing secret.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.database.validate()?;
        self.logger.to_logger_config()?;
        self.jobs.validate()?;
        self.cors.validate()?;
        self.uploads.validate()?;
        self.email.validate()?;
        self.security.validate()?;
        Ok(())
    }
}

fn is_http_url(value: &str) -> bool {
    let rest = value
        .strip_prefix("http://")
        .or_else(|| value.strip_prefix("https://"));
    matches!(rest, Some(host) if !host.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_settings() -> Settings {
        let mut settings = Settings::default();
        settings.database.url = "postgres://localhost/ecommerce".into();
        settings.jwt.secret = "a".repeat(32);
        settings
    }

    #[test]
    fn test_defaults_with_database_url_are_valid() {
        assert!(valid_settings().validate().is_ok());
        assert!(valid_settings().jwt.validate().is_ok());
    }

    #[test]
    fn test_database_url_must_be_postgres() {
        let mut settings = valid_settings();
        settings.database.url = "mysql://localhost/db".into();
        assert_eq!(settings.validate().unwrap_err().field(), Some("database.url"));
    }

    #[test]
    fn test_min_connections_cannot_exceed_max() {
        let mut settings = valid_settings();
        settings.database.min_connections = 20;
        settings.database.max_connections = 5;
        assert_eq!(
            settings.validate().unwrap_err().field(),
            Some("database.min_connections")
        );
    }

    #[test]
    fn test_jwt_rules() {
        let mut jwt = valid_settings().jwt;
        jwt.secret = "short".into();
        assert_eq!(jwt.validate().unwrap_err().field(), Some("jwt.secret"));

        let mut jwt = valid_settings().jwt;
        jwt.refresh_token_expiration = jwt.access_token_expiration;
        assert_eq!(
            jwt.validate().unwrap_err().field(),
            Some("jwt.refresh_token_expiration")
        );
    }

    #[test]
    fn test_jobs_rules() {
        let mut settings = valid_settings();
        settings.jobs.order_emails.schedule = "* * * * *".into();
        assert_eq!(
            settings.validate().unwrap_err().field(),
            Some("jobs.order_emails.schedule")
        );

        let mut settings = valid_settings();
        settings.jobs.order_emails.batch_size = 0;
        assert_eq!(
            settings.validate().unwrap_err().field(),
            Some("jobs.order_emails.batch_size")
        );
    }

    #[test]
    fn test_upload_extensions_need_dot() {
        let mut settings = valid_settings();
        settings.uploads.allowed_extensions.push("tiff".into());
        assert_eq!(
            settings.validate().unwrap_err().field(),
            Some("uploads.allowed_extensions")
        );
    }

    #[test]
    fn test_cors_origins_must_be_urls() {
        let mut settings = valid_settings();
        settings.cors.allowed_origins = vec!["localhost:4200".into()];
        assert_eq!(
            settings.validate().unwrap_err().field(),
            Some("cors.allowed_origins")
        );
    }

    #[test]
    fn test_enabled_email_needs_host() {
        let mut settings = valid_settings();
        settings.email.enabled = true;
        settings.email.smtp_host = " ".into();
        assert_eq!(settings.validate().unwrap_err().field(), Some("email.smtp_host"));
    }

    #[test]
    fn test_security_rules() {
        let mut settings = valid_settings();
        settings.security.lockout_minutes = 0;
        assert_eq!(
            settings.validate().unwrap_err().field(),
            Some("security.lockout_minutes")
        );
    }

    #[test]
    fn test_is_http_url() {
        assert!(is_http_url("http://localhost:4200"));
        assert!(is_http_url("https://shop.example.com"));
        assert!(!is_http_url("https://"));
        assert!(!is_http_url("ftp://host"));
    }
}
