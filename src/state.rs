//! Application state for Axum web framework.
//!
//! Contains shared services and resources that are accessible
//! across all request handlers and background jobs.

use std::sync::Arc;

use crate::config::{JwtConfig, Settings};
use crate::db::AsyncDbPool;
use crate::error::AppResult;
use crate::repositories::Repositories;
use crate::services::Services;
use crate::services::email::{EmailSender, build_email_sender};

/// Cloning is cheap: the pool, services and settings are all shared.
#[derive(Clone)]
pub struct AppState {
    pub services: Services,
    pub db_pool: AsyncDbPool,
    pub jwt_config: JwtConfig,
    pub settings: Arc<Settings>,
}

impl AppState {
    /// Wires repositories and services with the email sender chosen by
    /// `settings.email`.
    pub fn new(pool: AsyncDbPool, settings: Settings) -> AppResult<Self> {
        let email = build_email_sender(&settings.email)?;
        Ok(Self::with_email_sender(pool, settings, email))
    }

    pub fn with_email_sender(
        pool: AsyncDbPool,
        settings: Settings,
        email: Arc<dyn EmailSender>,
    ) -> Self {
        let repos = Repositories::new(pool.clone());
        let services = Services::new(repos, &settings, email);
        Self {
            services,
            db_pool: pool,
            jwt_config: settings.jwt.clone(),
            settings: Arc::new(settings),
        }
    }

    /// State over a pool that never connects, for tests that stop short of
    /// the database.
    #[cfg(test)]
    pub(crate) fn for_tests(settings: Settings) -> Self {
        use diesel_async::AsyncPgConnection;
        use diesel_async::pooled_connection::AsyncDieselConnectionManager;
        use diesel_async::pooled_connection::bb8::Pool;

        use crate::services::email::LogEmailSender;

        let manager =
            AsyncDieselConnectionManager::<AsyncPgConnection>::new("postgres://localhost/unused");
        let pool = Pool::builder()
            .connection_timeout(std::time::Duration::from_millis(100))
            .build_unchecked(manager);
        Self::with_email_sender(pool, settings, Arc::new(LogEmailSender::new("test@localhost")))
    }
}
