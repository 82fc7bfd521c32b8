//! Server module for managing HTTP server lifecycle
//!
//! This module handles server initialization, startup, and graceful shutdown.

use tokio::net::TcpListener;
use tokio::signal;

use crate::api::routes::create_router;
use crate::config::{Environment, settings::Settings};
use crate::db::{establish_async_connection_pool, run_pending_migrations, seed::seed_reference_data};
use crate::jobs::{JobRegistry, JobScheduler, ScheduledJob};
use crate::repositories::Repositories;
use crate::state::AppState;

/// HTTP server manager
pub struct Server {
    settings: Settings,
}

impl Server {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    /// Start the server and run until shutdown signal
    ///
    /// This method:
    /// 1. Validates configuration
    /// 2. Initializes the database pool, migrating and seeding when configured
    /// 3. Starts the background job scheduler
    /// 4. Serves HTTP until Ctrl+C or SIGTERM, then stops the scheduler
    pub async fn run(self) -> anyhow::Result<()> {
        let settings = self.settings;

        tracing::info!(
            app_name = %settings.application.name,
            app_version = %settings.application.version,
            environment = %Environment::from_env().as_str(),
            "Application starting"
        );

        tracing::info!(
            host = %settings.server.host,
            port = %settings.server.port,
            public_url = %settings.server.public_url,
            "Server configuration loaded"
        );

        // Log database configuration (without sensitive URL details)
        tracing::info!(
            max_connections = %settings.database.max_connections,
            min_connections = %settings.database.min_connections,
            connection_timeout = %settings.database.connection_timeout,
            auto_migrate = settings.database.auto_migrate,
            seed_on_start = settings.database.seed_on_start,
            "Database configuration loaded"
        );

        tracing::info!(
            email_enabled = settings.email.enabled,
            jobs_enabled = settings.jobs.enabled,
            uploads_root = %settings.uploads.root,
            "Feature configuration loaded"
        );

        settings
            .validate()
            .and_then(|_| settings.jwt.validate())
            .map_err(|e| {
                tracing::error!(error = %e, "Configuration validation failed");
                anyhow::anyhow!("Configuration validation failed: {e}")
            })?;

        if settings.database.auto_migrate {
            let applied = run_pending_migrations(&settings.database.url).await?;
            tracing::info!(count = applied.len(), migrations = ?applied, "Migrations applied");
        }

        tracing::info!("Initializing database connection pool...");
        let pool = establish_async_connection_pool(&settings.database).await?;
        tracing::info!("Database connection pool initialized");

        if settings.database.seed_on_start {
            let report = seed_reference_data(&Repositories::new(pool.clone()), &settings.seed).await?;
            tracing::info!(?report, "Reference data seeded");
        }

        let address = settings.server.address();
        let jobs = ScheduledJob::from_config(&settings.jobs);
        let state = AppState::new(pool, settings)?;

        let scheduler = if jobs.is_empty() {
            tracing::info!("Background jobs disabled");
            None
        } else {
            let scheduler =
                JobScheduler::new(state.services.clone(), JobRegistry::with_default_tasks(), jobs)
                    .await?;
            scheduler.start().await?;
            Some(scheduler)
        };

        let router = create_router(state);

        let listener = TcpListener::bind(&address).await.map_err(|e| {
            tracing::error!(error = %e, address = %address, "Failed to bind to address");
            anyhow::anyhow!("Failed to bind to {}: {}", address, e)
        })?;

        tracing::info!(address = %address, "Server listening");

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        if let Some(scheduler) = scheduler {
            if let Err(e) = scheduler.stop().await {
                tracing::warn!(error = %e, "Job scheduler did not stop cleanly");
            }
        }

        tracing::info!("Server shutdown complete");

        Ok(())
    }
}

/// Waits for Ctrl+C or SIGTERM. A handler that cannot be installed is
/// logged and never fires.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
