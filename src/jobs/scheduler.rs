use std::sync::Arc;

use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler as TokioCronScheduler};
use tokio_util::sync::CancellationToken;

use crate::error::{AppError, AppResult};
use crate::jobs::executor::JobExecutor;
use crate::jobs::models::ScheduledJob;
use crate::jobs::registry::JobRegistry;
use crate::services::Services;

/// Wrapper around tokio-cron-scheduler running the configured jobs
pub struct JobScheduler {
    scheduler: Arc<Mutex<TokioCronScheduler>>,
    executor: Arc<JobExecutor>,
    registry: Arc<JobRegistry>,
    jobs: Vec<ScheduledJob>,
    shutdown: CancellationToken,
}

impl JobScheduler {
    pub async fn new(
        services: Services,
        registry: JobRegistry,
        jobs: Vec<ScheduledJob>,
    ) -> AppResult<Self> {
        let scheduler = TokioCronScheduler::new()
            .await
            .map_err(|e| AppError::Internal {
                source: anyhow::Error::from(e),
            })?;
        let shutdown = CancellationToken::new();

        Ok(Self {
            scheduler: Arc::new(Mutex::new(scheduler)),
            executor: Arc::new(JobExecutor::new(services, shutdown.clone())),
            registry: Arc::new(registry),
            jobs,
            shutdown,
        })
    }

    /// Schedule every configured job and start ticking
    pub async fn start(&self) -> AppResult<()> {
        for job in &self.jobs {
            self.schedule_job(job.clone()).await?;
        }
        self.scheduler
            .lock()
            .await
            .start()
            .await
            .map_err(|e| AppError::Internal {
                source: anyhow::Error::from(e),
            })?;
        tracing::info!(jobs = self.jobs.len(), "Job scheduler started");
        Ok(())
    }

    /// Cancel in-flight retries and stop the scheduler
    pub async fn stop(&self) -> AppResult<()> {
        self.shutdown.cancel();
        self.scheduler
            .lock()
            .await
            .shutdown()
            .await
            .map_err(|e| AppError::Internal {
                source: anyhow::Error::from(e),
            })?;
        tracing::info!("Job scheduler stopped");
        Ok(())
    }

    async fn schedule_job(&self, job: ScheduledJob) -> AppResult<()> {
        // Payload is validated once here, then rebuilt per tick.
        let task = self.registry.create_task(&job.job_type, job.payload.clone())?;
        tracing::info!(
            job = %job.job_name,
            cron = %job.cron_expression,
            description = task.description().unwrap_or_default(),
            "Scheduling job"
        );

        let executor = Arc::clone(&self.executor);
        let registry = Arc::clone(&self.registry);
        let job_clone = job.clone();

        let cron_job = Job::new_async(job.cron_expression.as_str(), move |_uuid, _lock| {
            let executor = Arc::clone(&executor);
            let registry = Arc::clone(&registry);
            let job = job_clone.clone();

            Box::pin(async move {
                match registry.create_task(&job.job_type, job.payload.clone()) {
                    Ok(task) => {
                        if let Err(e) = executor.execute_job(&job, task).await {
                            tracing::error!(job = %job.job_name, error = %e, "Job execution failed");
                        }
                    }
                    Err(e) => {
                        tracing::error!(job = %job.job_name, error = %e, "Failed to create task");
                    }
                }
            })
        })
        .map_err(|e| AppError::Validation {
            field: format!("jobs.{}.schedule", job.job_name),
            reason: format!("Invalid cron expression: {e}"),
        })?;

        self.scheduler
            .lock()
            .await
            .add(cron_job)
            .await
            .map_err(|e| AppError::Internal {
                source: anyhow::Error::from(e),
            })?;

        Ok(())
    }
}
