use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::RwLock;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::jobs::models::ScheduledJob;
use crate::jobs::types::{JobContext, JobStatus, JobTask};
use crate::services::Services;

/// Tracks which jobs are running so a slow run never overlaps the next tick.
#[derive(Clone, Default)]
pub struct ConcurrencyTracker {
    running: Arc<RwLock<HashSet<String>>>,
}

impl ConcurrencyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the job as running; false when it already is.
    pub async fn try_start(&self, job_name: &str) -> bool {
        self.running.write().await.insert(job_name.to_string())
    }

    pub async fn finish(&self, job_name: &str) {
        self.running.write().await.remove(job_name);
    }
}

/// Executes jobs with retry, timeout, and overlap control
pub struct JobExecutor {
    services: Services,
    concurrency: ConcurrencyTracker,
    shutdown: CancellationToken,
}

impl JobExecutor {
    pub fn new(services: Services, shutdown: CancellationToken) -> Self {
        Self {
            services,
            concurrency: ConcurrencyTracker::new(),
            shutdown,
        }
    }

    pub async fn execute_job(&self, job: &ScheduledJob, task: Box<dyn JobTask>) -> AppResult<JobStatus> {
        if !self.concurrency.try_start(&job.job_name).await {
            tracing::warn!(job = %job.job_name, "Previous run still in progress, skipping");
            return Ok(JobStatus::Skipped);
        }

        let result = self.execute_with_retry(job, task.as_ref()).await;
        self.concurrency.finish(&job.job_name).await;
        result
    }

    async fn execute_with_retry(&self, job: &ScheduledJob, task: &dyn JobTask) -> AppResult<JobStatus> {
        let mut last_error = None;

        for attempt in 0..=job.max_retries {
            if self.shutdown.is_cancelled() {
                return Ok(JobStatus::Cancelled);
            }

            let execution_id = Uuid::new_v4();
            let start_time = Instant::now();
            let ctx = JobContext {
                execution_id,
                job_name: job.job_name.clone(),
                retry_attempt: attempt,
                services: self.services.clone(),
                cancellation_token: self.shutdown.child_token(),
            };

            let result = tokio::time::timeout(job.timeout, task.execute(ctx)).await;
            let duration_ms = start_time.elapsed().as_millis() as u64;

            match result {
                Ok(Ok(())) => {
                    tracing::debug!(
                        job = %job.job_name,
                        %execution_id,
                        attempt,
                        duration_ms,
                        status = %JobStatus::Success,
                        "Job run finished"
                    );
                    return Ok(JobStatus::Success);
                }
                Ok(Err(e)) => {
                    tracing::warn!(
                        job = %job.job_name,
                        %execution_id,
                        attempt,
                        duration_ms,
                        error = %e,
                        "Job run failed"
                    );
                    last_error = Some(e.to_string());

                    if attempt < job.max_retries {
                        let delay = job.retry_delay_for(attempt);
                        tokio::select! {
                            _ = tokio::time::sleep(delay) => {}
                            _ = self.shutdown.cancelled() => return Ok(JobStatus::Cancelled),
                        }
                    }
                }
                Err(_) => {
                    tracing::error!(
                        job = %job.job_name,
                        %execution_id,
                        attempt,
                        timeout_secs = job.timeout.as_secs(),
                        status = %JobStatus::Timeout,
                        "Job run timed out"
                    );
                    return Err(AppError::Internal {
                        source: anyhow::anyhow!(
                            "Job {} timed out after {}s",
                            job.job_name,
                            job.timeout.as_secs()
                        ),
                    });
                }
            }
        }

        Err(AppError::Internal {
            source: anyhow::anyhow!(
                "Job {} failed after {} attempt(s): {}",
                job.job_name,
                job.max_retries + 1,
                last_error.unwrap_or_else(|| "Unknown error".to_string())
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::json;

    use crate::config::Settings;
    use crate::state::AppState;

    #[derive(Debug)]
    struct FlakyTask {
        failures_left: AtomicU32,
        calls: Arc<AtomicU32>,
        sleep: Duration,
    }

    impl FlakyTask {
        fn new(failures: u32, calls: Arc<AtomicU32>) -> Self {
            Self {
                failures_left: AtomicU32::new(failures),
                calls,
                sleep: Duration::ZERO,
            }
        }
    }

    #[async_trait]
    impl JobTask for FlakyTask {
        fn task_type() -> &'static str {
            "flaky"
        }

        async fn execute(&self, _ctx: JobContext) -> AppResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.sleep).await;
            let left = self.failures_left.load(Ordering::SeqCst);
            if left > 0 {
                self.failures_left.store(left - 1, Ordering::SeqCst);
                return Err(AppError::internal("boom"));
            }
            Ok(())
        }
    }

    fn job(max_retries: u32, timeout: Duration) -> ScheduledJob {
        ScheduledJob {
            job_name: "flaky".into(),
            job_type: "flaky".into(),
            cron_expression: "* * * * * *".into(),
            payload: json!({}),
            max_retries,
            retry_delay: Duration::from_millis(1),
            retry_backoff_multiplier: 1.0,
            timeout,
        }
    }

    fn executor() -> JobExecutor {
        let state = AppState::for_tests(Settings::default());
        JobExecutor::new(state.services, CancellationToken::new())
    }

    #[tokio::test]
    async fn test_retries_until_success() {
        let calls = Arc::new(AtomicU32::new(0));
        let task = Box::new(FlakyTask::new(2, calls.clone()));
        let status = executor()
            .execute_job(&job(3, Duration::from_secs(5)), task)
            .await
            .unwrap();
        assert_eq!(status, JobStatus::Success);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let calls = Arc::new(AtomicU32::new(0));
        let task = Box::new(FlakyTask::new(10, calls.clone()));
        let result = executor().execute_job(&job(1, Duration::from_secs(5)), task).await;
        assert!(result.unwrap_err().to_string().contains("Internal"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_timeout_is_not_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let mut task = FlakyTask::new(0, calls.clone());
        task.sleep = Duration::from_secs(5);
        let result = executor()
            .execute_job(&job(3, Duration::from_millis(20)), Box::new(task))
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_overlapping_run_is_skipped() {
        let executor = executor();
        assert!(executor.concurrency.try_start("flaky").await);

        let calls = Arc::new(AtomicU32::new(0));
        let status = executor
            .execute_job(&job(0, Duration::from_secs(5)), Box::new(FlakyTask::new(0, calls.clone())))
            .await
            .unwrap();
        assert_eq!(status, JobStatus::Skipped);
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        executor.concurrency.finish("flaky").await;
        assert!(executor.concurrency.try_start("flaky").await);
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let state = AppState::for_tests(Settings::default());
        let token = CancellationToken::new();
        token.cancel();
        let executor = JobExecutor::new(state.services, token);

        let calls = Arc::new(AtomicU32::new(0));
        let status = executor
            .execute_job(&job(0, Duration::from_secs(5)), Box::new(FlakyTask::new(0, calls.clone())))
            .await
            .unwrap();
        assert_eq!(status, JobStatus::Cancelled);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
