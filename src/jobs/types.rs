use std::fmt;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::Services;

/// Job execution context passed to tasks
#[derive(Clone)]
pub struct JobContext {
    pub execution_id: Uuid,
    pub job_name: String,
    pub retry_attempt: u32,
    pub services: Services,
    pub cancellation_token: CancellationToken,
}

/// Outcome of one scheduled run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Success,
    Failed,
    Timeout,
    /// The previous run of the same job was still in progress
    Skipped,
    Cancelled,
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JobStatus::Success => "success",
            JobStatus::Failed => "failed",
            JobStatus::Timeout => "timeout",
            JobStatus::Skipped => "skipped",
            JobStatus::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// Trait that all job tasks must implement
#[async_trait]
pub trait JobTask: Send + Sync + fmt::Debug {
    /// Unique identifier for this task type
    fn task_type() -> &'static str
    where
        Self: Sized;

    async fn execute(&self, ctx: JobContext) -> AppResult<()>;

    fn description(&self) -> Option<String> {
        None
    }
}
