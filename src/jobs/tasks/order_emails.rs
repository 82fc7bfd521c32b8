use async_trait::async_trait;
use jiff::SignedDuration;
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::jobs::types::{JobContext, JobTask};

/// Sends queued order confirmation and status-change emails.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderEmailsTask {
    #[serde(default = "default_batch_size")]
    pub batch_size: i64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: i32,
    /// How long claimed rows stay invisible to other runs
    #[serde(default = "default_lease_seconds")]
    pub lease_seconds: u64,
}

fn default_batch_size() -> i64 {
    20
}

fn default_max_attempts() -> i32 {
    5
}

fn default_lease_seconds() -> u64 {
    120
}

#[async_trait]
impl JobTask for OrderEmailsTask {
    fn task_type() -> &'static str
    where
        Self: Sized,
    {
        "order_emails"
    }

    async fn execute(&self, ctx: JobContext) -> AppResult<()> {
        let lease = SignedDuration::from_secs(i64::try_from(self.lease_seconds).unwrap_or(i64::MAX));
        let report = ctx
            .services
            .notifications
            .dispatch_pending(self.batch_size, self.max_attempts, lease)
            .await?;

        if report.claimed > 0 {
            tracing::info!(
                job = %ctx.job_name,
                claimed = report.claimed,
                sent = report.sent,
                retrying = report.retrying,
                failed = report.failed,
                "Order emails dispatched"
            );
        }
        Ok(())
    }

    fn description(&self) -> Option<String> {
        Some(format!(
            "Send up to {} pending order emails, giving up after {} attempts",
            self.batch_size, self.max_attempts
        ))
    }
}
