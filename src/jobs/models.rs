use std::time::Duration;

use serde_json::{Value as JsonValue, json};

use crate::config::JobsConfig;
use crate::jobs::tasks::{OrderEmailsTask, TokenCleanupTask};
use crate::jobs::types::JobTask;

/// A cron schedule bound to a task type and its payload.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledJob {
    pub job_name: String,
    pub job_type: String,
    pub cron_expression: String,
    pub payload: JsonValue,
    pub max_retries: u32,
    pub retry_delay: Duration,
    pub retry_backoff_multiplier: f64,
    pub timeout: Duration,
}

impl ScheduledJob {
    /// The configured jobs; empty when jobs are disabled.
    pub fn from_config(config: &JobsConfig) -> Vec<Self> {
        if !config.enabled {
            return Vec::new();
        }

        let job = |job_type: &str, cron: &str, payload: JsonValue| ScheduledJob {
            job_name: job_type.to_string(),
            job_type: job_type.to_string(),
            cron_expression: cron.to_string(),
            payload,
            max_retries: config.max_retries,
            retry_delay: Duration::from_secs(config.retry_delay),
            retry_backoff_multiplier: config.retry_backoff_multiplier,
            timeout: Duration::from_secs(config.job_timeout),
        };

        vec![
            job(
                OrderEmailsTask::task_type(),
                &config.order_emails.schedule,
                json!({
                    "batch_size": config.order_emails.batch_size,
                    "max_attempts": config.order_emails.max_attempts,
                    "lease_seconds": config.job_timeout,
                }),
            ),
            job(
                TokenCleanupTask::task_type(),
                &config.token_cleanup.schedule,
                json!({ "cart_ttl_days": config.token_cleanup.cart_ttl_days }),
            ),
        ]
    }

    /// Delay before retry `attempt` (0-based): `retry_delay * multiplier^attempt`.
    pub fn retry_delay_for(&self, attempt: u32) -> Duration {
        let multiplier = match self.retry_backoff_multiplier {
            m if m.is_finite() && m >= 1.0 => m,
            _ => 1.0,
        };
        let secs = self.retry_delay.as_secs_f64() * multiplier.powi(attempt as i32);
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
    }
}
