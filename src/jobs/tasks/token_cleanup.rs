use async_trait::async_trait;
use jiff::{SignedDuration, Timestamp};
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::jobs::types::{JobContext, JobTask};

/// Purges dead refresh/reset tokens and carts nobody touched for
/// `cart_ttl_days`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenCleanupTask {
    #[serde(default = "default_cart_ttl_days")]
    pub cart_ttl_days: i64,
}

fn default_cart_ttl_days() -> i64 {
    30
}

impl TokenCleanupTask {
    fn cart_cutoff(&self, now: Timestamp) -> Timestamp {
        let ttl = SignedDuration::from_secs(self.cart_ttl_days.max(0).saturating_mul(86_400));
        now.checked_sub(ttl).unwrap_or(Timestamp::MIN)
    }
}

#[async_trait]
impl JobTask for TokenCleanupTask {
    fn task_type() -> &'static str
    where
        Self: Sized,
    {
        "token_cleanup"
    }

    async fn execute(&self, ctx: JobContext) -> AppResult<()> {
        let now = Timestamp::now();
        let (refresh, reset) = ctx.services.auth.purge_stale_tokens(now).await?;
        let carts = ctx
            .services
            .carts
            .purge_untouched_since(self.cart_cutoff(now))
            .await?;

        tracing::info!(
            job = %ctx.job_name,
            refresh_tokens = refresh,
            reset_tokens = reset,
            carts,
            cart_ttl_days = self.cart_ttl_days,
            "Token cleanup completed"
        );
        Ok(())
    }

    fn description(&self) -> Option<String> {
        Some(format!(
            "Purge dead tokens and carts idle for {} days",
            self.cart_ttl_days
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cart_cutoff_is_ttl_days_back() {
        let task = TokenCleanupTask { cart_ttl_days: 30 };
        let now: Timestamp = "2024-03-31T12:00:00Z".parse().unwrap();
        let cutoff = task.cart_cutoff(now);
        assert_eq!(cutoff.to_string(), "2024-03-01T12:00:00Z");
    }

    #[test]
    fn test_negative_ttl_cuts_off_now() {
        let task = TokenCleanupTask { cart_ttl_days: -3 };
        let now = Timestamp::now();
        assert_eq!(task.cart_cutoff(now), now);
    }
}
