//! Order notification outbox.
//!
//! Rows are leased rather than held under a lock while email is sent: a
//! claim pushes `updated_at` past the lease, and only rows whose
//! `updated_at` is in the past are claimable.

use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use jiff::{SignedDuration, Timestamp};
use jiff_diesel::ToDiesel;

use crate::db::AsyncDbPool;
use crate::error::{AppError, AppResult};
use crate::models::{NotificationStatus, OrderNotification};

#[derive(Clone)]
pub struct NotificationRepository {
    pool: AsyncDbPool,
}

impl NotificationRepository {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }

    /// Claims up to `batch_size` pending rows, oldest first, skipping rows
    /// another worker holds.
    pub async fn claim_pending(
        &self,
        batch_size: i64,
        lease: SignedDuration,
    ) -> AppResult<Vec<OrderNotification>> {
        use crate::schema::order_notifications::dsl::*;
        let mut conn = self.pool.get().await?;
        let now = Timestamp::now();
        let lease_until = now.saturating_add(lease).unwrap_or(now).to_diesel();
        let now = now.to_diesel();

        conn.transaction::<_, AppError, _>(|conn| {
            async move {
                let claimed = order_notifications
                    .filter(status.eq(NotificationStatus::Pending))
                    .filter(updated_at.le(now))
                    .order(created_at.asc())
                    .limit(batch_size)
                    .select(OrderNotification::as_select())
                    .for_update()
                    .skip_locked()
                    .load(conn)
                    .await?;

                if !claimed.is_empty() {
                    let ids: Vec<i32> = claimed.iter().map(|n| n.id).collect();
                    diesel::update(order_notifications.filter(id.eq_any(ids)))
                        .set(updated_at.eq(lease_until))
                        .execute(conn)
                        .await?;
                }
                Ok(claimed)
            }
            .scope_boxed()
        })
        .await
    }

    pub async fn mark_sent(&self, notification_id: i32) -> AppResult<()> {
        use crate::schema::order_notifications::dsl::*;
        let mut conn = self.pool.get().await?;
        let now = Timestamp::now().to_diesel();

        diesel::update(order_notifications.filter(id.eq(notification_id)))
            .set((
                status.eq(NotificationStatus::Sent),
                sent_at.eq(Some(now)),
                updated_at.eq(now),
                last_error.eq(None::<String>),
            ))
            .execute(&mut conn)
            .await?;
        Ok(())
    }

    /// Records a failed delivery. The row stays pending for the next run
    /// until `max_attempts` is reached, then becomes failed.
    pub async fn record_failure(
        &self,
        notification: &OrderNotification,
        error: &str,
        max_attempts: i32,
    ) -> AppResult<NotificationStatus> {
        use crate::schema::order_notifications::dsl::*;
        let mut conn = self.pool.get().await?;

        let next_status = status_after_failure(notification.attempts, max_attempts);
        diesel::update(order_notifications.filter(id.eq(notification.id)))
            .set((
                status.eq(next_status),
                attempts.eq(notification.attempts + 1),
                last_error.eq(Some(error)),
                updated_at.eq(Timestamp::now().to_diesel()),
            ))
            .execute(&mut conn)
            .await?;
        Ok(next_status)
    }
}

pub(crate) fn status_after_failure(previous_attempts: i32, max_attempts: i32) -> NotificationStatus {
    if previous_attempts + 1 >= max_attempts {
        NotificationStatus::Failed
    } else {
        NotificationStatus::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_keeps_row_pending_until_limit() {
        assert_eq!(status_after_failure(0, 5), NotificationStatus::Pending);
        assert_eq!(status_after_failure(3, 5), NotificationStatus::Pending);
        assert_eq!(status_after_failure(4, 5), NotificationStatus::Failed);
        assert_eq!(status_after_failure(0, 1), NotificationStatus::Failed);
    }
}
