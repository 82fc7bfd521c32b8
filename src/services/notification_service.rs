//! Delivery of queued order notifications.
//!
//! Order writes only insert outbox rows; this service turns them into
//! emails. A run claims a batch under a lease, renders each row against the
//! current state of its order, and records the outcome row by row.

use std::sync::Arc;

use jiff::SignedDuration;

use crate::error::{AppError, AppResult};
use crate::models::{NotificationKind, NotificationStatus, Order, OrderItem, OrderNotification};
use crate::repositories::{NotificationRepository, OrderRepository};
use crate::services::email::{EmailMessage, EmailSender, templates};

/// Outcome counts of one dispatch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub claimed: usize,
    pub sent: usize,
    pub retrying: usize,
    pub failed: usize,
}

impl DispatchReport {
    fn record(&mut self, status: NotificationStatus) {
        match status {
            NotificationStatus::Sent => self.sent += 1,
            NotificationStatus::Pending => self.retrying += 1,
            NotificationStatus::Failed => self.failed += 1,
        }
    }
}

#[derive(Clone)]
pub struct NotificationService {
    notifications: NotificationRepository,
    orders: OrderRepository,
    email: Arc<dyn EmailSender>,
}

impl NotificationService {
    pub fn new(
        notifications: NotificationRepository,
        orders: OrderRepository,
        email: Arc<dyn EmailSender>,
    ) -> Self {
        Self {
            notifications,
            orders,
            email,
        }
    }

    /// Sends up to `batch_size` pending notifications. Rows stay claimed for
    /// `lease`, so a concurrent run skips them.
    pub async fn dispatch_pending(
        &self,
        batch_size: i64,
        max_attempts: i32,
        lease: SignedDuration,
    ) -> AppResult<DispatchReport> {
        let claimed = self.notifications.claim_pending(batch_size, lease).await?;
        let mut report = DispatchReport {
            claimed: claimed.len(),
            ..DispatchReport::default()
        };

        for notification in &claimed {
            let status = match self.deliver(notification).await {
                Ok(()) => {
                    self.notifications.mark_sent(notification.id).await?;
                    tracing::info!(
                        notification_id = notification.id,
                        order_id = notification.order_id,
                        kind = %notification.kind,
                        sender = self.email.name(),
                        "Order notification sent"
                    );
                    NotificationStatus::Sent
                }
                Err(e) => {
                    let status = self
                        .notifications
                        .record_failure(notification, &e.to_string(), max_attempts)
                        .await?;
                    tracing::warn!(
                        notification_id = notification.id,
                        order_id = notification.order_id,
                        attempt = notification.attempts + 1,
                        status = %status,
                        error = %e,
                        "Order notification failed"
                    );
                    status
                }
            };
            report.record(status);
        }

        Ok(report)
    }

    async fn deliver(&self, notification: &OrderNotification) -> AppResult<()> {
        let order = self
            .orders
            .find_by_id(notification.order_id)
            .await?
            .ok_or_else(|| AppError::not_found("Order", "ID", notification.order_id))?;
        let items = match notification.kind {
            NotificationKind::OrderConfirmation => self.orders.items_for(&order).await?,
            NotificationKind::StatusChanged => Vec::new(),
        };

        let message = render(notification, &order, &items);
        self.email.send(&message).await
    }
}

pub(crate) fn render(
    notification: &OrderNotification,
    order: &Order,
    items: &[OrderItem],
) -> EmailMessage {
    match notification.kind {
        NotificationKind::OrderConfirmation => EmailMessage::new(
            notification.recipient.clone(),
            templates::order_confirmation_subject(order),
            templates::order_confirmation(order, items),
        ),
        NotificationKind::StatusChanged => EmailMessage::new(
            notification.recipient.clone(),
            templates::status_changed_subject(order),
            templates::status_changed(order),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OrderStatus;
    use bigdecimal::BigDecimal;
    use jiff::Timestamp;
    use jiff_diesel::ToDiesel;

    fn order() -> Order {
        let now = Timestamp::now().to_diesel();
        Order {
            id: 42,
            buyer_email: "bob@test.com".into(),
            order_date: now,
            ship_first_name: "Bob".into(),
            ship_last_name: "Smith".into(),
            ship_street: "1 Main St".into(),
            ship_city: "Springfield".into(),
            ship_state: "IL".into(),
            ship_postal_code: "62701".into(),
            ship_country: "US".into(),
            delivery_method_id: None,
            delivery_short_name: "Standard".into(),
            delivery_time: "3-5 days".into(),
            delivery_price: BigDecimal::from(5),
            sub_total: BigDecimal::from(20),
            status: OrderStatus::Shipped,
            payment_intent_id: None,
            updated_at: now,
        }
    }

    fn notification(kind: NotificationKind) -> OrderNotification {
        let now = Timestamp::now().to_diesel();
        OrderNotification {
            id: 1,
            order_id: 42,
            kind,
            recipient: "bob@test.com".into(),
            status: NotificationStatus::Pending,
            attempts: 0,
            last_error: None,
            created_at: now,
            updated_at: now,
            sent_at: None,
        }
    }

    #[test]
    fn test_render_confirmation() {
        let message = render(&notification(NotificationKind::OrderConfirmation), &order(), &[]);
        assert_eq!(message.to, "bob@test.com");
        assert_eq!(message.subject, "Order Confirmation #42");
        assert!(message.html_body.contains("Total: $25.00"));
    }

    #[test]
    fn test_render_status_change() {
        let message = render(&notification(NotificationKind::StatusChanged), &order(), &[]);
        assert_eq!(message.subject, "Order #42 is now Shipped");
    }

    #[test]
    fn test_report_counts() {
        let mut report = DispatchReport::default();
        report.record(NotificationStatus::Sent);
        report.record(NotificationStatus::Pending);
        report.record(NotificationStatus::Failed);
        report.record(NotificationStatus::Sent);
        assert_eq!(
            report,
            DispatchReport {
                claimed: 0,
                sent: 2,
                retrying: 1,
                failed: 1
            }
        );
    }
}
