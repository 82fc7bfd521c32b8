//! Outbox rows written with orders and drained by the `order_emails` job.

use std::fmt;
use std::str::FromStr;

use diesel::prelude::*;
use diesel::{AsExpression, FromSqlRow, sql_types::Text};

use super::text_enum_sql;

#[derive(Debug, Clone, Copy, PartialEq, Eq, AsExpression, FromSqlRow)]
#[diesel(sql_type = Text)]
pub enum NotificationKind {
    OrderConfirmation,
    StatusChanged,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OrderConfirmation => "OrderConfirmation",
            Self::StatusChanged => "StatusChanged",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OrderConfirmation" => Ok(Self::OrderConfirmation),
            "StatusChanged" => Ok(Self::StatusChanged),
            _ => Err(format!("Unrecognized notification kind: {s}")),
        }
    }
}

text_enum_sql!(NotificationKind);

#[derive(Debug, Clone, Copy, PartialEq, Eq, AsExpression, FromSqlRow)]
#[diesel(sql_type = Text)]
pub enum NotificationStatus {
    Pending,
    Sent,
    Failed,
}

impl NotificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Sent => "Sent",
            Self::Failed => "Failed",
        }
    }
}

impl fmt::Display for NotificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Sent" => Ok(Self::Sent),
            "Failed" => Ok(Self::Failed),
            _ => Err(format!("Unrecognized notification status: {s}")),
        }
    }
}

text_enum_sql!(NotificationStatus);

#[derive(Debug, Queryable, Selectable, Clone)]
#[diesel(table_name = crate::schema::order_notifications)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderNotification {
    pub id: i32,
    pub order_id: i32,
    pub kind: NotificationKind,
    pub recipient: String,
    pub status: NotificationStatus,
    pub attempts: i32,
    pub last_error: Option<String>,
    pub created_at: jiff_diesel::Timestamp,
    pub updated_at: jiff_diesel::Timestamp,
    pub sent_at: Option<jiff_diesel::Timestamp>,
}

#[derive(Debug, Insertable, Clone)]
#[diesel(table_name = crate::schema::order_notifications)]
pub struct NewOrderNotification {
    pub order_id: i32,
    pub kind: NotificationKind,
    pub recipient: String,
    pub status: NotificationStatus,
}

impl NewOrderNotification {
    pub fn pending(order_id: i32, kind: NotificationKind, recipient: impl Into<String>) -> Self {
        Self {
            order_id,
            kind,
            recipient: recipient.into(),
            status: NotificationStatus::Pending,
        }
    }
}
