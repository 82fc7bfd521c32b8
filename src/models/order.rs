use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use diesel::prelude::*;
use diesel::{AsExpression, FromSqlRow, sql_types::Text};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::text_enum_sql;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    ToSchema,
    AsExpression,
    FromSqlRow,
)]
#[diesel(sql_type = Text)]
pub enum OrderStatus {
    Pending,
    PaymentReceived,
    PaymentFailed,
    Shipped,
    Complete,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [
        Self::Pending,
        Self::PaymentReceived,
        Self::PaymentFailed,
        Self::Shipped,
        Self::Complete,
        Self::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::PaymentReceived => "PaymentReceived",
            Self::PaymentFailed => "PaymentFailed",
            Self::Shipped => "Shipped",
            Self::Complete => "Complete",
            Self::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Case-insensitive, matching what admins type in filters.
impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Invalid order status: {s}"))
    }
}

text_enum_sql!(OrderStatus);

#[derive(Debug, Queryable, Selectable, Identifiable, Clone, PartialEq)]
#[diesel(table_name = crate::schema::delivery_methods)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct DeliveryMethod {
    pub id: i32,
    pub short_name: String,
    pub delivery_time: String,
    pub description: String,
    pub price: BigDecimal,
}

#[derive(Debug, Insertable, Clone)]
#[diesel(table_name = crate::schema::delivery_methods)]
pub struct NewDeliveryMethod {
    pub short_name: String,
    pub delivery_time: String,
    pub description: String,
    pub price: BigDecimal,
}

#[derive(Debug, Queryable, Selectable, Identifiable, Clone)]
#[diesel(table_name = crate::schema::orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Order {
    pub id: i32,
    pub buyer_email: String,
    pub order_date: jiff_diesel::Timestamp,
    pub ship_first_name: String,
    pub ship_last_name: String,
    pub ship_street: String,
    pub ship_city: String,
    pub ship_state: String,
    pub ship_postal_code: String,
    pub ship_country: String,
    pub delivery_method_id: Option<i32>,
    pub delivery_short_name: String,
    pub delivery_time: String,
    pub delivery_price: BigDecimal,
    pub sub_total: BigDecimal,
    pub status: OrderStatus,
    pub payment_intent_id: Option<String>,
    pub updated_at: jiff_diesel::Timestamp,
}

impl Order {
    pub fn total(&self) -> BigDecimal {
        &self.sub_total + &self.delivery_price
    }
}

#[derive(Debug, Insertable, Clone)]
#[diesel(table_name = crate::schema::orders)]
pub struct NewOrder {
    pub buyer_email: String,
    pub order_date: jiff_diesel::Timestamp,
    pub ship_first_name: String,
    pub ship_last_name: String,
    pub ship_street: String,
    pub ship_city: String,
    pub ship_state: String,
    pub ship_postal_code: String,
    pub ship_country: String,
    pub delivery_method_id: Option<i32>,
    pub delivery_short_name: String,
    pub delivery_time: String,
    pub delivery_price: BigDecimal,
    pub sub_total: BigDecimal,
    pub status: OrderStatus,
    pub payment_intent_id: Option<String>,
}

#[derive(Debug, Queryable, Selectable, Identifiable, Associations, Clone)]
#[diesel(belongs_to(Order))]
#[diesel(table_name = crate::schema::order_items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderItem {
    pub id: i32,
    pub order_id: i32,
    pub product_id: i32,
    pub product_name: String,
    pub picture_url: Option<String>,
    pub price: BigDecimal,
    pub quantity: i32,
}

#[derive(Debug, Insertable, Clone, PartialEq)]
#[diesel(table_name = crate::schema::order_items)]
pub struct NewOrderItem {
    pub order_id: i32,
    pub product_id: i32,
    pub product_name: String,
    pub picture_url: Option<String>,
    pub price: BigDecimal,
    pub quantity: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse_ignores_case() {
        assert_eq!("shipped".parse::<OrderStatus>(), Ok(OrderStatus::Shipped));
        assert_eq!(
            "PAYMENTRECEIVED".parse::<OrderStatus>(),
            Ok(OrderStatus::PaymentReceived)
        );
        assert!("Lost".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_status_serializes_as_name() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::PaymentFailed).unwrap(),
            "\"PaymentFailed\""
        );
    }
}
