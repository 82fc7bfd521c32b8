//! Order placement, buyer order history, and admin status management.

use bigdecimal::BigDecimal;
use jiff::Timestamp;
use jiff_diesel::ToDiesel;

use crate::error::{AppError, AppResult};
use crate::models::{CartKind, DeliveryMethod, NewOrder, Order, OrderItem, OrderStatus};
use crate::repositories::{OrderLineDraft, OrderQuery, OrderRepository};
use crate::services::cart_service::{CartLine, CartService};

const FALLBACK_DELIVERY_NAME: &str = "Standard";
const FALLBACK_DELIVERY_TIME: &str = "3-5 days";
pub(crate) const FALLBACK_DELIVERY_DESCRIPTION: &str = "Standard delivery";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShippingAddress {
    pub first_name: String,
    pub last_name: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

/// Delivery terms copied onto an order.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DeliveryTerms {
    pub method_id: Option<i32>,
    pub short_name: String,
    pub delivery_time: String,
    pub price: BigDecimal,
}

impl DeliveryTerms {
    pub(crate) fn resolve(method: Option<DeliveryMethod>) -> Self {
        match method {
            Some(method) => Self {
                method_id: Some(method.id),
                short_name: method.short_name,
                delivery_time: method.delivery_time,
                price: method.price,
            },
            None => Self {
                method_id: None,
                short_name: FALLBACK_DELIVERY_NAME.to_string(),
                delivery_time: FALLBACK_DELIVERY_TIME.to_string(),
                price: BigDecimal::from(0),
            },
        }
    }
}

#[derive(Clone)]
pub struct OrderService {
    orders: OrderRepository,
    carts: CartService,
}

impl OrderService {
    pub fn new(orders: OrderRepository, carts: CartService) -> Self {
        Self { orders, carts }
    }

    pub async fn delivery_methods(&self) -> AppResult<Vec<DeliveryMethod>> {
        self.orders.delivery_methods().await
    }

    /// Turns the basket into an order. The basket itself is left in place.
    pub async fn create_order(
        &self,
        buyer_email: &str,
        basket_id: &str,
        delivery_method_id: i32,
        ship_to: ShippingAddress,
    ) -> AppResult<(Order, Vec<OrderItem>)> {
        let basket = self
            .carts
            .find(CartKind::Basket, basket_id)
            .await?
            .filter(|b| !b.items.is_empty())
            .ok_or_else(|| AppError::bad_request("Problem creating order"))?;

        let lines = order_lines(&basket.items);
        let delivery =
            DeliveryTerms::resolve(self.orders.find_delivery_method(delivery_method_id).await?);

        let new_order = NewOrder {
            buyer_email: buyer_email.trim().to_lowercase(),
            order_date: Timestamp::now().to_diesel(),
            ship_first_name: ship_to.first_name,
            ship_last_name: ship_to.last_name,
            ship_street: ship_to.street,
            ship_city: ship_to.city,
            ship_state: ship_to.state,
            ship_postal_code: ship_to.postal_code,
            ship_country: ship_to.country,
            delivery_method_id: delivery.method_id,
            delivery_short_name: delivery.short_name,
            delivery_time: delivery.delivery_time,
            delivery_price: delivery.price,
            sub_total: subtotal(&lines),
            status: OrderStatus::Pending,
            payment_intent_id: basket.payment_intent_id,
        };

        let (order, items) = self.orders.create(new_order, lines).await?;
        tracing::info!(
            order_id = order.id,
            basket_id,
            buyer = %order.buyer_email,
            total = %order.total(),
            "Order created"
        );
        Ok((order, items))
    }

    pub async fn orders_for_buyer(&self, buyer_email: &str) -> AppResult<Vec<(Order, Vec<OrderItem>)>> {
        self.orders
            .list_for_buyer(&buyer_email.trim().to_lowercase())
            .await
    }

    pub async fn order_for_buyer(
        &self,
        order_id: i32,
        buyer_email: &str,
    ) -> AppResult<(Order, Vec<OrderItem>)> {
        self.orders
            .find_for_buyer(order_id, &buyer_email.trim().to_lowercase())
            .await?
            .ok_or_else(|| AppError::not_found("Order", "ID", order_id))
    }

    /// Buyers may only cancel orders that are still pending. The status check
    /// is repeated by the update itself, so an order shipped in between is
    /// left alone.
    pub async fn cancel_order(&self, order_id: i32, buyer_email: &str) -> AppResult<Order> {
        let (order, _) = self.order_for_buyer(order_id, buyer_email).await?;
        if order.status != OrderStatus::Pending {
            return Err(not_cancellable(order.id, order.status));
        }

        let Some(cancelled) = self
            .orders
            .update_status(order.id, OrderStatus::Cancelled, Some(OrderStatus::Pending))
            .await?
        else {
            let (current, _) = self.order_for_buyer(order_id, buyer_email).await?;
            return Err(not_cancellable(current.id, current.status));
        };
        tracing::info!(order_id = cancelled.id, "Order cancelled by buyer");
        Ok(cancelled)
    }

    pub async fn list_orders(&self, query: &OrderQuery) -> AppResult<(Vec<Order>, i64)> {
        self.orders.list(query).await
    }

    /// Admin status change. Queues a notification when the status moves.
    pub async fn update_status(&self, order_id: i32, status: &str) -> AppResult<Order> {
        let status: OrderStatus = status
            .parse()
            .map_err(|message: String| AppError::bad_request(message))?;

        let current = self
            .orders
            .find_by_id(order_id)
            .await?
            .ok_or_else(|| AppError::not_found("Order", "ID", order_id))?;
        if current.status == status {
            return Ok(current);
        }

        let order = self
            .orders
            .update_status(current.id, status, None)
            .await?
            .ok_or_else(|| AppError::not_found("Order", "ID", order_id))?;
        tracing::info!(order_id = order.id, from = %current.status, to = %status, "Order status changed");
        Ok(order)
    }
}

fn not_cancellable(order_id: i32, status: OrderStatus) -> AppError {
    AppError::bad_request(format!(
        "Order #{order_id} cannot be cancelled because it is {status}"
    ))
}

pub(crate) fn order_lines(items: &[CartLine]) -> Vec<OrderLineDraft> {
    items
        .iter()
        .map(|line| OrderLineDraft {
            product_id: line.product_id,
            product_name: line.product_name.clone(),
            picture_url: line.picture_url.clone(),
            price: line.price.clone(),
            quantity: line.quantity,
        })
        .collect()
}

pub(crate) fn subtotal(lines: &[OrderLineDraft]) -> BigDecimal {
    lines
        .iter()
        .map(|line| &line.price * BigDecimal::from(line.quantity))
        .fold(BigDecimal::from(0), |acc, amount| acc + amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn draft(price: &str, quantity: i32) -> OrderLineDraft {
        OrderLineDraft {
            product_id: 1,
            product_name: "Board".into(),
            picture_url: None,
            price: BigDecimal::from_str(price).unwrap(),
            quantity,
        }
    }

    #[test]
    fn test_subtotal_sums_price_times_quantity() {
        let lines = vec![draft("12.50", 2), draft("0.99", 3)];
        assert_eq!(subtotal(&lines), BigDecimal::from_str("27.97").unwrap());
        assert_eq!(subtotal(&[]), BigDecimal::from(0));
    }

    #[test]
    fn test_unknown_delivery_method_falls_back_to_standard() {
        let terms = DeliveryTerms::resolve(None);
        assert_eq!(terms.method_id, None);
        assert_eq!(terms.short_name, "Standard");
        assert_eq!(terms.delivery_time, "3-5 days");
        assert_eq!(terms.price, BigDecimal::from(0));
    }

    #[test]
    fn test_known_delivery_method_is_copied() {
        let terms = DeliveryTerms::resolve(Some(DeliveryMethod {
            id: 2,
            short_name: "UPS2".into(),
            delivery_time: "2-5 Days".into(),
            description: "Get it within 5 days".into(),
            price: BigDecimal::from(5),
        }));
        assert_eq!(terms.method_id, Some(2));
        assert_eq!(terms.short_name, "UPS2");
        assert_eq!(terms.price, BigDecimal::from(5));
    }

    #[test]
    fn test_cancel_refusal_names_current_status() {
        match not_cancellable(42, OrderStatus::Shipped) {
            AppError::BadRequest { message } => {
                assert_eq!(message, "Order #42 cannot be cancelled because it is Shipped")
            }
            other => panic!("Expected BadRequest, got {other:?}"),
        }
    }

    #[test]
    fn test_order_lines_snapshot_cart() {
        let lines = order_lines(&[CartLine {
            product_id: 7,
            product_name: "Core Blue Hat".into(),
            price: BigDecimal::from(10),
            quantity: 2,
            picture_url: Some("images/products/hat.png".into()),
            brand: None,
            product_type: None,
        }]);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].product_id, 7);
        assert_eq!(lines[0].quantity, 2);
        assert_eq!(lines[0].picture_url.as_deref(), Some("images/products/hat.png"));
    }
}
