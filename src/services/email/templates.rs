//! HTML bodies for transactional email.

use bigdecimal::{BigDecimal, RoundingMode};
use jiff::Timestamp;

use crate::models::{Order, OrderItem};

pub fn format_money(amount: &BigDecimal) -> String {
    format!("${}", amount.with_scale_round(2, RoundingMode::HalfUp))
}

pub fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn format_date(timestamp: Timestamp) -> String {
    timestamp.strftime("%Y-%m-%d").to_string()
}

pub fn order_confirmation_subject(order: &Order) -> String {
    format!("Order Confirmation #{}", order.id)
}

pub fn order_confirmation(order: &Order, items: &[OrderItem]) -> String {
    let mut html = String::new();
    html.push_str("<h2>Order Confirmation</h2>");
    html.push_str(&format!("<p>Thank you for your order #{}.</p>", order.id));
    html.push_str(&format!(
        "<p>Order Date: {}</p>",
        format_date(order.order_date.to_jiff())
    ));
    html.push_str("<ul>");
    for item in items {
        html.push_str(&format!(
            "<li>{} x {} - {}</li>",
            escape_html(&item.product_name),
            item.quantity,
            format_money(&item.price)
        ));
    }
    html.push_str("</ul>");
    html.push_str(&format!("<p>Subtotal: {}</p>", format_money(&order.sub_total)));
    html.push_str(&format!(
        "<p>Shipping: {}</p>",
        format_money(&order.delivery_price)
    ));
    html.push_str(&format!(
        "<p><strong>Total: {}</strong></p>",
        format_money(&order.total())
    ));
    html
}

pub fn status_changed_subject(order: &Order) -> String {
    format!("Order #{} is now {}", order.id, order.status)
}

pub fn status_changed(order: &Order) -> String {
    format!(
        "<h2>Order Update</h2><p>Your order #{} placed on {} is now <strong>{}</strong>.</p>\
         <p>Total: {}</p>",
        order.id,
        format_date(order.order_date.to_jiff()),
        order.status,
        format_money(&order.total())
    )
}

pub const PASSWORD_RESET_SUBJECT: &str = "Reset your password";

pub fn password_reset(user_name: &str, reset_link: &str) -> String {
    format!(
        "<h2>Password Reset</h2><p>Hello {},</p>\
         <p>We received a request to reset your password. \
         <a href=\"{}\">Click here to choose a new one</a>.</p>\
         <p>If you did not ask for this, you can ignore this email.</p>",
        escape_html(user_name),
        escape_html(reset_link)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OrderStatus;
    use jiff_diesel::ToDiesel;
    use std::str::FromStr;

    fn money(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    fn order() -> Order {
        let date: Timestamp = "2025-03-14T10:00:00Z".parse().unwrap();
        Order {
            id: 42,
            buyer_email: "bob@test.com".into(),
            order_date: date.to_diesel(),
            ship_first_name: "Bob".into(),
            ship_last_name: "Smith".into(),
            ship_street: "1 Main St".into(),
            ship_city: "Springfield".into(),
            ship_state: "IL".into(),
            ship_postal_code: "62701".into(),
            ship_country: "US".into(),
            delivery_method_id: Some(1),
            delivery_short_name: "UPS1".into(),
            delivery_time: "1-2 Days".into(),
            delivery_price: money("10"),
            sub_total: money("55.5"),
            status: OrderStatus::Pending,
            payment_intent_id: None,
            updated_at: date.to_diesel(),
        }
    }

    fn item(name: &str, price: &str, quantity: i32) -> OrderItem {
        OrderItem {
            id: 1,
            order_id: 42,
            product_id: 7,
            product_name: name.into(),
            picture_url: None,
            price: money(price),
            quantity,
        }
    }

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(&money("10")), "$10.00");
        assert_eq!(format_money(&money("12.345")), "$12.35");
    }

    #[test]
    fn test_order_confirmation_body() {
        let html = order_confirmation(
            &order(),
            &[item("Angular Speedster", "25.5", 1), item("Boots <XL>", "15", 2)],
        );

        assert!(html.contains("Thank you for your order #42."));
        assert!(html.contains("Order Date: 2025-03-14"));
        assert!(html.contains("<li>Angular Speedster x 1 - $25.50</li>"));
        assert!(html.contains("<li>Boots &lt;XL&gt; x 2 - $15.00</li>"));
        assert!(html.contains("Subtotal: $55.50"));
        assert!(html.contains("Shipping: $10.00"));
        assert!(html.contains("Total: $65.50"));
    }

    #[test]
    fn test_status_changed_mentions_status() {
        let mut order = order();
        order.status = OrderStatus::Shipped;
        assert!(status_changed(&order).contains("<strong>Shipped</strong>"));
        assert_eq!(status_changed_subject(&order), "Order #42 is now Shipped");
    }

    #[test]
    fn test_password_reset_escapes_link() {
        let html = password_reset("bob", "http://ui/resetpassword?email=a&token=b");
        assert!(html.contains("email=a&amp;token=b"));
    }
}
