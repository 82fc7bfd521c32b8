//! Basket and wishlist documents as exchanged with the client.

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::models::CartKind;
use crate::services::{Cart, CartLine};
use crate::utils::money;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartItemDto {
    /// Product ID
    #[validate(range(min = 1, message = "Product ID is required"))]
    pub id: i32,
    #[validate(length(min = 1, max = 100, message = "Product name is required"))]
    pub product_name: String,
    #[validate(range(min = 0.0, message = "Price cannot be negative"))]
    pub price: f64,
    /// Values below 1 are treated as 1 when adding
    #[serde(default)]
    pub quantity: i32,
    #[validate(length(max = 512, message = "Picture URL cannot exceed 512 characters"))]
    pub picture_url: Option<String>,
    #[validate(length(max = 50, message = "Brand cannot exceed 50 characters"))]
    pub brand: Option<String>,
    #[serde(rename = "type")]
    #[validate(length(max = 50, message = "Type cannot exceed 50 characters"))]
    pub product_type: Option<String>,
}

impl CartItemDto {
    pub fn into_line(self) -> AppResult<CartLine> {
        Ok(CartLine {
            product_id: self.id,
            price: money::from_number("price", self.price)?,
            product_name: self.product_name,
            quantity: self.quantity,
            picture_url: self.picture_url,
            brand: self.brand,
            product_type: self.product_type,
        })
    }
}

impl From<CartLine> for CartItemDto {
    fn from(line: CartLine) -> Self {
        Self {
            id: line.product_id,
            price: money::to_number(&line.price),
            product_name: line.product_name,
            quantity: line.quantity,
            picture_url: line.picture_url,
            brand: line.brand,
            product_type: line.product_type,
        }
    }
}

/// Basket or wishlist. The checkout fields are only meaningful for baskets
/// and are omitted from wishlist responses.
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartDto {
    #[validate(length(min = 1, max = 64, message = "ID must be 1-64 characters"))]
    pub id: String,
    #[serde(default)]
    #[validate(nested)]
    pub items: Vec<CartItemDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_method_id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 256, message = "Client secret cannot exceed 256 characters"))]
    pub client_secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 256, message = "Payment intent ID cannot exceed 256 characters"))]
    pub payment_intent_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping_price: Option<f64>,
}

impl CartDto {
    pub fn into_cart(self, kind: CartKind) -> AppResult<Cart> {
        let items = self
            .items
            .into_iter()
            .map(CartItemDto::into_line)
            .collect::<AppResult<Vec<_>>>()?;
        let shipping_price = match self.shipping_price {
            Some(price) => money::from_number("shippingPrice", price)?,
            None => BigDecimal::from(0),
        };

        Ok(Cart {
            kind,
            id: cart_id(&self.id)?.to_string(),
            items,
            delivery_method_id: self.delivery_method_id,
            client_secret: self.client_secret,
            payment_intent_id: self.payment_intent_id,
            shipping_price,
        })
    }
}

/// Trims a client-chosen document id and checks it fits the key column.
pub fn cart_id(raw: &str) -> AppResult<&str> {
    let id = raw.trim();
    if id.is_empty() || id.chars().count() > 64 {
        return Err(AppError::Validation {
            field: "id".to_string(),
            reason: "ID must be 1-64 characters".to_string(),
        });
    }
    Ok(id)
}

impl From<Cart> for CartDto {
    fn from(cart: Cart) -> Self {
        let is_basket = cart.kind == CartKind::Basket;
        Self {
            id: cart.id,
            items: cart.items.into_iter().map(CartItemDto::from).collect(),
            delivery_method_id: cart.delivery_method_id,
            client_secret: cart.client_secret,
            payment_intent_id: cart.payment_intent_id,
            shipping_price: is_basket.then(|| money::to_number(&cart.shipping_price)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: i32, quantity: i32) -> CartItemDto {
        CartItemDto {
            id,
            product_name: format!("Product {id}"),
            price: 12.5,
            quantity,
            picture_url: None,
            brand: Some("Nike".into()),
            product_type: Some("Clothing".into()),
        }
    }

    #[test]
    fn test_item_uses_type_key() {
        let body = serde_json::to_value(item(1, 2)).unwrap();
        assert_eq!(body["type"], "Clothing");
        assert_eq!(body["productName"], "Product 1");
    }

    #[test]
    fn test_wishlist_response_has_no_checkout_fields() {
        let mut cart = Cart::empty(CartKind::Wishlist, "w-1");
        cart.items.push(item(1, 1).into_line().unwrap());
        let body = serde_json::to_value(CartDto::from(cart)).unwrap();
        assert!(body.get("shippingPrice").is_none());
        assert_eq!(body["items"][0]["id"], 1);
    }

    #[test]
    fn test_basket_round_trip_through_domain() {
        let dto: CartDto = serde_json::from_str(
            r#"{"id":"b-1","items":[{"id":4,"productName":"Cap","price":9.99,"quantity":2}],
                "deliveryMethodId":1,"shippingPrice":5}"#,
        )
        .unwrap();
        assert!(dto.validate().is_ok());
        let cart = dto.into_cart(CartKind::Basket).unwrap();
        assert_eq!(cart.items[0].price, "9.99".parse::<BigDecimal>().unwrap());
        assert_eq!(cart.shipping_price, BigDecimal::from(5));

        let body = serde_json::to_value(CartDto::from(cart)).unwrap();
        assert_eq!(body["shippingPrice"], 5.0);
        assert_eq!(body["deliveryMethodId"], 1);
    }

    #[test]
    fn test_nested_item_validation() {
        let mut bad = item(1, 1);
        bad.product_name.clear();
        let dto = CartDto {
            id: "b-2".into(),
            items: vec![bad],
            delivery_method_id: None,
            client_secret: None,
            payment_intent_id: None,
            shipping_price: None,
        };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_item_text_fields_respect_column_sizes() {
        let mut long_brand = item(1, 1);
        long_brand.brand = Some("b".repeat(51));
        assert!(long_brand.validate().is_err());

        let mut long_type = item(1, 1);
        long_type.product_type = Some("t".repeat(51));
        assert!(long_type.validate().is_err());

        let mut long_picture = item(1, 1);
        long_picture.picture_url = Some(format!("https://cdn.test/{}", "p".repeat(500)));
        assert!(long_picture.validate().is_err());

        let mut at_limit = item(1, 1);
        at_limit.brand = Some("b".repeat(50));
        at_limit.picture_url = Some("p".repeat(512));
        assert!(at_limit.validate().is_ok());
    }

    #[test]
    fn test_oversized_price_is_rejected_before_storage() {
        let mut huge = item(1, 1);
        huge.price = 1e18;
        assert!(matches!(
            huge.into_line(),
            Err(AppError::Validation { field, .. }) if field == "price"
        ));
    }

    #[test]
    fn test_blank_document_id_is_rejected() {
        let dto = CartDto {
            id: "   ".into(),
            items: vec![item(1, 1)],
            delivery_method_id: None,
            client_secret: None,
            payment_intent_id: None,
            shipping_price: None,
        };
        assert!(dto.validate().is_ok());
        assert!(matches!(
            dto.into_cart(CartKind::Basket),
            Err(AppError::Validation { field, .. }) if field == "id"
        ));
    }

    #[test]
    fn test_cart_id_bounds() {
        assert_eq!(cart_id("  b-1 ").unwrap(), "b-1");
        assert!(cart_id(&"x".repeat(64)).is_ok());
        assert!(cart_id(&"x".repeat(65)).is_err());
        assert!(cart_id("").is_err());
    }
}
