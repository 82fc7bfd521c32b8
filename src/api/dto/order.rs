//! Order, delivery method and admin order-list DTOs.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::PaginationParams;
use super::profile::non_blank;
use crate::error::{AppError, AppResult};
use crate::models::{DeliveryMethod, Order, OrderItem, OrderStatus};
use crate::repositories::{OrderQuery, OrderSort};
use crate::services::{FileStorageService, ShippingAddress};
use crate::utils::money;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryMethodDto {
    pub id: i32,
    pub short_name: String,
    pub delivery_time: String,
    pub description: String,
    pub price: f64,
}

impl From<DeliveryMethod> for DeliveryMethodDto {
    fn from(method: DeliveryMethod) -> Self {
        Self {
            price: money::to_number(&method.price),
            id: method.id,
            short_name: method.short_name,
            delivery_time: method.delivery_time,
            description: method.description,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShipToAddressDto {
    #[validate(length(min = 1, max = 100, message = "First name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100, message = "Last name is required"))]
    pub last_name: String,
    #[validate(length(min = 1, max = 200, message = "Street is required"))]
    pub street: String,
    #[validate(length(min = 1, max = 100, message = "City is required"))]
    pub city: String,
    #[validate(length(min = 1, max = 100, message = "State is required"))]
    pub state: String,
    #[validate(length(min = 1, max = 20, message = "Postal code is required"))]
    pub postal_code: String,
    #[validate(length(min = 1, max = 100, message = "Country is required"))]
    pub country: String,
}

impl From<ShipToAddressDto> for ShippingAddress {
    fn from(dto: ShipToAddressDto) -> Self {
        ShippingAddress {
            first_name: dto.first_name.trim().to_string(),
            last_name: dto.last_name.trim().to_string(),
            street: dto.street.trim().to_string(),
            city: dto.city.trim().to_string(),
            state: dto.state.trim().to_string(),
            postal_code: dto.postal_code.trim().to_string(),
            country: dto.country.trim().to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    #[validate(length(min = 1, message = "Basket ID is required"))]
    pub basket_id: String,
    pub delivery_method_id: i32,
    #[validate(nested)]
    pub ship_to_address: ShipToAddressDto,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemDto {
    pub product_id: i32,
    pub product_name: String,
    pub picture_url: Option<String>,
    pub price: f64,
    pub quantity: i32,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderDto {
    pub id: i32,
    pub buyer_email: String,
    #[schema(value_type = String, format = DateTime)]
    pub order_date: Timestamp,
    pub ship_to_address: ShipToAddressDto,
    pub delivery_method: String,
    pub delivery_time: String,
    pub shipping_price: f64,
    pub order_items: Vec<OrderItemDto>,
    pub subtotal: f64,
    pub total: f64,
    pub status: OrderStatus,
    pub payment_intent_id: Option<String>,
}

impl OrderDto {
    pub fn new(order: Order, items: Vec<OrderItem>, files: &FileStorageService) -> Self {
        let total = money::to_number(&order.total());
        Self {
            id: order.id,
            buyer_email: order.buyer_email,
            order_date: order.order_date.to_jiff(),
            ship_to_address: ShipToAddressDto {
                first_name: order.ship_first_name,
                last_name: order.ship_last_name,
                street: order.ship_street,
                city: order.ship_city,
                state: order.ship_state,
                postal_code: order.ship_postal_code,
                country: order.ship_country,
            },
            delivery_method: order.delivery_short_name,
            delivery_time: order.delivery_time,
            shipping_price: money::to_number(&order.delivery_price),
            order_items: items
                .into_iter()
                .map(|item| OrderItemDto {
                    product_id: item.product_id,
                    picture_url: files.absolute_url(item.picture_url.as_deref()),
                    product_name: item.product_name,
                    price: money::to_number(&item.price),
                    quantity: item.quantity,
                })
                .collect(),
            subtotal: money::to_number(&order.sub_total),
            total,
            status: order.status,
            payment_intent_id: order.payment_intent_id,
        }
    }
}

/// Admin list row.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AllOrdersDto {
    pub id: i32,
    pub buyer_email: String,
    #[schema(value_type = String, format = DateTime)]
    pub order_date: Timestamp,
    pub sub_total: f64,
    pub shipping_price: f64,
    pub total: f64,
    pub status: OrderStatus,
    pub delivery_method: String,
}

impl From<Order> for AllOrdersDto {
    fn from(order: Order) -> Self {
        Self {
            total: money::to_number(&order.total()),
            id: order.id,
            buyer_email: order.buyer_email,
            order_date: order.order_date.to_jiff(),
            sub_total: money::to_number(&order.sub_total),
            shipping_price: money::to_number(&order.delivery_price),
            status: order.status,
            delivery_method: order.delivery_short_name,
        }
    }
}

#[derive(Debug, Deserialize, Validate, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct OrderListQuery {
    #[serde(default = "default_page_index")]
    #[validate(range(min = 1, message = "Page index must be at least 1"))]
    pub page_index: i64,
    #[serde(default = "default_page_size")]
    #[validate(range(min = 1, max = 50, message = "Page size must be between 1 and 50"))]
    pub page_size: i64,
    /// Buyer email contains
    pub search: Option<String>,
    /// Exact buyer email
    pub buyer_email: Option<String>,
    /// Case-insensitive status name
    pub status: Option<String>,
    /// dateAsc or dateDesc (default)
    pub sort: Option<String>,
}

fn default_page_index() -> i64 {
    PaginationParams::default().page_index
}

fn default_page_size() -> i64 {
    PaginationParams::default().page_size
}

impl OrderListQuery {
    pub fn pagination(&self) -> PaginationParams {
        PaginationParams {
            page_index: self.page_index,
            page_size: self.page_size,
        }
    }

    pub fn to_query(&self) -> AppResult<OrderQuery> {
        let status = match non_blank(self.status.as_deref()) {
            Some(status) => Some(
                status
                    .parse::<OrderStatus>()
                    .map_err(AppError::bad_request)?,
            ),
            None => None,
        };
        let sort = match self.sort.as_deref().map(str::to_ascii_lowercase).as_deref() {
            Some("dateasc") => OrderSort::DateAsc,
            _ => OrderSort::DateDesc,
        };
        let page = self.pagination();

        Ok(OrderQuery {
            search: non_blank(self.search.as_deref()),
            buyer_email: non_blank(self.buyer_email.as_deref()).map(|e| e.to_lowercase()),
            status,
            sort,
            offset: page.offset(),
            limit: page.limit(),
        })
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateOrderStatusRequest {
    #[validate(length(min = 1, message = "Status is required"))]
    #[schema(example = "Shipped")]
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(json: &str) -> OrderListQuery {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_order_query_defaults_to_newest_first() {
        let resolved = query("{}").to_query().unwrap();
        assert_eq!(resolved.sort, OrderSort::DateDesc);
        assert!(resolved.status.is_none());
        assert_eq!(resolved.limit, 6);
    }

    #[test]
    fn test_order_query_parses_status_case_insensitively() {
        let resolved = query(r#"{"status":"shipped","sort":"DateAsc","buyerEmail":" Ann@Test.com "}"#)
            .to_query()
            .unwrap();
        assert_eq!(resolved.status, Some(OrderStatus::Shipped));
        assert_eq!(resolved.sort, OrderSort::DateAsc);
        assert_eq!(resolved.buyer_email.as_deref(), Some("ann@test.com"));
    }

    #[test]
    fn test_order_query_rejects_unknown_status() {
        assert!(matches!(
            query(r#"{"status":"Lost"}"#).to_query(),
            Err(AppError::BadRequest { .. })
        ));
    }

    #[test]
    fn test_create_order_requires_address_fields() {
        let request: CreateOrderRequest = serde_json::from_str(
            r#"{"basketId":"b-1","deliveryMethodId":1,"shipToAddress":{
                "firstName":"Ann","lastName":"Lee","street":"","city":"X",
                "state":"Y","postalCode":"1","country":"US"}}"#,
        )
        .unwrap();
        let errors = AppError::from(request.validate().unwrap_err());
        match errors {
            AppError::ValidationErrors { errors } => {
                assert_eq!(errors[0].field, "ship_to_address.street");
            }
            other => panic!("Expected ValidationErrors, got {other:?}"),
        }
    }
}
