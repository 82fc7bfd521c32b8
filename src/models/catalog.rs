use bigdecimal::BigDecimal;
use diesel::prelude::*;
use uuid::Uuid;

#[derive(Debug, Queryable, Selectable, Identifiable, Clone, PartialEq)]
#[diesel(table_name = crate::schema::product_brands)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProductBrand {
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Insertable, AsChangeset, Clone)]
#[diesel(table_name = crate::schema::product_brands)]
pub struct NewProductBrand {
    pub name: String,
}

#[derive(Debug, Queryable, Selectable, Identifiable, Clone, PartialEq)]
#[diesel(table_name = crate::schema::product_types)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProductType {
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Insertable, AsChangeset, Clone)]
#[diesel(table_name = crate::schema::product_types)]
pub struct NewProductType {
    pub name: String,
}

#[derive(Debug, Queryable, Selectable, Identifiable, Clone)]
#[diesel(table_name = crate::schema::products)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Product {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub price: BigDecimal,
    pub picture_url: Option<String>,
    pub stock_quantity: i32,
    pub bought_quantity: i32,
    pub number_of_reviews: i32,
    pub average_rating: f64,
    pub product_brand_id: i32,
    pub product_type_id: i32,
    pub created_at: jiff_diesel::Timestamp,
    pub updated_at: jiff_diesel::Timestamp,
}

#[derive(Debug, Insertable, Clone)]
#[diesel(table_name = crate::schema::products)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: BigDecimal,
    pub picture_url: Option<String>,
    pub stock_quantity: i32,
    pub product_brand_id: i32,
    pub product_type_id: i32,
}

/// Full replacement of the editable columns. `picture_url` is written as
/// given, so `None` clears the image.
#[derive(Debug, AsChangeset, Clone)]
#[diesel(table_name = crate::schema::products)]
#[diesel(treat_none_as_null = true)]
pub struct UpdateProduct {
    pub name: String,
    pub description: String,
    pub price: BigDecimal,
    pub picture_url: Option<String>,
    pub stock_quantity: i32,
    pub product_brand_id: i32,
    pub product_type_id: i32,
    pub updated_at: jiff_diesel::Timestamp,
}

#[derive(Debug, Queryable, Selectable, Clone)]
#[diesel(table_name = crate::schema::product_reviews)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProductReview {
    pub id: i32,
    pub product_id: i32,
    pub user_id: Uuid,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: jiff_diesel::Timestamp,
}

#[derive(Debug, Insertable, Clone)]
#[diesel(table_name = crate::schema::product_reviews)]
pub struct NewProductReview {
    pub product_id: i32,
    pub user_id: Uuid,
    pub rating: i32,
    pub comment: Option<String>,
}
