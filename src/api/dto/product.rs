//! Product, product query and review DTOs, plus the multipart product form.

use axum::extract::Multipart;
use bigdecimal::BigDecimal;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::PaginationParams;
use super::profile::non_blank;
use crate::error::{AppError, AppResult};
use crate::models::ProductReview;
use crate::repositories::{ProductQuery, ProductSort, ProductWithNames};
use crate::services::{FileStorageService, ImageUpload, ProductInput};
use crate::utils::money;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductDto {
    pub id: i32,
    pub name: String,
    pub description: String,
    /// Absolute image URL
    pub picture_url: Option<String>,
    #[schema(example = 19.99)]
    pub price: f64,
    pub quantity: i32,
    pub bought_quantity: i32,
    pub number_of_reviews: i32,
    pub average_rating: f64,
    pub product_brand_id: i32,
    pub product_type_id: i32,
    pub product_brand_name: String,
    pub product_type_name: String,
}

impl ProductDto {
    pub fn new(row: ProductWithNames, files: &FileStorageService) -> Self {
        let product = row.product;
        Self {
            picture_url: files.absolute_url(product.picture_url.as_deref()),
            price: money::to_number(&product.price),
            id: product.id,
            name: product.name,
            description: product.description,
            quantity: product.stock_quantity,
            bought_quantity: product.bought_quantity,
            number_of_reviews: product.number_of_reviews,
            average_rating: product.average_rating,
            product_brand_id: product.product_brand_id,
            product_type_id: product.product_type_id,
            product_brand_name: row.brand_name,
            product_type_name: row.type_name,
        }
    }
}

#[derive(Debug, Deserialize, Validate, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ProductListQuery {
    #[serde(default = "default_page_index")]
    #[validate(range(min = 1, message = "Page index must be at least 1"))]
    pub page_index: i64,
    #[serde(default = "default_page_size")]
    #[validate(range(min = 1, max = 50, message = "Page size must be between 1 and 50"))]
    pub page_size: i64,
    pub brand_id: Option<i32>,
    pub type_id: Option<i32>,
    /// Case-insensitive name match
    pub search: Option<String>,
    /// priceAsc, priceDesc, nameAsc (default), nameDesc or ratingDesc
    pub sort: Option<String>,
    #[validate(range(min = 0.0, max = 5.0, message = "Minimum rating must be between 0 and 5"))]
    pub min_average_rating: Option<f64>,
}

fn default_page_index() -> i64 {
    PaginationParams::default().page_index
}

fn default_page_size() -> i64 {
    PaginationParams::default().page_size
}

impl ProductListQuery {
    pub fn pagination(&self) -> PaginationParams {
        PaginationParams {
            page_index: self.page_index,
            page_size: self.page_size,
        }
    }

    pub fn to_query(&self) -> ProductQuery {
        let page = self.pagination();
        ProductQuery {
            brand_id: self.brand_id,
            type_id: self.type_id,
            search: non_blank(self.search.as_deref()),
            min_average_rating: self.min_average_rating,
            sort: parse_product_sort(self.sort.as_deref()),
            offset: page.offset(),
            limit: page.limit(),
        }
    }
}

fn parse_product_sort(sort: Option<&str>) -> ProductSort {
    match sort.map(str::to_ascii_lowercase).as_deref() {
        Some("priceasc") => ProductSort::PriceAsc,
        Some("pricedesc") => ProductSort::PriceDesc,
        Some("namedesc") => ProductSort::NameDesc,
        Some("ratingdesc") => ProductSort::RatingDesc,
        _ => ProductSort::NameAsc,
    }
}

/// Multipart product form, as documented for the OpenAPI schema.
#[derive(Debug, Default, Validate, ToSchema)]
#[schema(as = ProductFormRequest)]
pub struct ProductForm {
    #[validate(length(min = 2, max = 100, message = "Name must be between 2 and 100 characters"))]
    pub name: String,
    #[validate(length(max = 500, message = "Description cannot exceed 500 characters"))]
    pub description: String,
    #[validate(range(min = 0.01, message = "Price must be at least 0.01"))]
    pub price: f64,
    #[validate(range(min = 0, message = "Stock quantity cannot be negative"))]
    pub stock_quantity: i32,
    #[validate(range(min = 1, message = "Product type is required"))]
    pub product_type_id: i32,
    #[validate(range(min = 1, message = "Product brand is required"))]
    pub product_brand_id: i32,
    /// Clears the current image on update when no new image is sent
    pub remove_image: bool,
    #[schema(value_type = Option<String>, format = Binary)]
    pub image: Option<ImageUpload>,
}

impl ProductForm {
    /// Reads the form fields. Field names match case-insensitively; the
    /// image may arrive as `ImageFile` or `Image`.
    pub async fn from_multipart(mut multipart: Multipart) -> AppResult<Self> {
        let mut form = ProductForm::default();
        let mut seen_price = false;

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_ascii_lowercase();
            match name.as_str() {
                "imagefile" | "image" => {
                    let file_name = field.file_name().unwrap_or_default().to_string();
                    let bytes = field.bytes().await?;
                    if !bytes.is_empty() {
                        form.image = Some(ImageUpload {
                            file_name,
                            bytes: bytes.to_vec(),
                        });
                    }
                }
                _ => {
                    let value = field.text().await?;
                    let value = value.trim();
                    match name.as_str() {
                        "name" => form.name = value.to_string(),
                        "description" => form.description = value.to_string(),
                        "price" => {
                            form.price = parse_field("Price", value)?;
                            seen_price = true;
                        }
                        "stockquantity" | "quantity" => {
                            form.stock_quantity = parse_field("StockQuantity", value)?
                        }
                        "producttypeid" => form.product_type_id = parse_field("ProductTypeId", value)?,
                        "productbrandid" => {
                            form.product_brand_id = parse_field("ProductBrandId", value)?
                        }
                        "removeimage" => form.remove_image = parse_flag(value),
                        _ => {}
                    }
                }
            }
        }

        if !seen_price {
            return Err(AppError::Validation {
                field: "Price".to_string(),
                reason: "Price is required".to_string(),
            });
        }
        form.validate()?;
        Ok(form)
    }

    pub fn into_parts(self) -> AppResult<(ProductInput, Option<ImageUpload>, bool)> {
        let price: BigDecimal = money::from_number("Price", self.price)?;
        let input = ProductInput {
            name: self.name,
            description: self.description,
            price,
            stock_quantity: self.stock_quantity,
            product_brand_id: self.product_brand_id,
            product_type_id: self.product_type_id,
        };
        Ok((input, self.image, self.remove_image))
    }
}

fn parse_field<T: std::str::FromStr>(field: &str, value: &str) -> AppResult<T> {
    value.parse().map_err(|_| AppError::Validation {
        field: field.to_string(),
        reason: format!("'{value}' is not a valid value"),
    })
}

fn parse_flag(value: &str) -> bool {
    matches!(value.to_ascii_lowercase().as_str(), "true" | "1" | "on" | "yes")
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewDto {
    pub id: i32,
    pub product_id: i32,
    pub user_id: Uuid,
    pub user_name: String,
    pub rating: i32,
    pub comment: Option<String>,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: Timestamp,
}

impl ReviewDto {
    pub fn new(review: ProductReview, user_name: String) -> Self {
        Self {
            id: review.id,
            product_id: review.product_id,
            user_id: review.user_id,
            user_name,
            rating: review.rating,
            comment: review.comment,
            created_at: review.created_at.to_jiff(),
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateReviewRequest {
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: i32,
    #[validate(length(max = 1000, message = "Comment cannot exceed 1000 characters"))]
    pub comment: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::extract::{FromRequest, Request};
    use axum::http::header;

    const BOUNDARY: &str = "XBOUNDARYX";

    fn multipart_request(fields: &[(&str, &str)], file: Option<(&str, &[u8])>) -> Request {
        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        if let Some((file_name, bytes)) = file {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"ImageFile\"; filename=\"{file_name}\"\r\nContent-Type: image/png\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri("/products")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn parse(request: Request) -> AppResult<ProductForm> {
        let multipart = Multipart::from_request(request, &()).await.unwrap();
        ProductForm::from_multipart(multipart).await
    }

    const VALID: [(&str, &str); 6] = [
        ("Name", "Trail Shoe"),
        ("Description", "Light and grippy"),
        ("Price", "89.90"),
        ("StockQuantity", "12"),
        ("ProductTypeId", "2"),
        ("ProductBrandId", "3"),
    ];

    #[tokio::test]
    async fn test_form_with_image() {
        let form = parse(multipart_request(&VALID, Some(("shoe.png", b"png-bytes"))))
            .await
            .unwrap();
        assert_eq!(form.name, "Trail Shoe");
        assert_eq!(form.product_brand_id, 3);
        let image = form.image.as_ref().unwrap();
        assert_eq!(image.file_name, "shoe.png");
        assert_eq!(image.bytes, b"png-bytes");

        let (input, image, remove) = form.into_parts().unwrap();
        assert_eq!(input.price, "89.90".parse::<BigDecimal>().unwrap());
        assert!(image.is_some());
        assert!(!remove);
    }

    #[tokio::test]
    async fn test_field_names_ignore_case() {
        let mut fields = VALID.to_vec();
        fields[0] = ("name", "Hoodie");
        fields.push(("removeImage", "true"));
        let form = parse(multipart_request(&fields, None)).await.unwrap();
        assert_eq!(form.name, "Hoodie");
        assert!(form.remove_image);
        assert!(form.image.is_none());
    }

    #[tokio::test]
    async fn test_invalid_fields_are_reported() {
        let mut fields = VALID.to_vec();
        fields[0] = ("Name", "X");
        fields[2] = ("Price", "0");
        match parse(multipart_request(&fields, None)).await {
            Err(AppError::ValidationErrors { errors }) => {
                let names: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
                assert_eq!(names, vec!["name", "price"]);
            }
            other => panic!("Expected ValidationErrors, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unparseable_number() {
        let mut fields = VALID.to_vec();
        fields[3] = ("StockQuantity", "lots");
        assert!(matches!(
            parse(multipart_request(&fields, None)).await,
            Err(AppError::Validation { field, .. }) if field == "StockQuantity"
        ));
    }

    #[test]
    fn test_product_query_mapping() {
        let query: ProductListQuery = serde_json::from_str(
            r#"{"pageIndex":3,"pageSize":5,"brandId":2,"sort":"priceDesc","search":" shoe "}"#,
        )
        .unwrap();
        let resolved = query.to_query();
        assert_eq!(resolved.offset, 10);
        assert_eq!(resolved.limit, 5);
        assert_eq!(resolved.brand_id, Some(2));
        assert_eq!(resolved.sort, ProductSort::PriceDesc);
        assert_eq!(resolved.search.as_deref(), Some("shoe"));
    }

    #[test]
    fn test_review_bounds() {
        let low = CreateReviewRequest {
            rating: 0,
            comment: None,
        };
        assert!(low.validate().is_err());
        let ok = CreateReviewRequest {
            rating: 5,
            comment: Some("Great".into()),
        };
        assert!(ok.validate().is_ok());
    }
}
