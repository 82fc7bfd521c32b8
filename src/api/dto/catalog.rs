//! Brand and type DTOs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::{ProductBrand, ProductType};

#[derive(Debug, Serialize, ToSchema)]
pub struct BrandDto {
    pub id: i32,
    #[schema(example = "Apple")]
    pub name: String,
}

impl From<ProductBrand> for BrandDto {
    fn from(brand: ProductBrand) -> Self {
        Self {
            id: brand.id,
            name: brand.name,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TypeDto {
    pub id: i32,
    #[schema(example = "Electronics")]
    pub name: String,
}

impl From<ProductType> for TypeDto {
    fn from(product_type: ProductType) -> Self {
        Self {
            id: product_type.id,
            name: product_type.name,
        }
    }
}

/// Create/update body shared by brands and types.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct NameRequest {
    #[validate(length(min = 2, max = 50, message = "Name must be between 2 and 50 characters"))]
    pub name: String,
}
