//! Product brands and product types.
//!
//! Deleting a brand or type still referenced by products surfaces the
//! foreign key violation as a 400 through the database error converter.

use crate::error::{AppError, AppResult};
use crate::models::{NewProductBrand, NewProductType, ProductBrand, ProductType};
use crate::repositories::{BrandRepository, ProductTypeRepository};

#[derive(Clone)]
pub struct CatalogService {
    brands: BrandRepository,
    types: ProductTypeRepository,
}

impl CatalogService {
    pub fn new(brands: BrandRepository, types: ProductTypeRepository) -> Self {
        Self { brands, types }
    }

    pub async fn list_brands(&self) -> AppResult<Vec<ProductBrand>> {
        self.brands.list().await
    }

    pub async fn get_brand(&self, brand_id: i32) -> AppResult<ProductBrand> {
        self.brands
            .find_by_id(brand_id)
            .await?
            .ok_or_else(|| AppError::not_found("Brand", "ID", brand_id))
    }

    pub async fn create_brand(&self, name: &str) -> AppResult<ProductBrand> {
        let brand = self
            .brands
            .create(NewProductBrand {
                name: name.trim().to_string(),
            })
            .await?;
        tracing::info!(brand_id = brand.id, name = %brand.name, "Brand created");
        Ok(brand)
    }

    pub async fn update_brand(&self, brand_id: i32, name: &str) -> AppResult<ProductBrand> {
        self.brands
            .update(
                brand_id,
                NewProductBrand {
                    name: name.trim().to_string(),
                },
            )
            .await?
            .ok_or_else(|| AppError::not_found("Brand", "ID", brand_id))
    }

    pub async fn delete_brand(&self, brand_id: i32) -> AppResult<()> {
        if self.brands.delete(brand_id).await? == 0 {
            return Err(AppError::not_found("Brand", "ID", brand_id));
        }
        tracing::info!(brand_id, "Brand deleted");
        Ok(())
    }

    pub async fn list_types(&self) -> AppResult<Vec<ProductType>> {
        self.types.list().await
    }

    pub async fn get_type(&self, type_id: i32) -> AppResult<ProductType> {
        self.types
            .find_by_id(type_id)
            .await?
            .ok_or_else(|| AppError::not_found("Type", "ID", type_id))
    }

    pub async fn create_type(&self, name: &str) -> AppResult<ProductType> {
        let product_type = self
            .types
            .create(NewProductType {
                name: name.trim().to_string(),
            })
            .await?;
        tracing::info!(type_id = product_type.id, name = %product_type.name, "Type created");
        Ok(product_type)
    }

    pub async fn update_type(&self, type_id: i32, name: &str) -> AppResult<ProductType> {
        self.types
            .update(
                type_id,
                NewProductType {
                    name: name.trim().to_string(),
                },
            )
            .await?
            .ok_or_else(|| AppError::not_found("Type", "ID", type_id))
    }

    pub async fn delete_type(&self, type_id: i32) -> AppResult<()> {
        if self.types.delete(type_id).await? == 0 {
            return Err(AppError::not_found("Type", "ID", type_id));
        }
        tracing::info!(type_id, "Type deleted");
        Ok(())
    }
}
