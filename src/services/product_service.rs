//! Products, their images, and customer reviews.

use bigdecimal::BigDecimal;
use jiff::Timestamp;
use jiff_diesel::ToDiesel;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{NewProduct, NewProductReview, ProductReview, UpdateProduct};
use crate::repositories::{
    BrandRepository, ProductQuery, ProductRepository, ProductTypeRepository, ProductWithNames,
};
use crate::services::file_storage::FileStorageService;

const PRODUCT_IMAGES_FOLDER: &str = "products";

/// Editable product fields shared by create and update.
#[derive(Debug, Clone)]
pub struct ProductInput {
    pub name: String,
    pub description: String,
    pub price: BigDecimal,
    pub stock_quantity: i32,
    pub product_brand_id: i32,
    pub product_type_id: i32,
}

/// An uploaded file as received from a multipart form.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Clone)]
pub struct ProductService {
    products: ProductRepository,
    brands: BrandRepository,
    types: ProductTypeRepository,
    files: FileStorageService,
}

impl ProductService {
    pub fn new(
        products: ProductRepository,
        brands: BrandRepository,
        types: ProductTypeRepository,
        files: FileStorageService,
    ) -> Self {
        Self {
            products,
            brands,
            types,
            files,
        }
    }

    pub fn files(&self) -> &FileStorageService {
        &self.files
    }

    pub async fn list_products(&self, query: &ProductQuery) -> AppResult<(Vec<ProductWithNames>, i64)> {
        self.products.list(query).await
    }

    pub async fn get_product(&self, product_id: i32) -> AppResult<ProductWithNames> {
        self.products
            .find_with_names(product_id)
            .await?
            .ok_or_else(|| AppError::not_found("Product", "ID", product_id))
    }

    pub async fn create_product(
        &self,
        input: ProductInput,
        image: Option<ImageUpload>,
    ) -> AppResult<ProductWithNames> {
        self.ensure_lookups_exist(&input).await?;

        let picture_url = match image {
            Some(image) => Some(self.store_image(&image).await?),
            None => None,
        };

        let created = self
            .products
            .create(NewProduct {
                name: input.name.trim().to_string(),
                description: input.description.trim().to_string(),
                price: input.price,
                picture_url: picture_url.clone(),
                stock_quantity: input.stock_quantity,
                product_brand_id: input.product_brand_id,
                product_type_id: input.product_type_id,
            })
            .await;

        let product = match created {
            Ok(product) => product,
            Err(e) => {
                if let Some(stored) = picture_url.as_deref() {
                    self.remove_file(stored).await;
                }
                return Err(e);
            }
        };

        tracing::info!(product_id = product.id, name = %product.name, "Product created");
        self.get_product(product.id).await
    }

    /// Replaces the product's fields. A new image supersedes `remove_image`.
    pub async fn update_product(
        &self,
        product_id: i32,
        input: ProductInput,
        image: Option<ImageUpload>,
        remove_image: bool,
    ) -> AppResult<ProductWithNames> {
        let existing = self
            .products
            .find_by_id(product_id)
            .await?
            .ok_or_else(|| AppError::not_found("Product", "ID", product_id))?;
        self.ensure_lookups_exist(&input).await?;

        let stored = match &image {
            Some(image) => Some(self.store_image(image).await?),
            None => None,
        };
        let picture_url = match (&stored, remove_image) {
            (Some(stored), _) => Some(stored.clone()),
            (None, true) => None,
            (None, false) => existing.picture_url.clone(),
        };

        let updated = self
            .products
            .update(
                existing.id,
                UpdateProduct {
                    name: input.name.trim().to_string(),
                    description: input.description.trim().to_string(),
                    price: input.price,
                    picture_url: picture_url.clone(),
                    stock_quantity: input.stock_quantity,
                    product_brand_id: input.product_brand_id,
                    product_type_id: input.product_type_id,
                    updated_at: Timestamp::now().to_diesel(),
                },
            )
            .await;

        let discard = image_to_discard(
            updated.is_ok(),
            existing.picture_url.as_deref(),
            stored.as_deref(),
            picture_url.as_deref(),
        );
        if let Some(path) = discard {
            self.remove_file(path).await;
        }
        updated?;

        tracing::info!(product_id = existing.id, "Product updated");
        self.get_product(existing.id).await
    }

    pub async fn delete_product(&self, product_id: i32) -> AppResult<()> {
        let existing = self
            .products
            .find_by_id(product_id)
            .await?
            .ok_or_else(|| AppError::not_found("Product", "ID", product_id))?;

        self.products.delete(existing.id).await?;
        if let Some(picture) = existing.picture_url.as_deref() {
            self.remove_file(picture).await;
        }
        tracing::info!(product_id = existing.id, "Product deleted");
        Ok(())
    }

    pub async fn list_reviews(&self, product_id: i32) -> AppResult<Vec<(ProductReview, String)>> {
        self.products
            .find_by_id(product_id)
            .await?
            .ok_or_else(|| AppError::not_found("Product", "ID", product_id))?;
        self.products.reviews(product_id).await
    }

    /// Adds the caller's review. A second review of the same product is a
    /// duplicate.
    pub async fn add_review(
        &self,
        product_id: i32,
        user_id: Uuid,
        rating: i32,
        comment: Option<String>,
    ) -> AppResult<ProductReview> {
        self.products
            .find_by_id(product_id)
            .await?
            .ok_or_else(|| AppError::not_found("Product", "ID", product_id))?;

        let review = self
            .products
            .add_review(NewProductReview {
                product_id,
                user_id,
                rating,
                comment: comment
                    .map(|c| c.trim().to_string())
                    .filter(|c| !c.is_empty()),
            })
            .await
            .map_err(|e| match e {
                AppError::Duplicate { .. } => AppError::Duplicate {
                    entity: "Review".to_string(),
                    field: "productId".to_string(),
                    value: product_id.to_string(),
                },
                other => other,
            })?;

        tracing::info!(product_id, %user_id, rating, "Review added");
        Ok(review)
    }

    async fn ensure_lookups_exist(&self, input: &ProductInput) -> AppResult<()> {
        if self.brands.find_by_id(input.product_brand_id).await?.is_none() {
            return Err(AppError::not_found("Brand", "ID", input.product_brand_id));
        }
        if self.types.find_by_id(input.product_type_id).await?.is_none() {
            return Err(AppError::not_found("Type", "ID", input.product_type_id));
        }
        Ok(())
    }

    async fn store_image(&self, image: &ImageUpload) -> AppResult<String> {
        self.files
            .save(PRODUCT_IMAGES_FOLDER, &image.file_name, &image.bytes)
            .await
    }

    async fn remove_file(&self, relative: &str) {
        if let Err(e) = self.files.delete(relative).await {
            tracing::warn!(path = relative, error = %e, "Failed to delete product image");
        }
    }
}

/// The file an update leaves unreferenced: the superseded image when the
/// row was written, or the freshly stored upload when it was not.
fn image_to_discard<'a>(
    written: bool,
    previous: Option<&'a str>,
    stored: Option<&'a str>,
    current: Option<&'a str>,
) -> Option<&'a str> {
    if written {
        previous.filter(|p| current != Some(*p))
    } else {
        stored
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_update_discards_new_upload_only() {
        let old = Some("products/old.png");
        let new = Some("products/new.png");
        assert_eq!(image_to_discard(false, old, new, new), new);
        assert_eq!(image_to_discard(false, old, None, old), None);
    }

    #[test]
    fn test_successful_update_discards_superseded_image() {
        let old = Some("products/old.png");
        let new = Some("products/new.png");
        assert_eq!(image_to_discard(true, old, new, new), old);
        assert_eq!(image_to_discard(true, old, None, None), old);
        assert_eq!(image_to_discard(true, old, None, old), None);
        assert_eq!(image_to_discard(true, None, new, new), None);
    }
}
