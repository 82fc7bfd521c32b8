use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::db::AsyncDbPool;
use crate::error::{AppError, AppResult};
use crate::models::{NewProductBrand, ProductBrand};

#[derive(Clone)]
pub struct BrandRepository {
    pool: AsyncDbPool,
}

impl BrandRepository {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> AppResult<Vec<ProductBrand>> {
        use crate::schema::product_brands::dsl::*;
        let mut conn = self.pool.get().await?;

        product_brands
            .order(name.asc())
            .select(ProductBrand::as_select())
            .load(&mut conn)
            .await
            .map_err(AppError::from)
    }

    pub async fn find_by_id(&self, brand_id: i32) -> AppResult<Option<ProductBrand>> {
        use crate::schema::product_brands::dsl::*;
        let mut conn = self.pool.get().await?;

        product_brands
            .filter(id.eq(brand_id))
            .select(ProductBrand::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(AppError::from)
    }

    pub async fn create(&self, new_brand: NewProductBrand) -> AppResult<ProductBrand> {
        use crate::schema::product_brands::dsl::*;
        let mut conn = self.pool.get().await?;

        diesel::insert_into(product_brands)
            .values(&new_brand)
            .returning(ProductBrand::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(AppError::from)
    }

    pub async fn update(
        &self,
        brand_id: i32,
        changes: NewProductBrand,
    ) -> AppResult<Option<ProductBrand>> {
        use crate::schema::product_brands::dsl::*;
        let mut conn = self.pool.get().await?;

        diesel::update(product_brands.filter(id.eq(brand_id)))
            .set(&changes)
            .returning(ProductBrand::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(AppError::from)
    }

    pub async fn delete(&self, brand_id: i32) -> AppResult<usize> {
        use crate::schema::product_brands::dsl::*;
        let mut conn = self.pool.get().await?;

        diesel::delete(product_brands.filter(id.eq(brand_id)))
            .execute(&mut conn)
            .await
            .map_err(AppError::from)
    }
}
