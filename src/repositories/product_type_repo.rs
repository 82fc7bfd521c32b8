use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::db::AsyncDbPool;
use crate::error::{AppError, AppResult};
use crate::models::{NewProductType, ProductType};

#[derive(Clone)]
pub struct ProductTypeRepository {
    pool: AsyncDbPool,
}

impl ProductTypeRepository {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> AppResult<Vec<ProductType>> {
        use crate::schema::product_types::dsl::*;
        let mut conn = self.pool.get().await?;

        product_types
            .order(name.asc())
            .select(ProductType::as_select())
            .load(&mut conn)
            .await
            .map_err(AppError::from)
    }

    pub async fn find_by_id(&self, type_id: i32) -> AppResult<Option<ProductType>> {
        use crate::schema::product_types::dsl::*;
        let mut conn = self.pool.get().await?;

        product_types
            .filter(id.eq(type_id))
            .select(ProductType::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(AppError::from)
    }

    pub async fn create(&self, new_type: NewProductType) -> AppResult<ProductType> {
        use crate::schema::product_types::dsl::*;
        let mut conn = self.pool.get().await?;

        diesel::insert_into(product_types)
            .values(&new_type)
            .returning(ProductType::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(AppError::from)
    }

    pub async fn update(
        &self,
        type_id: i32,
        changes: NewProductType,
    ) -> AppResult<Option<ProductType>> {
        use crate::schema::product_types::dsl::*;
        let mut conn = self.pool.get().await?;

        diesel::update(product_types.filter(id.eq(type_id)))
            .set(&changes)
            .returning(ProductType::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(AppError::from)
    }

    pub async fn delete(&self, type_id: i32) -> AppResult<usize> {
        use crate::schema::product_types::dsl::*;
        let mut conn = self.pool.get().await?;

        diesel::delete(product_types.filter(id.eq(type_id)))
            .execute(&mut conn)
            .await
            .map_err(AppError::from)
    }
}
