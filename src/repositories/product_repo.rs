//! Products with their brand/type names, and product reviews.

use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};

use crate::db::AsyncDbPool;
use crate::error::{AppError, AppResult};
use crate::models::{NewProduct, NewProductReview, Product, ProductReview, UpdateProduct};
use crate::repositories::user_repo::escape_like;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProductSort {
    #[default]
    NameAsc,
    NameDesc,
    PriceAsc,
    PriceDesc,
    RatingDesc,
}

#[derive(Debug, Clone, Default)]
pub struct ProductQuery {
    pub brand_id: Option<i32>,
    pub type_id: Option<i32>,
    pub search: Option<String>,
    pub min_average_rating: Option<f64>,
    pub sort: ProductSort,
    pub offset: i64,
    pub limit: i64,
}

/// A product row joined with its brand and type names.
#[derive(Debug, Clone)]
pub struct ProductWithNames {
    pub product: Product,
    pub brand_name: String,
    pub type_name: String,
}

impl From<(Product, String, String)> for ProductWithNames {
    fn from((product, brand_name, type_name): (Product, String, String)) -> Self {
        Self {
            product,
            brand_name,
            type_name,
        }
    }
}

#[derive(Clone)]
pub struct ProductRepository {
    pool: AsyncDbPool,
}

impl ProductRepository {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, query: &ProductQuery) -> AppResult<(Vec<ProductWithNames>, i64)> {
        use crate::schema::{product_brands, product_types, products};
        let mut conn = self.pool.get().await?;

        let filtered = || {
            let mut q = products::table
                .inner_join(product_brands::table)
                .inner_join(product_types::table)
                .into_boxed();
            if let Some(brand) = query.brand_id {
                q = q.filter(products::product_brand_id.eq(brand));
            }
            if let Some(kind) = query.type_id {
                q = q.filter(products::product_type_id.eq(kind));
            }
            if let Some(term) = query.search.as_deref().filter(|s| !s.trim().is_empty()) {
                q = q.filter(products::name.ilike(format!("%{}%", escape_like(term.trim()))));
            }
            if let Some(min_rating) = query.min_average_rating {
                q = q.filter(products::average_rating.ge(min_rating));
            }
            q
        };

        let total = filtered().count().get_result::<i64>(&mut conn).await?;

        let ordered = match query.sort {
            ProductSort::NameAsc => filtered().order((products::name.asc(), products::id.asc())),
            ProductSort::NameDesc => filtered().order((products::name.desc(), products::id.asc())),
            ProductSort::PriceAsc => filtered().order((products::price.asc(), products::id.asc())),
            ProductSort::PriceDesc => {
                filtered().order((products::price.desc(), products::id.asc()))
            }
            ProductSort::RatingDesc => {
                filtered().order((products::average_rating.desc(), products::id.asc()))
            }
        };

        let rows: Vec<(Product, String, String)> = ordered
            .offset(query.offset)
            .limit(query.limit)
            .select((
                Product::as_select(),
                product_brands::name,
                product_types::name,
            ))
            .load(&mut conn)
            .await?;

        Ok((rows.into_iter().map(ProductWithNames::from).collect(), total))
    }

    pub async fn find_with_names(&self, product_id: i32) -> AppResult<Option<ProductWithNames>> {
        use crate::schema::{product_brands, product_types, products};
        let mut conn = self.pool.get().await?;

        products::table
            .inner_join(product_brands::table)
            .inner_join(product_types::table)
            .filter(products::id.eq(product_id))
            .select((
                Product::as_select(),
                product_brands::name,
                product_types::name,
            ))
            .first::<(Product, String, String)>(&mut conn)
            .await
            .optional()
            .map(|row| row.map(ProductWithNames::from))
            .map_err(AppError::from)
    }

    pub async fn find_by_id(&self, product_id: i32) -> AppResult<Option<Product>> {
        use crate::schema::products::dsl::*;
        let mut conn = self.pool.get().await?;

        products
            .filter(id.eq(product_id))
            .select(Product::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(AppError::from)
    }

    pub async fn create(&self, new_product: NewProduct) -> AppResult<Product> {
        use crate::schema::products::dsl::*;
        let mut conn = self.pool.get().await?;

        diesel::insert_into(products)
            .values(&new_product)
            .returning(Product::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(AppError::from)
    }

    pub async fn update(&self, product_id: i32, changes: UpdateProduct) -> AppResult<Product> {
        use crate::schema::products::dsl::*;
        let mut conn = self.pool.get().await?;

        diesel::update(products.filter(id.eq(product_id)))
            .set(&changes)
            .returning(Product::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(AppError::from)
    }

    pub async fn delete(&self, product_id: i32) -> AppResult<usize> {
        use crate::schema::products::dsl::*;
        let mut conn = self.pool.get().await?;

        diesel::delete(products.filter(id.eq(product_id)))
            .execute(&mut conn)
            .await
            .map_err(AppError::from)
    }

    /// Reviews of a product with the author's user name, newest first.
    pub async fn reviews(&self, product: i32) -> AppResult<Vec<(ProductReview, String)>> {
        use crate::schema::{product_reviews, users};
        let mut conn = self.pool.get().await?;

        product_reviews::table
            .inner_join(users::table)
            .filter(product_reviews::product_id.eq(product))
            .order(product_reviews::created_at.desc())
            .select((ProductReview::as_select(), users::user_name))
            .load(&mut conn)
            .await
            .map_err(AppError::from)
    }

    /// Inserts the review and refreshes the product's rating aggregates in
    /// the same transaction.
    pub async fn add_review(&self, review: NewProductReview) -> AppResult<ProductReview> {
        use crate::schema::{product_reviews, products};
        let mut conn = self.pool.get().await?;

        conn.transaction::<_, AppError, _>(|conn| {
            async move {
                let created = diesel::insert_into(product_reviews::table)
                    .values(&review)
                    .returning(ProductReview::as_returning())
                    .get_result(conn)
                    .await?;

                let ratings: Vec<i32> = product_reviews::table
                    .filter(product_reviews::product_id.eq(review.product_id))
                    .select(product_reviews::rating)
                    .load(conn)
                    .await?;
                let (count, average) = rating_summary(&ratings);

                diesel::update(products::table.filter(products::id.eq(review.product_id)))
                    .set((
                        products::number_of_reviews.eq(count),
                        products::average_rating.eq(average),
                    ))
                    .execute(conn)
                    .await?;

                Ok(created)
            }
            .scope_boxed()
        })
        .await
    }
}

/// Review count and mean rating rounded to one decimal.
pub(crate) fn rating_summary(ratings: &[i32]) -> (i32, f64) {
    if ratings.is_empty() {
        return (0, 0.0);
    }
    let sum: i64 = ratings.iter().map(|r| i64::from(*r)).sum();
    let average = sum as f64 / ratings.len() as f64;
    (ratings.len() as i32, (average * 10.0).round() / 10.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_rating_summary() {
        assert_eq!(rating_summary(&[]), (0, 0.0));
        assert_eq!(rating_summary(&[5]), (1, 5.0));
        assert_eq!(rating_summary(&[4, 5, 5]), (3, 4.7));
    }

    proptest! {
        #[test]
        fn test_average_stays_within_rating_bounds(ratings in prop::collection::vec(1i32..=5, 1..200)) {
            let (count, average) = rating_summary(&ratings);
            prop_assert_eq!(count as usize, ratings.len());
            prop_assert!((1.0..=5.0).contains(&average));
        }
    }
}
