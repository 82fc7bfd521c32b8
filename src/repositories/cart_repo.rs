//! Basket and wishlist documents stored as a header row plus item rows.

use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use jiff::Timestamp;
use jiff_diesel::ToDiesel;

use crate::db::AsyncDbPool;
use crate::error::{AppError, AppResult};
use crate::models::{CartItemRecord, CartKind, CartRecord, NewCartRecord};

/// A cart header with its items in position order.
pub type StoredCart = (CartRecord, Vec<CartItemRecord>);

#[derive(Clone)]
pub struct CartRepository {
    pool: AsyncDbPool,
}

impl CartRepository {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }

    /// Loads a cart and its items in insertion order.
    pub async fn find(
        &self,
        cart_kind: CartKind,
        cart_id: &str,
    ) -> AppResult<Option<StoredCart>> {
        use crate::schema::{cart_items, carts};
        let mut conn = self.pool.get().await?;

        let Some(header) = carts::table
            .filter(carts::kind.eq(cart_kind))
            .filter(carts::id.eq(cart_id))
            .select(CartRecord::as_select())
            .first(&mut conn)
            .await
            .optional()?
        else {
            return Ok(None);
        };

        let items = cart_items::table
            .filter(cart_items::kind.eq(cart_kind))
            .filter(cart_items::cart_id.eq(cart_id))
            .order(cart_items::position.asc())
            .select(CartItemRecord::as_select())
            .load(&mut conn)
            .await?;

        Ok(Some((header, items)))
    }

    /// Upserts the header and replaces every item row in one transaction.
    pub async fn save(&self, header: NewCartRecord, items: Vec<CartItemRecord>) -> AppResult<()> {
        let (cart_kind, cart_id) = (header.kind, header.id.clone());
        self.modify(cart_kind, &cart_id, Some(header.clone()), move |_| {
            Ok((header, items, ()))
        })
        .await?;
        Ok(())
    }

    /// Read-modify-write of one cart under a row lock on its header.
    ///
    /// `apply` sees the stored document and returns the replacement plus a
    /// value handed back to the caller. When `create_missing` is set a
    /// missing cart is first inserted with that header, so concurrent first
    /// writes queue on the same row; otherwise a missing cart yields `None`.
    pub async fn modify<T, F>(
        &self,
        cart_kind: CartKind,
        cart_id: &str,
        create_missing: Option<NewCartRecord>,
        apply: F,
    ) -> AppResult<Option<T>>
    where
        T: Send,
        F: FnOnce(StoredCart) -> AppResult<(NewCartRecord, Vec<CartItemRecord>, T)> + Send,
    {
        use crate::schema::{cart_items, carts};
        let mut conn = self.pool.get().await?;

        conn.transaction::<_, AppError, _>(|conn| {
            async move {
                if let Some(empty) = &create_missing {
                    diesel::insert_into(carts::table)
                        .values(empty)
                        .on_conflict((carts::kind, carts::id))
                        .do_nothing()
                        .execute(conn)
                        .await?;
                }

                let Some(stored) = carts::table
                    .filter(carts::kind.eq(cart_kind))
                    .filter(carts::id.eq(cart_id))
                    .select(CartRecord::as_select())
                    .for_update()
                    .first(conn)
                    .await
                    .optional()?
                else {
                    return Ok(None);
                };

                let stored_items = cart_items::table
                    .filter(cart_items::kind.eq(cart_kind))
                    .filter(cart_items::cart_id.eq(cart_id))
                    .order(cart_items::position.asc())
                    .select(CartItemRecord::as_select())
                    .load(conn)
                    .await?;

                let (header, items, output) = apply((stored, stored_items))?;

                diesel::update(
                    carts::table
                        .filter(carts::kind.eq(cart_kind))
                        .filter(carts::id.eq(cart_id)),
                )
                .set(&header)
                .execute(conn)
                .await?;

                diesel::delete(
                    cart_items::table
                        .filter(cart_items::kind.eq(cart_kind))
                        .filter(cart_items::cart_id.eq(cart_id)),
                )
                .execute(conn)
                .await?;

                if !items.is_empty() {
                    diesel::insert_into(cart_items::table)
                        .values(&items)
                        .execute(conn)
                        .await?;
                }
                Ok(Some(output))
            }
            .scope_boxed()
        })
        .await
    }

    pub async fn delete(&self, cart_kind: CartKind, cart_id: &str) -> AppResult<usize> {
        use crate::schema::carts::dsl::*;
        let mut conn = self.pool.get().await?;

        diesel::delete(carts.filter(kind.eq(cart_kind)).filter(id.eq(cart_id)))
            .execute(&mut conn)
            .await
            .map_err(AppError::from)
    }

    /// Deletes carts of any kind not written since `cutoff`.
    pub async fn purge_untouched_since(&self, cutoff: Timestamp) -> AppResult<usize> {
        use crate::schema::carts::dsl::*;
        let mut conn = self.pool.get().await?;

        diesel::delete(carts.filter(updated_at.lt(cutoff.to_diesel())))
            .execute(&mut conn)
            .await
            .map_err(AppError::from)
    }
}
