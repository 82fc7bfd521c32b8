//! Orders, their line items, and delivery methods.
//!
//! Writes that change what a buyer should be told about also insert an
//! `order_notifications` row inside the same transaction.

use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use jiff::Timestamp;
use jiff_diesel::ToDiesel;

use crate::db::AsyncDbPool;
use crate::error::{AppError, AppResult};
use crate::models::{
    DeliveryMethod, NewDeliveryMethod, NewOrder, NewOrderItem, NewOrderNotification,
    NotificationKind, Order, OrderItem, OrderStatus,
};
use crate::repositories::user_repo::escape_like;

/// Line of an order before the order id exists.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderLineDraft {
    pub product_id: i32,
    pub product_name: String,
    pub picture_url: Option<String>,
    pub price: bigdecimal::BigDecimal,
    pub quantity: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderSort {
    DateAsc,
    #[default]
    DateDesc,
}

#[derive(Debug, Clone, Default)]
pub struct OrderQuery {
    pub search: Option<String>,
    pub buyer_email: Option<String>,
    pub status: Option<OrderStatus>,
    pub sort: OrderSort,
    pub offset: i64,
    pub limit: i64,
}

#[derive(Clone)]
pub struct OrderRepository {
    pool: AsyncDbPool,
}

impl OrderRepository {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }

    pub async fn delivery_methods(&self) -> AppResult<Vec<DeliveryMethod>> {
        use crate::schema::delivery_methods::dsl::*;
        let mut conn = self.pool.get().await?;

        delivery_methods
            .order((price.asc(), id.asc()))
            .select(DeliveryMethod::as_select())
            .load(&mut conn)
            .await
            .map_err(AppError::from)
    }

    pub async fn find_delivery_method(&self, method_id: i32) -> AppResult<Option<DeliveryMethod>> {
        use crate::schema::delivery_methods::dsl::*;
        let mut conn = self.pool.get().await?;

        delivery_methods
            .filter(id.eq(method_id))
            .select(DeliveryMethod::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(AppError::from)
    }

    pub async fn create_delivery_method(
        &self,
        method: NewDeliveryMethod,
    ) -> AppResult<DeliveryMethod> {
        use crate::schema::delivery_methods::dsl::*;
        let mut conn = self.pool.get().await?;

        diesel::insert_into(delivery_methods)
            .values(&method)
            .returning(DeliveryMethod::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(AppError::from)
    }

    /// Writes the order, its lines and an order-confirmation notification.
    pub async fn create(
        &self,
        new_order: NewOrder,
        lines: Vec<OrderLineDraft>,
    ) -> AppResult<(Order, Vec<OrderItem>)> {
        use crate::schema::{order_items, order_notifications, orders};
        let mut conn = self.pool.get().await?;

        conn.transaction::<_, AppError, _>(|conn| {
            async move {
                let order = diesel::insert_into(orders::table)
                    .values(&new_order)
                    .returning(Order::as_returning())
                    .get_result(conn)
                    .await?;

                let rows: Vec<NewOrderItem> = lines
                    .into_iter()
                    .map(|line| NewOrderItem {
                        order_id: order.id,
                        product_id: line.product_id,
                        product_name: line.product_name,
                        picture_url: line.picture_url,
                        price: line.price,
                        quantity: line.quantity,
                    })
                    .collect();

                let items = diesel::insert_into(order_items::table)
                    .values(&rows)
                    .returning(OrderItem::as_returning())
                    .get_results(conn)
                    .await?;

                diesel::insert_into(order_notifications::table)
                    .values(&NewOrderNotification::pending(
                        order.id,
                        NotificationKind::OrderConfirmation,
                        order.buyer_email.clone(),
                    ))
                    .execute(conn)
                    .await?;

                Ok((order, items))
            }
            .scope_boxed()
        })
        .await
    }

    pub async fn find_by_id(&self, order_id: i32) -> AppResult<Option<Order>> {
        use crate::schema::orders::dsl::*;
        let mut conn = self.pool.get().await?;

        orders
            .filter(id.eq(order_id))
            .select(Order::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(AppError::from)
    }

    pub async fn items_for(&self, order: &Order) -> AppResult<Vec<OrderItem>> {
        let mut conn = self.pool.get().await?;

        OrderItem::belonging_to(order)
            .order(crate::schema::order_items::id.asc())
            .select(OrderItem::as_select())
            .load(&mut conn)
            .await
            .map_err(AppError::from)
    }

    /// A buyer's order; other buyers' orders are indistinguishable from
    /// missing ones.
    pub async fn find_for_buyer(
        &self,
        order_id: i32,
        email: &str,
    ) -> AppResult<Option<(Order, Vec<OrderItem>)>> {
        use crate::schema::orders::dsl::*;
        let mut conn = self.pool.get().await?;

        let Some(order) = orders
            .filter(id.eq(order_id))
            .filter(buyer_email.eq(email))
            .select(Order::as_select())
            .first(&mut conn)
            .await
            .optional()?
        else {
            return Ok(None);
        };
        drop(conn);

        let items = self.items_for(&order).await?;
        Ok(Some((order, items)))
    }

    /// All orders of a buyer with their items, newest first.
    pub async fn list_for_buyer(&self, email: &str) -> AppResult<Vec<(Order, Vec<OrderItem>)>> {
        use crate::schema::orders::dsl::*;
        let mut conn = self.pool.get().await?;

        let buyer_orders = orders
            .filter(buyer_email.eq(email))
            .order((order_date.desc(), id.desc()))
            .select(Order::as_select())
            .load(&mut conn)
            .await?;

        let items = OrderItem::belonging_to(&buyer_orders)
            .order(crate::schema::order_items::id.asc())
            .select(OrderItem::as_select())
            .load(&mut conn)
            .await?;

        Ok(items
            .grouped_by(&buyer_orders)
            .into_iter()
            .zip(buyer_orders)
            .map(|(items, order)| (order, items))
            .collect())
    }

    pub async fn list(&self, query: &OrderQuery) -> AppResult<(Vec<Order>, i64)> {
        use crate::schema::orders;
        let mut conn = self.pool.get().await?;

        let filtered = || {
            let mut q = orders::table.into_boxed();
            if let Some(term) = query.search.as_deref().filter(|s| !s.trim().is_empty()) {
                q = q.filter(
                    orders::buyer_email.ilike(format!("%{}%", escape_like(term.trim()))),
                );
            }
            if let Some(email) = query.buyer_email.as_deref().filter(|s| !s.trim().is_empty()) {
                q = q.filter(orders::buyer_email.eq(email.trim().to_lowercase()));
            }
            if let Some(status) = query.status {
                q = q.filter(orders::status.eq(status));
            }
            q
        };

        let total = filtered().count().get_result::<i64>(&mut conn).await?;

        let ordered = match query.sort {
            OrderSort::DateAsc => filtered().order((orders::order_date.asc(), orders::id.asc())),
            OrderSort::DateDesc => {
                filtered().order((orders::order_date.desc(), orders::id.desc()))
            }
        };

        let rows = ordered
            .offset(query.offset)
            .limit(query.limit)
            .select(Order::as_select())
            .load(&mut conn)
            .await?;

        Ok((rows, total))
    }

    /// Sets the status and queues a status-change email in the same
    /// transaction. With `expected`, the row only changes while it still
    /// holds that status. `None` means no row matched.
    pub async fn update_status(
        &self,
        order_id: i32,
        new_status: OrderStatus,
        expected: Option<OrderStatus>,
    ) -> AppResult<Option<Order>> {
        use crate::schema::{order_notifications, orders};
        let mut conn = self.pool.get().await?;
        let now = Timestamp::now().to_diesel();

        conn.transaction::<_, AppError, _>(|conn| {
            async move {
                let target = orders::table.filter(orders::id.eq(order_id));
                let updated = match expected {
                    Some(expected) => {
                        diesel::update(target.filter(orders::status.eq(expected)))
                            .set((orders::status.eq(new_status), orders::updated_at.eq(now)))
                            .returning(Order::as_returning())
                            .get_result(conn)
                            .await
                    }
                    None => {
                        diesel::update(target)
                            .set((orders::status.eq(new_status), orders::updated_at.eq(now)))
                            .returning(Order::as_returning())
                            .get_result(conn)
                            .await
                    }
                };
                let Some(order) = updated.optional()? else {
                    return Ok(None);
                };

                diesel::insert_into(order_notifications::table)
                    .values(&NewOrderNotification::pending(
                        order.id,
                        NotificationKind::StatusChanged,
                        order.buyer_email.clone(),
                    ))
                    .execute(conn)
                    .await?;
                Ok(Some(order))
            }
            .scope_boxed()
        })
        .await
    }
}
