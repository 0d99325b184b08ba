//! Order repository: immutable purchase snapshots.
//!
//! Orders are written once, inside the checkout transaction, and never
//! updated afterwards except for the single `paid` flip owned by the
//! payment ledger.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use orchard_core::{Money, OrderId, OrderLineId, ProductId, UserId};

use super::RepositoryError;
use crate::models::order::{Order, OrderLine};

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    total_amount: Money,
    paid: bool,
    user_id: Option<UserId>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct OrderLineRow {
    id: OrderLineId,
    order_id: OrderId,
    product_id: ProductId,
    quantity: i32,
    unit_price: Money,
}

impl From<OrderLineRow> for OrderLine {
    fn from(row: OrderLineRow) -> Self {
        Self {
            id: row.id,
            order_id: row.order_id,
            product_id: row.product_id,
            quantity: row.quantity,
            unit_price: row.unit_price,
        }
    }
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get an order with its lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get(&self, order_id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT id, total_amount, paid, user_id, created_at
            FROM orders
            WHERE id = $1
            ",
        )
        .bind(order_id)
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let lines = sqlx::query_as::<_, OrderLineRow>(
            r"
            SELECT id, order_id, product_id, quantity, unit_price
            FROM order_lines
            WHERE order_id = $1
            ORDER BY id
            ",
        )
        .bind(order_id)
        .fetch_all(self.pool)
        .await?;

        Ok(Some(Order {
            id: row.id,
            total_amount: row.total_amount,
            paid: row.paid,
            user_id: row.user_id,
            lines: lines.into_iter().map(OrderLine::from).collect(),
            created_at: row.created_at,
        }))
    }

    // =========================================================================
    // Transaction-scoped statements (used by the checkout service)
    // =========================================================================

    /// Insert a new unpaid order with a zero total placeholder.
    ///
    /// The real total is set by [`Self::set_total`] once all lines are
    /// materialized, within the same transaction.
    ///
    /// # Errors
    ///
    /// Returns `sqlx::Error` if the insert fails.
    pub async fn insert(
        conn: &mut PgConnection,
        user_id: Option<UserId>,
    ) -> Result<(OrderId, DateTime<Utc>), sqlx::Error> {
        sqlx::query_as::<_, (OrderId, DateTime<Utc>)>(
            r"
            INSERT INTO orders (total_amount, paid, user_id)
            VALUES (0, FALSE, $1)
            RETURNING id, created_at
            ",
        )
        .bind(user_id)
        .fetch_one(conn)
        .await
    }

    /// Insert one snapshot line for an order.
    ///
    /// # Errors
    ///
    /// Returns `sqlx::Error` if the insert fails.
    pub async fn insert_line(
        conn: &mut PgConnection,
        order_id: OrderId,
        product_id: ProductId,
        quantity: i32,
        unit_price: Money,
    ) -> Result<OrderLine, sqlx::Error> {
        let row = sqlx::query_as::<_, OrderLineRow>(
            r"
            INSERT INTO order_lines (order_id, product_id, quantity, unit_price)
            VALUES ($1, $2, $3, $4)
            RETURNING id, order_id, product_id, quantity, unit_price
            ",
        )
        .bind(order_id)
        .bind(product_id)
        .bind(quantity)
        .bind(unit_price)
        .fetch_one(conn)
        .await?;

        Ok(row.into())
    }

    /// Set the order's total after all lines are in place.
    ///
    /// # Errors
    ///
    /// Returns `sqlx::Error` if the update fails.
    pub async fn set_total(
        conn: &mut PgConnection,
        order_id: OrderId,
        total: Money,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE orders SET total_amount = $2 WHERE id = $1")
            .bind(order_id)
            .bind(total)
            .execute(conn)
            .await?;

        Ok(())
    }
}
