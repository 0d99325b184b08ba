//! Cart repository: mutable pre-purchase line items.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use orchard_core::{CartId, CartLineId, Money, ProductId, UserId};

use super::RepositoryError;
use crate::models::cart::{Cart, CartLine};

#[derive(Debug, sqlx::FromRow)]
struct CartRow {
    id: CartId,
    user_id: Option<UserId>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct CartLineRow {
    id: CartLineId,
    cart_id: CartId,
    product_id: ProductId,
    quantity: i32,
}

impl From<CartLineRow> for CartLine {
    fn from(row: CartLineRow) -> Self {
        Self {
            id: row.id,
            cart_id: row.cart_id,
            product_id: row.product_id,
            quantity: row.quantity,
        }
    }
}

/// One cart line joined with the product's current price, as read inside
/// the checkout transaction.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct PricedLine {
    /// Referenced product.
    pub product_id: ProductId,
    /// Quantity in the cart.
    pub quantity: i32,
    /// Product's price at the moment of the read.
    pub unit_price: Money,
}

/// Repository for cart database operations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Allocate a new empty cart, optionally owned by a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, user_id: Option<UserId>) -> Result<Cart, RepositoryError> {
        let row = sqlx::query_as::<_, CartRow>(
            r"
            INSERT INTO carts (user_id)
            VALUES ($1)
            RETURNING id, user_id, created_at
            ",
        )
        .bind(user_id)
        .fetch_one(self.pool)
        .await?;

        Ok(Cart {
            id: row.id,
            user_id: row.user_id,
            lines: Vec::new(),
            created_at: row.created_at,
        })
    }

    /// Get a cart with its lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get(&self, cart_id: CartId) -> Result<Option<Cart>, RepositoryError> {
        let row = sqlx::query_as::<_, CartRow>(
            "SELECT id, user_id, created_at FROM carts WHERE id = $1",
        )
        .bind(cart_id)
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let lines = sqlx::query_as::<_, CartLineRow>(
            r"
            SELECT id, cart_id, product_id, quantity
            FROM cart_lines
            WHERE cart_id = $1
            ORDER BY id
            ",
        )
        .bind(cart_id)
        .fetch_all(self.pool)
        .await?;

        Ok(Some(Cart {
            id: row.id,
            user_id: row.user_id,
            lines: lines.into_iter().map(CartLine::from).collect(),
            created_at: row.created_at,
        }))
    }

    /// Add a product to a cart, or bump the quantity of its existing line.
    ///
    /// The `(cart_id, product_id)` pair is unique, so a concurrent add of
    /// the same product lands on the same row; the upsert makes the
    /// increment atomic. The caller is responsible for having verified that
    /// the cart and product exist and that `quantity >= 1`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the upsert fails (including
    /// foreign-key violations for a vanished cart or product).
    pub async fn add_line(
        &self,
        cart_id: CartId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<CartLine, RepositoryError> {
        let row = sqlx::query_as::<_, CartLineRow>(
            r"
            INSERT INTO cart_lines (cart_id, product_id, quantity)
            VALUES ($1, $2, $3)
            ON CONFLICT (cart_id, product_id)
            DO UPDATE SET quantity = cart_lines.quantity + EXCLUDED.quantity
            RETURNING id, cart_id, product_id, quantity
            ",
        )
        .bind(cart_id)
        .bind(product_id)
        .bind(quantity)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Remove a line from a cart if it belongs to that cart.
    ///
    /// Returns `None` (not an error) when the line is absent or owned by a
    /// different cart, making removal idempotent.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn remove_line(
        &self,
        cart_id: CartId,
        line_id: CartLineId,
    ) -> Result<Option<CartLine>, RepositoryError> {
        let row = sqlx::query_as::<_, CartLineRow>(
            r"
            DELETE FROM cart_lines
            WHERE id = $1 AND cart_id = $2
            RETURNING id, cart_id, product_id, quantity
            ",
        )
        .bind(line_id)
        .bind(cart_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(CartLine::from))
    }

    // =========================================================================
    // Transaction-scoped statements (used by the checkout service)
    // =========================================================================

    /// Lock a cart row for the duration of the surrounding transaction.
    ///
    /// Concurrent checkouts of the same cart serialize here; the loser
    /// re-reads the lines after the winner committed and finds them gone.
    ///
    /// # Errors
    ///
    /// Returns `sqlx::Error` if the query fails.
    pub async fn lock(
        conn: &mut PgConnection,
        cart_id: CartId,
    ) -> Result<Option<(CartId, Option<UserId>)>, sqlx::Error> {
        let row = sqlx::query_as::<_, (CartId, Option<UserId>)>(
            "SELECT id, user_id FROM carts WHERE id = $1 FOR UPDATE",
        )
        .bind(cart_id)
        .fetch_optional(conn)
        .await?;

        Ok(row)
    }

    /// Read a cart's lines joined with each product's current price.
    ///
    /// # Errors
    ///
    /// Returns `sqlx::Error` if the query fails.
    pub async fn priced_lines(
        conn: &mut PgConnection,
        cart_id: CartId,
    ) -> Result<Vec<PricedLine>, sqlx::Error> {
        sqlx::query_as::<_, PricedLine>(
            r"
            SELECT cl.product_id, cl.quantity, p.price AS unit_price
            FROM cart_lines cl
            JOIN products p ON p.id = cl.product_id
            WHERE cl.cart_id = $1
            ORDER BY cl.id
            ",
        )
        .bind(cart_id)
        .fetch_all(conn)
        .await
    }

    /// Delete all lines of a cart. The cart row itself survives.
    ///
    /// # Errors
    ///
    /// Returns `sqlx::Error` if the delete fails.
    pub async fn clear_lines(conn: &mut PgConnection, cart_id: CartId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM cart_lines WHERE cart_id = $1")
            .bind(cart_id)
            .execute(conn)
            .await?;

        Ok(result.rows_affected())
    }
}
