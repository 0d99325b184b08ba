//! Payment repository: the append-only payment log and the `paid` flip.
//!
//! The order's `paid` flag and its settling payment row always change in
//! the same transaction. The flip itself is a compare-and-set (`WHERE paid
//! = FALSE`), so two concurrent settlements of one order cannot both win.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use orchard_core::{Money, OrderId, PaymentId, PaymentStatus};

use super::RepositoryError;
use crate::models::payment::Payment;

#[derive(Debug, sqlx::FromRow)]
struct PaymentRow {
    id: PaymentId,
    order_id: OrderId,
    amount: Money,
    provider: String,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<PaymentRow> for Payment {
    type Error = RepositoryError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        let status = row.status.parse::<PaymentStatus>().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid payment status in database: {e}"))
        })?;

        Ok(Self {
            id: row.id,
            order_id: row.order_id,
            amount: row.amount,
            provider: row.provider,
            status,
            created_at: row.created_at,
        })
    }
}

/// Repository for payment database operations.
pub struct PaymentRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PaymentRepository<'a> {
    /// Create a new payment repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all payments recorded against an order, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, or
    /// `RepositoryError::DataCorruption` if a stored status is invalid.
    pub async fn list_for_order(&self, order_id: OrderId) -> Result<Vec<Payment>, RepositoryError> {
        let rows = sqlx::query_as::<_, PaymentRow>(
            r"
            SELECT id, order_id, amount, provider, status, created_at
            FROM payments
            WHERE order_id = $1
            ORDER BY id
            ",
        )
        .bind(order_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Payment::try_from).collect()
    }

    // =========================================================================
    // Transaction-scoped statements (used by the payment ledger)
    // =========================================================================

    /// Flip `paid` from false to true, if and only if it is currently false.
    ///
    /// Returns `true` when this call won the transition. `false` means the
    /// order is already paid or does not exist; use [`Self::order_exists`]
    /// to tell the two apart.
    ///
    /// # Errors
    ///
    /// Returns `sqlx::Error` if the update fails.
    pub async fn try_mark_paid(
        conn: &mut PgConnection,
        order_id: OrderId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE orders SET paid = TRUE WHERE id = $1 AND paid = FALSE")
            .bind(order_id)
            .execute(conn)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Whether an order row exists.
    ///
    /// # Errors
    ///
    /// Returns `sqlx::Error` if the query fails.
    pub async fn order_exists(
        conn: &mut PgConnection,
        order_id: OrderId,
    ) -> Result<bool, sqlx::Error> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM orders WHERE id = $1)")
                .bind(order_id)
                .fetch_one(conn)
                .await?;

        Ok(exists)
    }

    /// Append a completed payment row for an order.
    ///
    /// Must run in the same transaction as the winning [`Self::try_mark_paid`]
    /// call so the flag and the log commit or roll back together.
    ///
    /// # Errors
    ///
    /// Returns `sqlx::Error` if the insert fails.
    pub async fn insert_completed(
        conn: &mut PgConnection,
        order_id: OrderId,
        amount: Money,
        provider: &str,
    ) -> Result<Payment, sqlx::Error> {
        let row = sqlx::query_as::<_, PaymentRow>(
            r"
            INSERT INTO payments (order_id, amount, provider, status)
            VALUES ($1, $2, $3, 'completed')
            RETURNING id, order_id, amount, provider, status, created_at
            ",
        )
        .bind(order_id)
        .bind(amount)
        .bind(provider)
        .fetch_one(conn)
        .await?;

        // A status we just wrote cannot fail to parse.
        Payment::try_from(row).map_err(|e| sqlx::Error::Decode(e.to_string().into()))
    }
}
