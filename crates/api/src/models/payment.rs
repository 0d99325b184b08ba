//! Payment domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use orchard_core::{Money, OrderId, PaymentId, PaymentStatus};

/// A recorded payment against an order.
///
/// Payments are an append-only log: multiple rows may reference one order
/// (retried attempts), but only the row that wins the `paid` compare-and-set
/// is written with a completed status in the same transaction that flips the
/// order. The ledger never updates or deletes payment rows.
#[derive(Debug, Clone, Serialize)]
pub struct Payment {
    /// Unique payment ID.
    pub id: PaymentId,
    /// Order this payment settles.
    pub order_id: OrderId,
    /// Amount paid.
    pub amount: Money,
    /// Provider identifier (e.g., "local", "stripe").
    pub provider: String,
    /// Payment status.
    pub status: PaymentStatus,
    /// When the payment was recorded.
    pub created_at: DateTime<Utc>,
}
