//! Order domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use orchard_core::{Money, OrderId, OrderLineId, ProductId, UserId};

/// A frozen purchase record created from a cart at checkout.
///
/// Invariants:
/// - `total_amount` equals the sum of `unit_price * quantity` over the
///   lines as computed at creation time, and never changes afterwards.
/// - `paid` moves `false -> true` exactly once and never reverts.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    /// Unique order ID.
    pub id: OrderId,
    /// Total amount, frozen at creation.
    pub total_amount: Money,
    /// Whether the order has been paid.
    pub paid: bool,
    /// Owning user, if the source cart was not anonymous.
    pub user_id: Option<UserId>,
    /// Snapshot line items.
    pub lines: Vec<OrderLine>,
    /// When the order was created.
    pub created_at: DateTime<Utc>,
}

/// A line item within an order.
///
/// `unit_price` is the product's price as read at checkout time, decoupled
/// from the live catalog price from that point on.
#[derive(Debug, Clone, Serialize)]
pub struct OrderLine {
    /// Unique line ID.
    pub id: OrderLineId,
    /// Order this line belongs to.
    pub order_id: OrderId,
    /// Referenced product.
    pub product_id: ProductId,
    /// Quantity purchased.
    pub quantity: i32,
    /// Price per unit at purchase time.
    pub unit_price: Money,
}
