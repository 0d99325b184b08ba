//! Cart domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use orchard_core::{CartId, CartLineId, ProductId, UserId};

/// A shopping cart.
///
/// Carts are mutable pre-purchase state: lines are added, updated and
/// removed freely until checkout drains them into an immutable order. A
/// drained cart is not deleted and can be filled again.
#[derive(Debug, Clone, Serialize)]
pub struct Cart {
    /// Unique cart ID.
    pub id: CartId,
    /// Owning user, if the cart is not anonymous.
    pub user_id: Option<UserId>,
    /// Current line items.
    pub lines: Vec<CartLine>,
    /// When the cart was created.
    pub created_at: DateTime<Utc>,
}

/// A line item in a cart: one product with a quantity.
///
/// The (cart, product) pair is unique per cart; adding a product that is
/// already present increments the existing line's quantity instead of
/// creating a duplicate.
#[derive(Debug, Clone, Serialize)]
pub struct CartLine {
    /// Unique line ID.
    pub id: CartLineId,
    /// Cart this line belongs to.
    pub cart_id: CartId,
    /// Referenced product.
    pub product_id: ProductId,
    /// Quantity, always >= 1.
    pub quantity: i32,
}
