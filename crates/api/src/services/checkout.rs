//! Checkout: converting a cart into an immutable order.
//!
//! The whole conversion runs in one transaction:
//!
//! 1. lock the cart row (serializes concurrent checkouts of the same cart)
//! 2. read the lines joined with each product's *current* price
//! 3. insert the order, snapshot every line with its price-at-purchase
//! 4. set the accumulated total
//! 5. delete the cart's lines (the cart itself survives, drained)
//!
//! A failure anywhere rolls the transaction back, so no partial order and
//! no partially drained cart can ever be observed. Prices are read at
//! checkout time by policy: whatever drifted since add-to-cart is what the
//! buyer pays.

use sqlx::PgPool;
use thiserror::Error;
use tracing::info;

use orchard_core::{CartId, Money};

use crate::db::carts::{CartRepository, PricedLine};
use crate::db::orders::OrderRepository;
use crate::models::order::Order;

/// Errors from the checkout flow.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The cart does not exist.
    #[error("cart not found")]
    CartNotFound,

    /// The cart has no lines; checkout of an empty cart is rejected rather
    /// than silently producing a zero-total order.
    #[error("cart is empty")]
    EmptyCart,

    /// A stored line quantity violates the schema's `quantity >= 1` check.
    #[error("invalid stored line quantity: {0}")]
    CorruptQuantity(i32),

    /// Database failure; the transaction was rolled back.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Compute the order total for a set of priced cart lines.
///
/// This is the invariant the order freezes: `total == Σ unit_price ×
/// quantity` over the snapshot lines.
///
/// # Errors
///
/// Returns [`CheckoutError::EmptyCart`] for an empty line set, and
/// [`CheckoutError::CorruptQuantity`] if a stored quantity is not positive.
pub fn order_total(lines: &[PricedLine]) -> Result<Money, CheckoutError> {
    if lines.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }

    let mut total = Money::ZERO;
    for line in lines {
        let quantity = u32::try_from(line.quantity)
            .map_err(|_| CheckoutError::CorruptQuantity(line.quantity))?;
        total = total + line.unit_price.times(quantity);
    }

    Ok(total)
}

/// The order engine.
pub struct CheckoutService<'a> {
    pool: &'a PgPool,
}

impl<'a> CheckoutService<'a> {
    /// Create a new checkout service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Convert a cart into an order and drain the cart.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::CartNotFound`] if the cart does not exist,
    /// [`CheckoutError::EmptyCart`] if it has no lines, and
    /// [`CheckoutError::Database`] on store failure (nothing committed).
    pub async fn checkout(&self, cart_id: CartId) -> Result<Order, CheckoutError> {
        let mut tx = self.pool.begin().await?;

        let Some((_, user_id)) = CartRepository::lock(&mut tx, cart_id).await? else {
            return Err(CheckoutError::CartNotFound);
        };

        let priced = CartRepository::priced_lines(&mut tx, cart_id).await?;
        let total = order_total(&priced)?;

        let (order_id, created_at) = OrderRepository::insert(&mut tx, user_id).await?;

        let mut lines = Vec::with_capacity(priced.len());
        for line in &priced {
            let order_line = OrderRepository::insert_line(
                &mut tx,
                order_id,
                line.product_id,
                line.quantity,
                line.unit_price,
            )
            .await?;
            lines.push(order_line);
        }

        OrderRepository::set_total(&mut tx, order_id, total).await?;
        CartRepository::clear_lines(&mut tx, cart_id).await?;

        tx.commit().await?;

        info!(%cart_id, %order_id, %total, "checkout completed");

        Ok(Order {
            id: order_id,
            total_amount: total,
            paid: false,
            user_id,
            lines,
            created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orchard_core::ProductId;

    fn line(product_id: i32, quantity: i32, unit_price_units: u32) -> PricedLine {
        PricedLine {
            product_id: ProductId::new(product_id),
            quantity,
            unit_price: Money::from_units(unit_price_units),
        }
    }

    #[test]
    fn test_order_total_sums_lines() {
        // Cart with (A, price=10, qty=2) and (B, price=5, qty=1) totals 25.
        let lines = [line(1, 2, 10), line(2, 1, 5)];
        let total = order_total(&lines).expect("non-empty cart");
        assert_eq!(total, Money::from_units(25));
    }

    #[test]
    fn test_order_total_single_line() {
        let lines = [line(7, 3, 4)];
        assert_eq!(order_total(&lines).expect("total"), Money::from_units(12));
    }

    #[test]
    fn test_order_total_fractional_prices() {
        let lines = [PricedLine {
            product_id: ProductId::new(1),
            quantity: 3,
            unit_price: Money::from_minor_units(1050), // 10.50
        }];
        assert_eq!(
            order_total(&lines).expect("total"),
            Money::from_minor_units(3150)
        );
    }

    #[test]
    fn test_empty_cart_rejected() {
        let result = order_total(&[]);
        assert!(matches!(result, Err(CheckoutError::EmptyCart)));
    }

    #[test]
    fn test_nonpositive_quantity_is_an_error() {
        let lines = [line(1, 2, 10), line(2, -1, 5)];
        assert!(matches!(
            order_total(&lines),
            Err(CheckoutError::CorruptQuantity(-1))
        ));
    }
}
