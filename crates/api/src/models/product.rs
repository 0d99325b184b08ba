//! Product domain types.

use serde::Serialize;

use orchard_core::{Money, ProductId};

/// A catalog product.
///
/// The order lifecycle treats products as read-only: prices may drift while
/// a product sits in a cart, and checkout reads the current price. Once an
/// order is created its lines carry their own frozen `unit_price`, so later
/// product edits never touch past orders.
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    /// Unique product ID.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Current unit price.
    pub price: Money,
    /// Optional product image URL.
    pub image_url: Option<String>,
}

/// Input for creating a product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub price: Money,
    pub image_url: Option<String>,
}
