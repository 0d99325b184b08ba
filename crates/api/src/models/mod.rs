//! Domain types for the API.
//!
//! These types represent validated domain objects separate from database row
//! types; repositories convert rows into them at the boundary.

pub mod cart;
pub mod order;
pub mod payment;
pub mod product;
pub mod user;

pub use cart::{Cart, CartLine};
pub use order::{Order, OrderLine};
pub use payment::Payment;
pub use product::{NewProduct, Product};
pub use user::User;

/// Session key constants.
pub mod session_keys {
    /// Authenticated user id.
    pub const USER_ID: &str = "user_id";
}
