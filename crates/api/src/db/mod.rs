//! Database operations for the Orchard `PostgreSQL` store.
//!
//! ## Tables
//!
//! - `products` - Catalog (read-only for the order lifecycle)
//! - `users` / `user_passwords` / `password_reset_tokens` - Local auth
//! - `carts` / `cart_lines` - Mutable pre-purchase state
//! - `orders` / `order_lines` - Immutable purchase snapshots
//! - `payments` - Append-only payment log
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p orchard-cli -- migrate
//! ```
//!
//! # Conventions
//!
//! Repositories hold a `&PgPool` and expose pool-backed methods for
//! single-statement operations. Multi-statement flows (checkout, payment
//! settlement) run inside one transaction owned by the service layer; the
//! statements they need are exposed as methods taking `&mut PgConnection`.

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub mod carts;
pub mod orders;
pub mod payments;
pub mod products;
pub mod users;

pub use carts::CartRepository;
pub use orders::OrderRepository;
pub use payments::PaymentRepository;
pub use products::ProductRepository;
pub use users::UserRepository;

/// Errors from repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Whether this error is a transient store failure the caller may retry.
    ///
    /// Pool exhaustion and connection-level I/O failures qualify; anything
    /// else (constraint violations, SQL errors, corruption) is terminal for
    /// the request that hit it.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Database(
                sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_)
            )
        )
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_timeout_is_transient() {
        let err = RepositoryError::Database(sqlx::Error::PoolTimedOut);
        assert!(err.is_transient());
    }

    #[test]
    fn test_not_found_is_terminal() {
        assert!(!RepositoryError::NotFound.is_transient());
        assert!(!RepositoryError::Conflict("email".to_owned()).is_transient());
    }

    #[test]
    fn test_row_not_found_is_terminal() {
        let err = RepositoryError::Database(sqlx::Error::RowNotFound);
        assert!(!err.is_transient());
    }
}
