//! Route handlers.
//!
//! Handlers stay thin: parse and validate the request, call a repository or
//! service, map the result into JSON. All domain decisions live below.

use axum::Router;

use crate::state::AppState;

pub mod auth;
pub mod carts;
pub mod orders;
pub mod payments;
pub mod products;

/// Build the application router (without global layers).
#[must_use]
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(products::router())
        .merge(carts::router())
        .merge(orders::router())
        .merge(payments::router())
        .merge(auth::router())
}
