//! Order route handlers.

use axum::{
    Json, Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
};
use tracing::instrument;

use orchard_core::OrderId;

use crate::db::OrderRepository;
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Build the order router.
pub fn router() -> Router<AppState> {
    Router::new().route("/orders/{order_id}", get(get_order))
}

/// GET /orders/{id} - Return order details including lines and paid status.
#[instrument(skip(state))]
async fn get_order(
    State(state): State<AppState>,
    Path(order_id): Path<OrderId>,
) -> Result<impl IntoResponse> {
    let order = OrderRepository::new(state.pool())
        .get(order_id)
        .await?
        .ok_or_else(|| AppError::NotFound("order".to_owned()))?;

    Ok(Json(order))
}
