//! Cart route handlers: cart CRUD and checkout.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
};
use serde::Deserialize;
use tracing::instrument;

use orchard_core::{CartId, CartLineId, ProductId};

use crate::db::{CartRepository, ProductRepository};
use crate::error::{AppError, Result};
use crate::middleware::OptionalUser;
use crate::services::checkout::CheckoutService;
use crate::state::AppState;

/// Build the cart router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/carts", post(create_cart))
        .route("/carts/{cart_id}", get(get_cart))
        .route("/carts/{cart_id}/items", post(add_item))
        .route("/carts/{cart_id}/items/{line_id}", delete(remove_item))
        .route("/carts/{cart_id}/checkout", post(checkout))
}

#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub product_id: ProductId,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
}

const fn default_quantity() -> i32 {
    1
}

impl AddItemRequest {
    /// Quantity must be a positive integer; the store never clamps.
    fn validate(&self) -> Result<()> {
        if self.quantity < 1 {
            return Err(AppError::InvalidInput(
                "quantity must be a positive integer".to_owned(),
            ));
        }
        Ok(())
    }
}

/// POST /carts - Create a new empty cart.
///
/// Anonymous visitors get an unowned cart; logged-in users get one tied to
/// their account.
#[instrument(skip(state, user))]
async fn create_cart(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
) -> Result<impl IntoResponse> {
    let cart = CartRepository::new(state.pool())
        .create(user.map(|u| u.id))
        .await?;

    Ok((StatusCode::CREATED, Json(cart)))
}

/// GET /carts/{id} - Retrieve a cart and its lines.
#[instrument(skip(state))]
async fn get_cart(
    State(state): State<AppState>,
    Path(cart_id): Path<CartId>,
) -> Result<impl IntoResponse> {
    let cart = CartRepository::new(state.pool())
        .get(cart_id)
        .await?
        .ok_or_else(|| AppError::NotFound("cart".to_owned()))?;

    Ok(Json(cart))
}

/// POST /carts/{id}/items - Add a product to the cart.
///
/// Adding a product already in the cart increments its line's quantity.
#[instrument(skip(state))]
async fn add_item(
    State(state): State<AppState>,
    Path(cart_id): Path<CartId>,
    Json(req): Json<AddItemRequest>,
) -> Result<impl IntoResponse> {
    req.validate()?;

    let carts = CartRepository::new(state.pool());

    carts
        .get(cart_id)
        .await?
        .ok_or_else(|| AppError::NotFound("cart".to_owned()))?;

    ProductRepository::new(state.pool())
        .get(req.product_id)
        .await?
        .ok_or_else(|| AppError::NotFound("product".to_owned()))?;

    let line = carts.add_line(cart_id, req.product_id, req.quantity).await?;

    Ok((StatusCode::CREATED, Json(line)))
}

/// DELETE /carts/{id}/items/{line_id} - Remove a line from the cart.
///
/// The repository treats removal as idempotent; the HTTP surface still
/// reports 404 for an absent line so clients can notice stale state.
#[instrument(skip(state))]
async fn remove_item(
    State(state): State<AppState>,
    Path((cart_id, line_id)): Path<(CartId, CartLineId)>,
) -> Result<impl IntoResponse> {
    let carts = CartRepository::new(state.pool());

    carts
        .get(cart_id)
        .await?
        .ok_or_else(|| AppError::NotFound("cart".to_owned()))?;

    let line = carts
        .remove_line(cart_id, line_id)
        .await?
        .ok_or_else(|| AppError::NotFound("cart line".to_owned()))?;

    Ok(Json(line))
}

/// POST /carts/{id}/checkout - Convert the cart into an order.
#[instrument(skip(state))]
async fn checkout(
    State(state): State<AppState>,
    Path(cart_id): Path<CartId>,
) -> Result<impl IntoResponse> {
    let order = CheckoutService::new(state.pool()).checkout(cart_id).await?;

    Ok((StatusCode::CREATED, Json(order)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantity_defaults_to_one() {
        let req: AddItemRequest = serde_json::from_str(r#"{"product_id":1}"#).expect("valid");
        assert_eq!(req.quantity, 1);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_zero_quantity_rejected() {
        let req: AddItemRequest =
            serde_json::from_str(r#"{"product_id":1,"quantity":0}"#).expect("parses");
        assert!(matches!(req.validate(), Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn test_negative_quantity_rejected() {
        let req: AddItemRequest =
            serde_json::from_str(r#"{"product_id":1,"quantity":-3}"#).expect("parses");
        assert!(matches!(req.validate(), Err(AppError::InvalidInput(_))));
    }
}
