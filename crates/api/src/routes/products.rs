//! Product route handlers (catalog).

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use orchard_core::{Money, ProductId};

use crate::db::ProductRepository;
use crate::error::{AppError, Result};
use crate::models::product::{NewProduct, Product};
use crate::state::AppState;

/// Build the product router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/products", post(create_product).get(list_products))
        .route("/products/{product_id}", get(get_product))
}

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    pub price: Money,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

const fn default_limit() -> i64 {
    100
}

#[derive(Debug, Serialize)]
struct ProductPage {
    items: Vec<Product>,
    total: i64,
}

/// POST /products - Create a product.
#[instrument(skip(state))]
async fn create_product(
    State(state): State<AppState>,
    Json(req): Json<CreateProductRequest>,
) -> Result<impl IntoResponse> {
    if req.name.trim().is_empty() {
        return Err(AppError::InvalidInput("product name cannot be empty".to_owned()));
    }

    let product = ProductRepository::new(state.pool())
        .create(&NewProduct {
            name: req.name,
            price: req.price,
            image_url: req.image_url,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(product)))
}

/// GET /products - List products with pagination metadata.
#[instrument(skip(state))]
async fn list_products(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse> {
    let limit = params.limit.clamp(1, 100);
    let skip = params.skip.max(0);

    let (items, total) = ProductRepository::new(state.pool()).list(limit, skip).await?;

    Ok(Json(ProductPage { items, total }))
}

/// GET /products/{id} - Get a single product.
#[instrument(skip(state))]
async fn get_product(
    State(state): State<AppState>,
    Path(product_id): Path<ProductId>,
) -> Result<impl IntoResponse> {
    let product = ProductRepository::new(state.pool())
        .get(product_id)
        .await?
        .ok_or_else(|| AppError::NotFound("product".to_owned()))?;

    Ok(Json(product))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_params_defaults() {
        let params: ListParams = serde_json::from_str("{}").expect("defaults apply");
        assert_eq!(params.skip, 0);
        assert_eq!(params.limit, 100);
    }

    #[test]
    fn test_create_request_price_parses_as_string() {
        let req: CreateProductRequest =
            serde_json::from_str(r#"{"name":"Widget","price":"19.99"}"#).expect("valid request");
        assert_eq!(req.price, Money::from_minor_units(1999));
        assert!(req.image_url.is_none());
    }

    #[test]
    fn test_create_request_negative_price_rejected_at_parse() {
        let result =
            serde_json::from_str::<CreateProductRequest>(r#"{"name":"Widget","price":"-1.00"}"#);
        assert!(result.is_err());
    }
}
