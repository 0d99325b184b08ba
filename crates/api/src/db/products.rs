//! Product repository: catalog lookups.
//!
//! The order lifecycle only reads from here. Creation exists for the admin
//! surface and the seed command; there is no update or delete, which keeps
//! `order_lines.product_id` references valid forever.

use sqlx::PgPool;

use orchard_core::{Money, ProductId};

use super::RepositoryError;
use crate::models::product::{NewProduct, Product};

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: ProductId,
    name: String,
    price: Money,
    image_url: Option<String>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            price: row.price,
            image_url: row.image_url,
        }
    }
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a product by its ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            "SELECT id, name, price, image_url FROM products WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Product::from))
    }

    /// List products with offset pagination, returning the page and the
    /// total count.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Product>, i64), RepositoryError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(self.pool)
            .await?;

        let rows = sqlx::query_as::<_, ProductRow>(
            "SELECT id, name, price, image_url FROM products ORDER BY id LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool)
        .await?;

        Ok((rows.into_iter().map(Product::from).collect(), total))
    }

    /// Create a new product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, input: &NewProduct) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            INSERT INTO products (name, price, image_url)
            VALUES ($1, $2, $3)
            RETURNING id, name, price, image_url
            ",
        )
        .bind(&input.name)
        .bind(input.price)
        .bind(&input.image_url)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }
}
