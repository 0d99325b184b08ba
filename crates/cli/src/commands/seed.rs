//! Seed the catalog with demo products.

use orchard_core::types::Money;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use tracing::info;

/// Demo products inserted by `orchard-cli seed`.
const DEMO_PRODUCTS: &[(&str, u32)] = &[
    // (name, price in minor units)
    ("Espresso Beans 1kg", 1850),
    ("Pour-over Kettle", 4200),
    ("Ceramic Mug", 1200),
    ("Burr Grinder", 8900),
    ("Filter Papers (100)", 550),
];

/// Insert demo products, skipping names that already exist.
///
/// # Errors
///
/// Returns an error if the database URL is missing or an insert fails.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let database_url = super::database_url()?;

    info!("Connecting to database...");
    let pool = PgPool::connect(database_url.expose_secret()).await?;

    let mut inserted = 0_u32;
    for (name, minor_units) in DEMO_PRODUCTS {
        let price = Money::from_minor_units(*minor_units);
        let result = sqlx::query(
            r"
            INSERT INTO products (name, price)
            SELECT $1, $2
            WHERE NOT EXISTS (SELECT 1 FROM products WHERE name = $1)
            ",
        )
        .bind(name)
        .bind(price)
        .execute(&pool)
        .await?;

        inserted += u32::try_from(result.rows_affected()).unwrap_or(0);
    }

    info!(inserted, "Seed complete");
    Ok(())
}
