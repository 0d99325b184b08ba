//! CLI subcommands.

pub mod migrate;
pub mod seed;

use secrecy::SecretString;

/// Resolve the database URL from the environment.
///
/// Tries `ORCHARD_DATABASE_URL` first, then the generic `DATABASE_URL`.
pub(crate) fn database_url() -> Result<SecretString, Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    std::env::var("ORCHARD_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| "ORCHARD_DATABASE_URL not set".into())
}
