//! CLI subcommands.

pub mod import;
pub mod migrate;
pub mod sample;
pub mod user;

use secrecy::SecretString;
use sqlx::PgPool;
use thiserror::Error;

/// Failure to reach the storefront database.
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("Missing environment variable: STOREFRONT_DATABASE_URL (or DATABASE_URL)")]
    MissingDatabaseUrl,

    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Connect to the database named by `STOREFRONT_DATABASE_URL`, falling back
/// to `DATABASE_URL`. A `.env` file is honored.
pub async fn connect() -> Result<PgPool, ConnectError> {
    dotenvy::dotenv().ok();

    let url = std::env::var("STOREFRONT_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map_err(|_| ConnectError::MissingDatabaseUrl)?;

    tracing::info!("Connecting to storefront database...");
    Ok(bikeshop_storefront::db::create_pool(&SecretString::from(url)).await?)
}
