//! Database migration command.
//!
//! ```bash
//! bikeshop-cli migrate
//! ```
//!
//! Applies the schema migrations embedded from `crates/storefront/migrations/`
//! and then creates the session store's table.

use thiserror::Error;
use tower_sessions_sqlx_store::PostgresStore;

use super::ConnectError;

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Run all storefront migrations.
pub async fn run() -> Result<(), MigrationError> {
    let pool = super::connect().await?;

    tracing::info!("Running storefront migrations...");
    bikeshop_storefront::db::MIGRATOR.run(&pool).await?;

    tracing::info!("Creating session store table...");
    PostgresStore::new(pool.clone()).migrate().await?;

    tracing::info!("Storefront migrations complete!");
    Ok(())
}
