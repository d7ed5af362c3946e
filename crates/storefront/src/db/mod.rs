//! Database operations for the storefront `PostgreSQL` database.
//!
//! ## Tables
//!
//! - `brand` - Product brands, unique by name
//! - `product` - Catalog entries; `brand_id` is nulled when a brand is deleted
//! - `users` - Site accounts with argon2 password hashes and a staff flag
//! - `tower_sessions.session` - Session storage, created by the session store's own migration
//!
//! # Migrations
//!
//! Migrations live in `crates/storefront/migrations/` and are embedded in
//! [`MIGRATOR`]. Run them with:
//! ```bash
//! cargo run -p bikeshop-cli -- migrate
//! ```

pub mod catalog;
pub mod users;

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use catalog::CatalogRepository;
pub use users::UserRepository;

/// Embedded schema migrations.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored row violates a domain rule (e.g. a negative price).
    #[error("data corruption: {0}")]
    DataCorruption(String),

    #[error("conflict: {0}")]
    Conflict(String),
}

/// Create a `PostgreSQL` connection pool.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Map a unique-constraint violation to `Conflict`, anything else to `Database`.
pub(crate) fn conflict_or(e: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(format!("{what} already exists"));
    }
    RepositoryError::Database(e)
}
