//! Session cart persistence.
//!
//! The ledger is a plain JSON object in the session. A value that cannot be
//! read as a ledger is logged and treated as an empty cart. Concurrent
//! requests from the same session each read, modify, and write the whole
//! ledger, so the last write wins.

use sqlx::PgPool;
use tower_sessions::Session;
use tracing::instrument;

use bikeshop_core::cart::{CartLedger, CartSummary};

use crate::db::{CatalogRepository, RepositoryError};
use crate::models::session_keys;

/// Read the ledger from the session.
///
/// # Errors
///
/// Returns an error only if the session store itself fails.
pub async fn load_ledger(session: &Session) -> Result<CartLedger, tower_sessions::session::Error> {
    let Some(raw) = session
        .get::<serde_json::Value>(session_keys::CART)
        .await?
    else {
        return Ok(CartLedger::new());
    };

    Ok(CartLedger::decode(&raw).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "discarding malformed cart");
        CartLedger::new()
    }))
}

/// Replace the ledger in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be written.
pub async fn store_ledger(
    session: &Session,
    ledger: &CartLedger,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CART, ledger).await
}

/// Join the ledger against current catalog prices.
///
/// Entries whose product no longer exists are left out of the summary.
///
/// # Errors
///
/// Returns `RepositoryError` if the catalog query fails.
#[instrument(skip(pool, ledger), fields(lines = ledger.len()))]
pub async fn resolve(pool: &PgPool, ledger: &CartLedger) -> Result<CartSummary, RepositoryError> {
    if ledger.is_empty() {
        return Ok(CartSummary::default());
    }
    let ids: Vec<_> = ledger.product_ids().collect();
    let products = CatalogRepository::new(pool).products_by_ids(&ids).await?;
    Ok(ledger.resolve(&products))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::num::NonZeroU32;
    use std::sync::Arc;

    use bikeshop_core::ProductId;
    use serde_json::json;
    use tower_sessions::MemoryStore;

    use super::*;

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    #[tokio::test]
    async fn test_missing_cart_is_empty() {
        assert!(load_ledger(&session()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_store_then_load() {
        let session = session();
        let ledger = CartLedger::new()
            .add(ProductId::new(3), NonZeroU32::new(2).unwrap())
            .add(ProductId::new(7), NonZeroU32::MIN);
        store_ledger(&session, &ledger).await.unwrap();

        let stored: serde_json::Value = session.get(session_keys::CART).await.unwrap().unwrap();
        assert_eq!(stored, json!({ "3": 2, "7": 1 }));
        assert_eq!(load_ledger(&session).await.unwrap(), ledger);
    }

    #[tokio::test]
    async fn test_malformed_cart_is_empty() {
        let session = session();
        session
            .insert(session_keys::CART, json!(["not", "a", "cart"]))
            .await
            .unwrap();
        assert!(load_ledger(&session).await.unwrap().is_empty());

        session
            .insert(session_keys::CART, json!({ "abc": 2 }))
            .await
            .unwrap();
        assert!(load_ledger(&session).await.unwrap().is_empty());
    }
}
