//! # Stock Mutator
//!
//! The only code that writes `products.stock`. Each primitive loads the
//! product, applies one mutation and persists it on the caller's
//! connection. Nothing here deduplicates: call once per logical mutation.
//!
//! ```text
//! increase(P, n)          stock += n
//! decrease(P, n)          stock -= n, or InsufficientStock if stock < n
//! set(P, n)               stock := n   (stock-take)
//! reverse_decrease(P, n)  ≡ increase   (undo of a sale line)
//! ```

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use tracing::debug;

use super::load_product;
use crate::error::LedgerResult;
use crate::repository::product;
use ledger_core::strategy::checked_decrease;
use ledger_core::{Product, StockEffect, ValidationError};

/// Adds `qty` base units.
pub async fn increase(
    conn: &mut SqliteConnection,
    product_id: &str,
    qty: i64,
    now: DateTime<Utc>,
) -> LedgerResult<Product> {
    let mut product = load_product(conn, product_id).await?;
    let before = product.stock;
    product.stock += qty;
    persist(conn, &mut product, now).await?;

    debug!(product_id = %product_id, before, after = product.stock, "Stock increased");
    Ok(product)
}

/// Removes `qty` base units.
///
/// ## Returns
/// * `Err(InsufficientStock)` - stock is below `qty`; nothing is written
pub async fn decrease(
    conn: &mut SqliteConnection,
    product_id: &str,
    qty: i64,
    now: DateTime<Utc>,
) -> LedgerResult<Product> {
    let mut product = load_product(conn, product_id).await?;
    let before = product.stock;
    product.stock = checked_decrease(product_id, before, qty)?;
    persist(conn, &mut product, now).await?;

    debug!(product_id = %product_id, before, after = product.stock, "Stock decreased");
    Ok(product)
}

/// Overwrites stock with a counted quantity.
pub async fn set(
    conn: &mut SqliteConnection,
    product_id: &str,
    qty: i64,
    now: DateTime<Utc>,
) -> LedgerResult<Product> {
    if qty < 0 {
        return Err(ValidationError::OutOfRange {
            field: "qty".to_string(),
            min: 0,
            max: i64::MAX,
        }
        .into());
    }

    let mut product = load_product(conn, product_id).await?;
    let before = product.stock;
    product.stock = qty;
    persist(conn, &mut product, now).await?;

    debug!(product_id = %product_id, before, after = qty, "Stock set");
    Ok(product)
}

/// Undoes an earlier [`decrease`].
pub async fn reverse_decrease(
    conn: &mut SqliteConnection,
    product_id: &str,
    qty: i64,
    now: DateTime<Utc>,
) -> LedgerResult<Product> {
    increase(conn, product_id, qty, now).await
}

/// Dispatches on a line strategy's effect.
pub async fn apply(
    conn: &mut SqliteConnection,
    effect: StockEffect,
    product_id: &str,
    qty: i64,
    now: DateTime<Utc>,
) -> LedgerResult<Product> {
    match effect {
        StockEffect::Increase => increase(conn, product_id, qty, now).await,
        StockEffect::Decrease => decrease(conn, product_id, qty, now).await,
        StockEffect::Set => set(conn, product_id, qty, now).await,
    }
}

async fn persist(
    conn: &mut SqliteConnection,
    product: &mut Product,
    now: DateTime<Utc>,
) -> LedgerResult<()> {
    product::write_stock(conn, &product.id, product.stock, now).await?;
    product.updated_at = now;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::ledger::fixtures::Fixture;

    #[tokio::test]
    async fn test_increase_then_decrease() {
        let fx = Fixture::new().await;
        let mut conn = fx.db.pool().acquire().await.unwrap();

        let p = increase(&mut conn, &fx.product_id, 10, fx.now()).await.unwrap();
        assert_eq!(p.stock, 10);

        let p = decrease(&mut conn, &fx.product_id, 4, fx.now()).await.unwrap();
        assert_eq!(p.stock, 6);

        let p = reverse_decrease(&mut conn, &fx.product_id, 4, fx.now()).await.unwrap();
        assert_eq!(p.stock, 10);
    }

    #[tokio::test]
    async fn test_decrease_never_goes_negative() {
        let fx = Fixture::new().await;
        let mut conn = fx.db.pool().acquire().await.unwrap();
        increase(&mut conn, &fx.product_id, 3, fx.now()).await.unwrap();

        let err = decrease(&mut conn, &fx.product_id, 4, fx.now()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientStock);

        let product = load_product(&mut conn, &fx.product_id).await.unwrap();
        assert_eq!(product.stock, 3);
    }

    #[tokio::test]
    async fn test_set_overwrites_and_rejects_negative() {
        let fx = Fixture::new().await;
        let mut conn = fx.db.pool().acquire().await.unwrap();
        increase(&mut conn, &fx.product_id, 8, fx.now()).await.unwrap();

        let p = set(&mut conn, &fx.product_id, 2, fx.now()).await.unwrap();
        assert_eq!(p.stock, 2);

        let err = set(&mut conn, &fx.product_id, -1, fx.now()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn test_unknown_product_is_not_found() {
        let fx = Fixture::new().await;
        let mut conn = fx.db.pool().acquire().await.unwrap();
        let err = increase(&mut conn, "PRD-missing", 1, fx.now()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
