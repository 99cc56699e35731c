//! # Return Reconciliation
//!
//! A return line is only accepted while the cumulative returned quantity
//! stays within what the origin line recorded:
//!
//! ```text
//! origin purchase H, line P qty 10
//!   R1: return 4  → already 0 + 4  ≤ 10  ✓
//!   R2: return 7  → already 4 + 7  > 10  ✗ ReturnExceedsOriginal
//! ```
//!
//! Quantities are compared in the origin line's unit. The bound holds
//! from the other side too: an origin line cannot shrink below what has
//! already been returned against it, nor be deleted while returns exist.

use sqlx::SqliteConnection;
use tracing::debug;

use super::load_header;
use crate::error::{LedgerError, LedgerResult};
use crate::repository::item;
use ledger_core::strategy::check_return_bound;
use ledger_core::{CoreError, Header, LineItem, TransactionKind, ValidationError};

/// The return kind that reverses `origin_kind`.
pub fn return_kind_for(origin_kind: TransactionKind) -> LedgerResult<TransactionKind> {
    match origin_kind {
        TransactionKind::Purchase => Ok(TransactionKind::BuyReturn),
        TransactionKind::Sale => Ok(TransactionKind::SaleReturn),
        other => Err(ValidationError::InvalidFormat {
            field: "origin_id".to_string(),
            reason: format!("{} transactions cannot be returned", other),
        }
        .into()),
    }
}

/// Checks that returning `qty` more of `product_id` against `origin`
/// stays within the origin line.
///
/// ## Arguments
/// * `excluding` - A return line to leave out of the running sum (the line
///   being edited)
///
/// ## Returns
/// The origin line, whose unit and price the return line inherits.
pub async fn check_line(
    conn: &mut SqliteConnection,
    origin: &Header,
    product_id: &str,
    qty: i64,
    excluding: Option<&str>,
) -> LedgerResult<LineItem> {
    let return_kind = return_kind_for(origin.kind)?;

    let origin_line = item::find_for_product(conn, &origin.id, product_id)
        .await?
        .ok_or_else(|| {
            LedgerError::not_found(
                "Origin line",
                format!("{} on {}", product_id, origin.id),
            )
        })?;

    let already = item::returned_qty(conn, &origin.id, product_id, return_kind, excluding).await?;
    check_return_bound(product_id, origin_line.qty, already, qty)?;

    debug!(
        origin_id = %origin.id,
        product_id = %product_id,
        original = origin_line.qty,
        already,
        requested = qty,
        "Return within bound"
    );
    Ok(origin_line)
}

/// Checks that the line for `product_id` on `origin` may change to `qty`,
/// or be removed when `qty` is `None`, given the returns recorded
/// against it. Headers that cannot be returned always pass.
///
/// ## Returns
/// * `Err(ReturnExceedsOriginal)` - `qty` is below the quantity returned
/// * `Err(Conflict)` - removing a line that has returns against it
pub async fn check_origin_revision(
    conn: &mut SqliteConnection,
    origin: &Header,
    product_id: &str,
    qty: Option<i64>,
) -> LedgerResult<()> {
    let return_kind = match origin.kind {
        TransactionKind::Purchase => TransactionKind::BuyReturn,
        TransactionKind::Sale => TransactionKind::SaleReturn,
        _ => return Ok(()),
    };

    let returned = item::returned_qty(conn, &origin.id, product_id, return_kind, None).await?;
    if returned == 0 {
        return Ok(());
    }

    match qty {
        None => Err(CoreError::conflict(format!(
            "{} on {} has {} returned against it",
            product_id, origin.id, returned
        ))
        .into()),
        Some(qty) if qty < returned => Err(CoreError::ReturnExceedsOriginal {
            product_id: product_id.to_string(),
            original: qty,
            already_returned: returned,
            requested: 0,
        }
        .into()),
        Some(_) => Ok(()),
    }
}

/// Read-only check of a prospective return against `origin_id`.
pub async fn validate_return(
    conn: &mut SqliteConnection,
    origin_id: &str,
    product_id: &str,
    qty: i64,
) -> LedgerResult<LineItem> {
    let origin = load_header(conn, origin_id).await?;
    check_line(conn, &origin, product_id, qty, None).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::ledger::fixtures::Fixture;
    use ledger_core::{NewHeader, NewLineItem};

    #[tokio::test]
    async fn test_validate_return_against_purchase() {
        let fx = Fixture::new().await;
        let ledger = fx.ledger();
        let purchase = fx.purchase(&[NewLineItem::new(&fx.product_id, 10)]).await;

        let mut conn = fx.db.pool().acquire().await.unwrap();
        let line = validate_return(&mut conn, &purchase.header.id, &fx.product_id, 10)
            .await
            .unwrap();
        assert_eq!(line.qty, 10);

        let err = validate_return(&mut conn, &purchase.header.id, &fx.product_id, 11)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ReturnExceedsOriginal);

        let err = validate_return(&mut conn, &purchase.header.id, &fx.second_product_id, 1)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        drop(conn);

        // A first-stock entry is not returnable.
        let opening = ledger
            .create_header(&NewHeader::new(TransactionKind::FirstStock, &fx.branch_id, &fx.user_id))
            .await
            .unwrap();
        let mut conn = fx.db.pool().acquire().await.unwrap();
        let err = validate_return(&mut conn, &opening.id, &fx.product_id, 1)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }
}
