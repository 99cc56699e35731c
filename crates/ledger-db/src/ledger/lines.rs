//! # Line-Item Engine
//!
//! One engine for all six kinds; [`LineStrategy`] supplies what differs.
//!
//! ## Create
//! ```text
//! validate (product, qty ≥ 1, expiry date)
//!      │
//!      ▼
//! line for (header, product) exists? ──yes──► revise: accumulate qty at the
//!      │ no                                   recorded price (opname: replace)
//!      ▼
//! returns: bound check against origin line
//!      │
//!      ▼
//! unit → multiplier → base qty
//!      │
//!      ▼
//! price from strategy source ──► stock effect ──► ratchet price / expiry
//!      │
//!      ▼
//! insert line ──► recalculate header ──► sync reports
//! ```
//!
//! Edit and delete undo the recorded stock effect first, then (for edit)
//! apply the new one. Any error leaves the enclosing transaction to roll
//! back everything.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::SqliteConnection;
use tracing::debug;

use super::{conversion, load_header, load_product, recalc, returns, stock, LedgerContext};
use crate::error::{LedgerError, LedgerResult};
use crate::repository::{item, product};
use ledger_core::strategy::{earliest_expiry, ratchet_price};
use ledger_core::validation::{
    line_amount, parse_optional_date, validate_amount, validate_quantity, validate_required,
};
use ledger_core::{
    Header, LineItem, LineItemUpdate, LineStrategy, MergePolicy, Money, Multiplier,
    NewLineItem, PriceSource, Product, StockEffect, TransactionKind, ValidationError,
    MAX_LINE_QUANTITY,
};

// =============================================================================
// Create
// =============================================================================

/// Adds a line to `header_id`, or merges into the existing line for the
/// same product.
pub async fn create_item(
    conn: &mut SqliteConnection,
    ctx: &LedgerContext<'_>,
    header_id: &str,
    request: &NewLineItem,
) -> LedgerResult<LineItem> {
    validate_required("product_id", &request.product_id)?;
    validate_quantity(request.qty)?;
    let expiry = parse_optional_date("expired_date", request.expired_date.as_deref())?;
    if let Some(price) = request.price {
        validate_amount("price", price)?;
    }

    let header = load_header(conn, header_id).await?;
    let strategy = LineStrategy::for_kind(header.kind);
    let product = load_product(conn, &request.product_id).await?;
    ensure_same_branch(&header, &product)?;

    let line = match item::find_for_product(conn, header_id, &product.id).await? {
        Some(existing) => {
            if let Some(unit_id) = requested_unit(request.unit_id.as_deref()) {
                if unit_id != existing.unit_id {
                    return Err(unit_mismatch(header.kind, &existing.unit_id));
                }
            }

            let qty = match strategy.merge {
                MergePolicy::Accumulate => existing.qty + request.qty,
                MergePolicy::Replace => request.qty,
            };
            validate_quantity(qty)?;

            debug!(
                item_id = %existing.id,
                product_id = %product.id,
                from = existing.qty,
                to = qty,
                "Merging into existing line"
            );

            let revision = Revision {
                qty,
                base_price: None,
                expiry,
            };
            revise(conn, ctx, &header, strategy, existing, revision).await?
        }
        None => insert_line(conn, ctx, &header, strategy, product, request, expiry).await?,
    };

    recalc::recalculate(conn, ctx, header_id).await?;
    Ok(line)
}

async fn insert_line(
    conn: &mut SqliteConnection,
    ctx: &LedgerContext<'_>,
    header: &Header,
    strategy: LineStrategy,
    product: Product,
    request: &NewLineItem,
    expiry: Option<NaiveDate>,
) -> LedgerResult<LineItem> {
    let now = ctx.now();

    let origin_line = match return_origin(header) {
        Some(origin_id) => {
            let origin = load_header(conn, origin_id).await?;
            Some(returns::check_line(conn, &origin, &product.id, request.qty, None).await?)
        }
        None => None,
    };

    let unit_id = line_unit(
        header.kind,
        strategy,
        &product,
        origin_line.as_ref(),
        request.unit_id.as_deref(),
    )?;

    // Returns move stock through the origin line's recorded ratio.
    let multiplier = match &origin_line {
        Some(origin) => recorded_multiplier(origin),
        None if strategy.applies_conversion => conversion::resolve(conn, &product, &unit_id).await?,
        None => Multiplier::IDENTITY,
    };
    let base_qty = base_quantity(multiplier, request.qty)?;

    let (price, cost_price, incoming_price) = match (strategy.price_source, &origin_line) {
        (PriceSource::SuppliedOrCost, _) => {
            let base = request.price.unwrap_or(product.purchase_price);
            (line_amount("price", base, multiplier.value())?, base, Some(base))
        }
        (PriceSource::SalesPrice, _) => (product.sales_price, product.purchase_price, None),
        (PriceSource::PurchasePrice, _) => (product.purchase_price, product.purchase_price, None),
        (PriceSource::OriginLine, Some(origin)) => (origin.price, origin.cost_price, None),
        (PriceSource::OriginLine, None) => {
            return Err(ValidationError::Required {
                field: "origin_id".to_string(),
            }
            .into())
        }
    };

    let sub_total = line_amounts(price, cost_price, request.qty)?;
    let (qty_exist, sub_total_exist) = match strategy.effect {
        StockEffect::Set => (
            product.stock,
            line_amount("sub_total_exist", price, product.stock)?,
        ),
        _ => (0, Money::zero()),
    };

    let stock_before = product.stock;
    let updated = stock::apply(conn, strategy.effect, &product.id, base_qty, now).await?;
    apply_receiving_rules(conn, strategy, &updated, stock_before, incoming_price, expiry, now)
        .await?;

    let line = LineItem {
        id: ctx.next_id(header.kind.item_prefix()),
        header_id: header.id.clone(),
        product_id: product.id.clone(),
        unit_id,
        qty: request.qty,
        base_qty,
        price,
        cost_price,
        sub_total,
        qty_exist,
        sub_total_exist,
        expired_date: expiry,
        created_at: now,
        updated_at: now,
    };
    item::insert_item(conn, &line).await?;

    debug!(
        item_id = %line.id,
        header_id = %header.id,
        product_id = %line.product_id,
        qty = line.qty,
        base_qty,
        price = %line.price,
        "Line item created"
    );
    Ok(line)
}

// =============================================================================
// Update
// =============================================================================

/// Changes a line's quantity (and, for receiving kinds, its price or
/// expiry), moving stock by the difference.
pub async fn update_item(
    conn: &mut SqliteConnection,
    ctx: &LedgerContext<'_>,
    item_id: &str,
    update: &LineItemUpdate,
) -> LedgerResult<LineItem> {
    validate_quantity(update.qty)?;
    let expiry = parse_optional_date("expired_date", update.expired_date.as_deref())?;
    if let Some(price) = update.price {
        validate_amount("price", price)?;
    }

    let existing = load_item(conn, item_id).await?;
    let header = load_header(conn, &existing.header_id).await?;
    let strategy = LineStrategy::for_kind(header.kind);

    let revision = Revision {
        qty: update.qty,
        base_price: update.price,
        expiry,
    };
    let line = revise(conn, ctx, &header, strategy, existing, revision).await?;

    recalc::recalculate(conn, ctx, &header.id).await?;
    Ok(line)
}

/// New values for an existing line.
struct Revision {
    qty: i64,
    /// Replacement base-unit price; honoured for receiving kinds only.
    base_price: Option<Money>,
    expiry: Option<NaiveDate>,
}

async fn revise(
    conn: &mut SqliteConnection,
    ctx: &LedgerContext<'_>,
    header: &Header,
    strategy: LineStrategy,
    old: LineItem,
    revision: Revision,
) -> LedgerResult<LineItem> {
    let now = ctx.now();

    returns::check_origin_revision(conn, header, &old.product_id, Some(revision.qty)).await?;
    let restored = undo_effect(conn, strategy, &old, now).await?;

    if let Some(origin_id) = return_origin(header) {
        let origin = load_header(conn, origin_id).await?;
        returns::check_line(conn, &origin, &old.product_id, revision.qty, Some(old.id.as_str())).await?;
    }

    let multiplier = recorded_multiplier(&old);
    let base_qty = base_quantity(multiplier, revision.qty)?;

    let incoming_price = revision
        .base_price
        .filter(|_| strategy.price_source == PriceSource::SuppliedOrCost);
    let (price, cost_price) = match incoming_price {
        Some(base) => (line_amount("price", base, multiplier.value())?, base),
        None => (old.price, old.cost_price),
    };
    let sub_total = line_amounts(price, cost_price, revision.qty)?;

    let stock_before = restored.stock;
    let updated = stock::apply(conn, strategy.effect, &old.product_id, base_qty, now).await?;
    apply_receiving_rules(conn, strategy, &updated, stock_before, incoming_price, revision.expiry, now)
        .await?;

    let line = LineItem {
        qty: revision.qty,
        base_qty,
        price,
        cost_price,
        sub_total,
        expired_date: revision.expiry.or(old.expired_date),
        updated_at: now,
        ..old
    };
    item::write_item(conn, &line).await?;

    debug!(item_id = %line.id, qty = line.qty, base_qty, "Line item revised");
    Ok(line)
}

// =============================================================================
// Delete
// =============================================================================

/// Removes a line, undoing its stock effect, and returns the recalculated
/// header.
pub async fn delete_item(
    conn: &mut SqliteConnection,
    ctx: &LedgerContext<'_>,
    item_id: &str,
) -> LedgerResult<Header> {
    let line = load_item(conn, item_id).await?;
    let header = load_header(conn, &line.header_id).await?;
    let strategy = LineStrategy::for_kind(header.kind);

    remove_line(conn, &header, strategy, &line, ctx.now()).await?;
    debug!(item_id = %item_id, header_id = %header.id, "Line item deleted");

    recalc::recalculate(conn, ctx, &header.id).await
}

/// Undoes `line`'s stock effect and deletes the row. No recalculation.
///
/// ## Returns
/// * `Err(Conflict)` - returns are recorded against the line
pub(crate) async fn remove_line(
    conn: &mut SqliteConnection,
    header: &Header,
    strategy: LineStrategy,
    line: &LineItem,
    now: DateTime<Utc>,
) -> LedgerResult<()> {
    returns::check_origin_revision(conn, header, &line.product_id, None).await?;
    undo_effect(conn, strategy, line, now).await?;
    item::delete_item(conn, &line.id).await?;
    Ok(())
}

// =============================================================================
// Helpers
// =============================================================================

/// Reverses what `line` did to stock. A stock-take is undone by restoring
/// the quantity recorded before the count.
async fn undo_effect(
    conn: &mut SqliteConnection,
    strategy: LineStrategy,
    line: &LineItem,
    now: DateTime<Utc>,
) -> LedgerResult<Product> {
    match strategy.reverse_effect() {
        StockEffect::Decrease => stock::decrease(conn, &line.product_id, line.base_qty, now).await,
        StockEffect::Increase => {
            stock::reverse_decrease(conn, &line.product_id, line.base_qty, now).await
        }
        StockEffect::Set => stock::set(conn, &line.product_id, line.qty_exist, now).await,
    }
}

/// Purchase price ratchet and earliest-expiry rule, for the kinds that
/// carry them.
async fn apply_receiving_rules(
    conn: &mut SqliteConnection,
    strategy: LineStrategy,
    product: &Product,
    stock_before: i64,
    incoming_price: Option<Money>,
    incoming_expiry: Option<NaiveDate>,
    now: DateTime<Utc>,
) -> LedgerResult<()> {
    let price = match incoming_price {
        Some(incoming) if strategy.ratchets_price => ratchet_price(product.purchase_price, incoming),
        _ => product.purchase_price,
    };

    let expiry = if strategy.tracks_expiry {
        earliest_expiry(stock_before, product.expired_date, incoming_expiry)
    } else {
        product.expired_date
    };

    if price != product.purchase_price || expiry != product.expired_date {
        product::write_cost_and_expiry(conn, &product.id, price, expiry, now).await?;
        debug!(
            product_id = %product.id,
            purchase_price = %price,
            expired_date = ?expiry,
            "Product cost and expiry updated"
        );
    }

    Ok(())
}

async fn load_item(conn: &mut SqliteConnection, id: &str) -> LedgerResult<LineItem> {
    item::fetch_item(conn, id)
        .await?
        .ok_or_else(|| LedgerError::not_found("LineItem", id))
}

fn ensure_same_branch(header: &Header, product: &Product) -> LedgerResult<()> {
    if header.branch_id != product.branch_id {
        return Err(LedgerError::not_found(
            "Product",
            format!("{} in branch {}", product.id, header.branch_id),
        ));
    }
    Ok(())
}

fn return_origin(header: &Header) -> Option<&str> {
    if header.kind.is_return() {
        header.origin_id.as_deref()
    } else {
        None
    }
}

fn recorded_multiplier(line: &LineItem) -> Multiplier {
    Multiplier::new(line.base_qty / line.qty.max(1))
}

fn base_quantity(multiplier: Multiplier, qty: i64) -> LedgerResult<i64> {
    multiplier.checked_base_qty(qty).ok_or_else(|| {
        ValidationError::OutOfRange {
            field: "qty".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        }
        .into()
    })
}

/// Line subtotal, after checking that both the priced and the costed
/// amount stay in range (profit is derived from the pair).
fn line_amounts(price: Money, cost_price: Money, qty: i64) -> LedgerResult<Money> {
    line_amount("cost_price", cost_price, qty)?;
    Ok(line_amount("sub_total", price, qty)?)
}

fn requested_unit(unit_id: Option<&str>) -> Option<&str> {
    unit_id.map(str::trim).filter(|u| !u.is_empty())
}

/// Unit a new line is recorded in.
///
/// Returns follow the origin line; kinds without conversion stay in the
/// base unit; receiving kinds take the requested unit.
fn line_unit(
    kind: TransactionKind,
    strategy: LineStrategy,
    product: &Product,
    origin_line: Option<&LineItem>,
    requested: Option<&str>,
) -> LedgerResult<String> {
    let fixed = match origin_line {
        Some(origin) => Some(origin.unit_id.as_str()),
        None if !strategy.applies_conversion => Some(product.unit_id.as_str()),
        None => None,
    };

    match (fixed, requested_unit(requested)) {
        (Some(fixed), Some(unit_id)) if unit_id != fixed => Err(unit_mismatch(kind, fixed)),
        (Some(fixed), _) => Ok(fixed.to_string()),
        (None, Some(unit_id)) => Ok(unit_id.to_string()),
        (None, None) => Ok(product.unit_id.clone()),
    }
}

fn unit_mismatch(kind: TransactionKind, expected: &str) -> LedgerError {
    ValidationError::InvalidFormat {
        field: "unit_id".to_string(),
        reason: format!("{} line must use unit {}", kind, expected),
    }
    .into()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::ledger::fixtures::{Fixture, BOX_UNIT};
    use ledger_core::{NewHeader, NewTransaction};

    async fn return_against(fx: &Fixture, kind: TransactionKind, origin_id: &str, qty: i64) {
        fx.ledger()
            .create_transaction(&NewTransaction {
                header: NewHeader::new(kind, &fx.branch_id, &fx.user_id).with_origin(origin_id),
                items: vec![NewLineItem::new(&fx.product_id, qty)],
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_merge_accumulates_at_recorded_price() {
        let fx = Fixture::new().await;
        let ledger = fx.ledger();
        let purchase = fx
            .purchase(&[NewLineItem::new(&fx.product_id, 2).at_price(Money::from_minor(1000))])
            .await;

        // Second entry for the same product at a different price.
        let merged = ledger
            .create_item(
                &purchase.header.id,
                &NewLineItem::new(&fx.product_id, 3).at_price(Money::from_minor(1400)),
            )
            .await
            .unwrap();

        assert_eq!(merged.id, purchase.items[0].id);
        assert_eq!(merged.qty, 5);
        assert_eq!(merged.price.minor(), 1000);
        assert_eq!(merged.sub_total.minor(), 5000);
        assert_eq!(fx.stock(&fx.product_id).await, 5);

        let header = fx.header(&purchase.header.id).await;
        assert_eq!(header.total.minor(), 5000);
    }

    #[tokio::test]
    async fn test_purchase_ratchets_price_and_tracks_expiry() {
        let fx = Fixture::new().await;
        fx.purchase(&[NewLineItem::new(&fx.product_id, 5)
            .at_price(Money::from_minor(1200))
            .expiring("2026-09-01")])
            .await;

        let product = fx.product(&fx.product_id).await;
        assert_eq!(product.purchase_price.minor(), 1200);
        assert_eq!(product.expired_date, NaiveDate::from_ymd_opt(2026, 9, 1));

        // Cheaper batch with a later expiry: neither moves.
        fx.purchase(&[NewLineItem::new(&fx.product_id, 5)
            .at_price(Money::from_minor(900))
            .expiring("2026-12-01")])
            .await;
        let product = fx.product(&fx.product_id).await;
        assert_eq!(product.purchase_price.minor(), 1200);
        assert_eq!(product.expired_date, NaiveDate::from_ymd_opt(2026, 9, 1));

        // Earlier expiry wins.
        fx.purchase(&[NewLineItem::new(&fx.product_id, 1).expiring("2026-06-15")])
            .await;
        let product = fx.product(&fx.product_id).await;
        assert_eq!(product.expired_date, NaiveDate::from_ymd_opt(2026, 6, 15));
        assert_eq!(product.stock, 11);
    }

    #[tokio::test]
    async fn test_update_purchase_moves_stock_by_difference() {
        let fx = Fixture::new().await;
        let ledger = fx.ledger();
        let purchase = fx
            .purchase(&[NewLineItem::new(&fx.product_id, 2).in_unit(BOX_UNIT)])
            .await;
        assert_eq!(fx.stock(&fx.product_id).await, 24);

        let line = ledger
            .update_item(&purchase.items[0].id, &LineItemUpdate::qty(1))
            .await
            .unwrap();
        assert_eq!(line.base_qty, 12);
        assert_eq!(line.sub_total.minor(), 12000);
        assert_eq!(fx.stock(&fx.product_id).await, 12);
        assert_eq!(fx.header(&purchase.header.id).await.total.minor(), 12000);
    }

    #[tokio::test]
    async fn test_update_cannot_unreceive_sold_stock() {
        let fx = Fixture::new().await;
        let ledger = fx.ledger();
        let purchase = fx.purchase(&[NewLineItem::new(&fx.product_id, 10)]).await;
        fx.sale(&[NewLineItem::new(&fx.product_id, 8)]).await;

        // Undoing the purchase would need 10 on hand, only 2 remain.
        let err = ledger
            .update_item(&purchase.items[0].id, &LineItemUpdate::qty(9))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientStock);
        assert_eq!(fx.stock(&fx.product_id).await, 2);
    }

    #[tokio::test]
    async fn test_opname_replaces_and_delete_restores_recorded_stock() {
        let fx = Fixture::new().await;
        let ledger = fx.ledger();
        fx.restock(&fx.product_id, 10).await;

        let opname = ledger
            .create_header(&NewHeader::new(TransactionKind::Opname, &fx.branch_id, &fx.user_id))
            .await
            .unwrap();

        let counted = ledger
            .create_item(&opname.id, &NewLineItem::new(&fx.product_id, 8))
            .await
            .unwrap();
        assert_eq!(counted.qty_exist, 10);
        assert_eq!(counted.sub_total_exist.minor(), 10_000);
        assert_eq!(fx.stock(&fx.product_id).await, 8);
        assert_eq!(fx.header(&opname.id).await.total.minor(), -2000);

        // Recount replaces, keeping the pre-count figure.
        let recount = ledger
            .create_item(&opname.id, &NewLineItem::new(&fx.product_id, 9))
            .await
            .unwrap();
        assert_eq!(recount.qty, 9);
        assert_eq!(recount.qty_exist, 10);
        assert_eq!(fx.stock(&fx.product_id).await, 9);

        let header = ledger.delete_item(&recount.id).await.unwrap();
        assert!(header.total.is_zero());
        assert_eq!(fx.stock(&fx.product_id).await, 10);
    }

    #[tokio::test]
    async fn test_sale_rejects_non_base_unit() {
        let fx = Fixture::new().await;
        fx.restock(&fx.product_id, 24).await;
        let ledger = fx.ledger();
        let sale = ledger
            .create_header(&NewHeader::new(TransactionKind::Sale, &fx.branch_id, &fx.user_id))
            .await
            .unwrap();

        let err = ledger
            .create_item(&sale.id, &NewLineItem::new(&fx.product_id, 1).in_unit(BOX_UNIT))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert_eq!(fx.stock(&fx.product_id).await, 24);
    }

    #[tokio::test]
    async fn test_invalid_inputs() {
        let fx = Fixture::new().await;
        let ledger = fx.ledger();
        let purchase = ledger
            .create_header(&NewHeader::new(TransactionKind::Purchase, &fx.branch_id, &fx.user_id))
            .await
            .unwrap();

        let cases = [
            NewLineItem::new(&fx.product_id, 0),
            NewLineItem::new("", 1),
            NewLineItem::new(&fx.product_id, 1).expiring("31/12/2026"),
            NewLineItem::new(&fx.product_id, 1).at_price(Money::from_minor(-5)),
        ];
        for case in &cases {
            let err = ledger.create_item(&purchase.id, case).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidInput, "{:?}", case);
        }

        let err = ledger
            .create_item(&purchase.id, &NewLineItem::new("PRD-missing", 1))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err = ledger
            .create_item("PUR-missing", &NewLineItem::new(&fx.product_id, 1))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(fx.stock(&fx.product_id).await, 0);
    }

    #[tokio::test]
    async fn test_purchase_line_keeps_returned_quantity() {
        let fx = Fixture::new().await;
        let ledger = fx.ledger();
        let purchase = fx.purchase(&[NewLineItem::new(&fx.product_id, 10)]).await;
        return_against(&fx, TransactionKind::BuyReturn, &purchase.header.id, 8).await;
        assert_eq!(fx.stock(&fx.product_id).await, 2);

        let line_id = &purchase.items[0].id;
        let err = ledger
            .update_item(line_id, &LineItemUpdate::qty(7))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ReturnExceedsOriginal);

        let err = ledger.delete_item(line_id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);

        assert_eq!(fx.stock(&fx.product_id).await, 2);
        assert_eq!(fx.header(&purchase.header.id).await.total.minor(), 10_000);
    }

    #[tokio::test]
    async fn test_sale_line_keeps_returned_quantity() {
        let fx = Fixture::new().await;
        let ledger = fx.ledger();
        fx.restock(&fx.product_id, 10).await;
        let sale = fx.sale(&[NewLineItem::new(&fx.product_id, 5)]).await;
        return_against(&fx, TransactionKind::SaleReturn, &sale.header.id, 5).await;
        assert_eq!(fx.stock(&fx.product_id).await, 10);

        let err = ledger
            .update_item(&sale.items[0].id, &LineItemUpdate::qty(1))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ReturnExceedsOriginal);

        let err = ledger.delete_item(&sale.items[0].id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(fx.stock(&fx.product_id).await, 10);
        assert_eq!(fx.header(&sale.header.id).await.total.minor(), 7500);
    }

    #[tokio::test]
    async fn test_oversized_amounts_are_invalid_input() {
        let fx = Fixture::new().await;
        let ledger = fx.ledger();
        let purchase = ledger
            .create_header(&NewHeader::new(TransactionKind::Purchase, &fx.branch_id, &fx.user_id))
            .await
            .unwrap();

        let err = ledger
            .create_item(
                &purchase.id,
                &NewLineItem::new(&fx.product_id, 3).at_price(Money::from_minor(i64::MAX / 2)),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        // Within the price cap, but not once multiplied out.
        let price = Money::from_minor(ledger_core::MAX_LINE_AMOUNT / 2);
        let line = ledger
            .create_item(&purchase.id, &NewLineItem::new(&fx.product_id, 1).at_price(price))
            .await
            .unwrap();
        let err = ledger
            .update_item(&line.id, &LineItemUpdate::qty(3))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert_eq!(fx.stock(&fx.product_id).await, 1);
    }
}
