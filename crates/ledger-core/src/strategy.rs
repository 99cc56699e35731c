//! # Line Strategies
//!
//! One generic line engine serves all six transaction kinds. What differs
//! between them is captured here as data:
//!
//! ```text
//! ┌──────────────┬───────────┬──────────────────┬──────┬─────────┬────────┐
//! │ kind         │ stock     │ price source     │ conv │ ratchet │ merge  │
//! ├──────────────┼───────────┼──────────────────┼──────┼─────────┼────────┤
//! │ purchase     │ increase  │ supplied / cost  │ yes  │ yes     │ add    │
//! │ first_stock  │ increase  │ supplied / cost  │ yes  │ yes     │ add    │
//! │ sale         │ decrease  │ sales price      │ no   │ no      │ add    │
//! │ opname       │ set       │ purchase price   │ no   │ no      │ replace│
//! │ buy_return   │ decrease  │ origin line      │ yes* │ no      │ add    │
//! │ sale_return  │ increase  │ origin line      │ no   │ no      │ add    │
//! └──────────────┴───────────┴──────────────────┴──────┴─────────┴────────┘
//!   * through the origin line's unit, not the request's
//! ```
//!
//! The remaining functions are the arithmetic the engine applies once the
//! rows are loaded: multipliers, bounds, totals.

use chrono::NaiveDate;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{LineItem, TransactionKind};

// =============================================================================
// Strategy
// =============================================================================

/// Direction a line moves on-hand stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockEffect {
    Increase,
    Decrease,
    /// Overwrite with the counted quantity.
    Set,
}

/// Where a new line's unit price comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceSource {
    /// Request price (base-unit terms), falling back to the product's
    /// purchase price, multiplied into the requested unit.
    SuppliedOrCost,
    /// Product sales price at the moment of entry.
    SalesPrice,
    /// Product purchase price (opname valuation).
    PurchasePrice,
    /// Price recorded on the origin transaction's line.
    OriginLine,
}

/// What happens when a second line for the same (header, product) arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergePolicy {
    /// Add quantities; keep the existing unit price.
    Accumulate,
    /// Overwrite the quantity (opname counts).
    Replace,
}

/// Per-kind behaviour of the line engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineStrategy {
    pub effect: StockEffect,
    pub price_source: PriceSource,
    /// Whether a non-base unit is converted through `unit_conversions`.
    pub applies_conversion: bool,
    /// Raise the product purchase price when the incoming price is higher.
    pub ratchets_price: bool,
    /// Move the product expiry earlier when the incoming date is earlier.
    pub tracks_expiry: bool,
    pub merge: MergePolicy,
}

impl LineStrategy {
    pub const fn for_kind(kind: TransactionKind) -> Self {
        match kind {
            TransactionKind::Purchase | TransactionKind::FirstStock => LineStrategy {
                effect: StockEffect::Increase,
                price_source: PriceSource::SuppliedOrCost,
                applies_conversion: true,
                ratchets_price: true,
                tracks_expiry: true,
                merge: MergePolicy::Accumulate,
            },
            TransactionKind::Sale => LineStrategy {
                effect: StockEffect::Decrease,
                price_source: PriceSource::SalesPrice,
                applies_conversion: false,
                ratchets_price: false,
                tracks_expiry: false,
                merge: MergePolicy::Accumulate,
            },
            TransactionKind::Opname => LineStrategy {
                effect: StockEffect::Set,
                price_source: PriceSource::PurchasePrice,
                applies_conversion: false,
                ratchets_price: false,
                tracks_expiry: true,
                merge: MergePolicy::Replace,
            },
            TransactionKind::BuyReturn => LineStrategy {
                effect: StockEffect::Decrease,
                price_source: PriceSource::OriginLine,
                applies_conversion: true,
                ratchets_price: false,
                tracks_expiry: false,
                merge: MergePolicy::Accumulate,
            },
            TransactionKind::SaleReturn => LineStrategy {
                effect: StockEffect::Increase,
                price_source: PriceSource::OriginLine,
                applies_conversion: false,
                ratchets_price: false,
                tracks_expiry: false,
                merge: MergePolicy::Accumulate,
            },
        }
    }

    /// The effect that undoes this one (used by edit and delete).
    ///
    /// `Set` has no arithmetic inverse; undoing a count restores the
    /// recorded `qty_exist` instead, so it maps to itself.
    pub const fn reverse_effect(&self) -> StockEffect {
        match self.effect {
            StockEffect::Increase => StockEffect::Decrease,
            StockEffect::Decrease => StockEffect::Increase,
            StockEffect::Set => StockEffect::Set,
        }
    }
}

// =============================================================================
// Unit Multiplier
// =============================================================================

/// "1 requested unit = n base units".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Multiplier(i64);

impl Multiplier {
    pub const IDENTITY: Multiplier = Multiplier(1);

    /// Wraps a stored conversion value. Values below 1 are treated as 1.
    pub const fn new(value: i64) -> Self {
        if value < 1 {
            Multiplier(1)
        } else {
            Multiplier(value)
        }
    }

    pub const fn value(&self) -> i64 {
        self.0
    }

    /// Requested quantity → base-unit quantity.
    pub const fn to_base_qty(&self, qty: i64) -> i64 {
        qty * self.0
    }

    /// Base-unit price → price per requested unit.
    pub const fn to_unit_price(&self, base_price: Money) -> Money {
        base_price.multiply_quantity(self.0)
    }

    /// [`to_base_qty`](Self::to_base_qty), or `None` on overflow.
    pub const fn checked_base_qty(&self, qty: i64) -> Option<i64> {
        qty.checked_mul(self.0)
    }
}

// =============================================================================
// Product Rules
// =============================================================================

/// New on-hand quantity after a decrease, or `InsufficientStock`.
pub fn checked_decrease(product_id: &str, available: i64, qty: i64) -> CoreResult<i64> {
    if available < qty {
        return Err(CoreError::InsufficientStock {
            product_id: product_id.to_string(),
            available,
            requested: qty,
        });
    }
    Ok(available - qty)
}

/// Purchase price after the upward-only ratchet.
pub fn ratchet_price(current: Money, incoming: Money) -> Money {
    current.max(incoming)
}

/// Product expiry after receiving goods dated `incoming`.
///
/// Earliest date wins while there is stock on hand; an empty shelf takes
/// the incoming date as-is.
pub fn earliest_expiry(
    stock_before: i64,
    current: Option<NaiveDate>,
    incoming: Option<NaiveDate>,
) -> Option<NaiveDate> {
    match (current, incoming) {
        (_, None) => current,
        (None, Some(date)) => Some(date),
        (Some(_), Some(date)) if stock_before <= 0 => Some(date),
        (Some(existing), Some(date)) => Some(existing.min(date)),
    }
}

/// Rejects a return that would push cumulative returns past the original.
pub fn check_return_bound(
    product_id: &str,
    original: i64,
    already_returned: i64,
    requested: i64,
) -> CoreResult<()> {
    if already_returned + requested > original {
        return Err(CoreError::ReturnExceedsOriginal {
            product_id: product_id.to_string(),
            original,
            already_returned,
            requested,
        });
    }
    Ok(())
}

// =============================================================================
// Header Totals
// =============================================================================

/// Totals derived from a header's live lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HeaderTotals {
    pub total: Money,
    pub profit: Money,
}

impl HeaderTotals {
    /// Recomputes totals for `kind` from `lines`.
    ///
    /// - sale: Σ subtotal − discount and Σ profit − discount, both clamped
    ///   at zero
    /// - opname: Σ (subtotal − recorded subtotal), the valuation adjustment
    /// - everything else: Σ subtotal
    pub fn compute(kind: TransactionKind, lines: &[LineItem], discount: Money) -> Self {
        match kind {
            TransactionKind::Sale => {
                let gross: Money = lines.iter().map(|l| l.sub_total).sum();
                let profit: Money = lines.iter().map(LineItem::profit).sum();
                HeaderTotals {
                    total: (gross - discount).clamp_non_negative(),
                    profit: (profit - discount).clamp_non_negative(),
                }
            }
            TransactionKind::Opname => HeaderTotals {
                total: lines.iter().map(|l| l.sub_total - l.sub_total_exist).sum(),
                profit: Money::zero(),
            },
            _ => HeaderTotals {
                total: lines.iter().map(|l| l.sub_total).sum(),
                profit: Money::zero(),
            },
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn line(qty: i64, price: i64, cost: i64, exist: i64) -> LineItem {
        let now = Utc::now();
        LineItem {
            id: "L".into(),
            header_id: "H".into(),
            product_id: "P".into(),
            unit_id: "pcs".into(),
            qty,
            base_qty: qty,
            price: Money::from_minor(price),
            cost_price: Money::from_minor(cost),
            sub_total: Money::from_minor(price * qty),
            qty_exist: exist,
            sub_total_exist: Money::from_minor(price * exist),
            expired_date: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_multiplier_scenario_box_of_twelve() {
        let m = Multiplier::new(12);
        assert_eq!(m.to_base_qty(2), 24);
        assert_eq!(m.to_unit_price(Money::from_minor(1000)).minor(), 12000);
        assert_eq!(Multiplier::new(0), Multiplier::IDENTITY);
    }

    #[test]
    fn test_checked_decrease() {
        assert_eq!(checked_decrease("P", 5, 5).unwrap(), 0);
        let err = checked_decrease("P", 5, 6).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InsufficientStock {
                available: 5,
                requested: 6,
                ..
            }
        ));
    }

    #[test]
    fn test_ratchet_only_goes_up() {
        let current = Money::from_minor(1000);
        assert_eq!(ratchet_price(current, Money::from_minor(900)), current);
        assert_eq!(
            ratchet_price(current, Money::from_minor(1100)),
            Money::from_minor(1100)
        );
    }

    #[test]
    fn test_earliest_expiry() {
        let jan = NaiveDate::from_ymd_opt(2026, 1, 1);
        let jun = NaiveDate::from_ymd_opt(2026, 6, 1);

        assert_eq!(earliest_expiry(10, jun, jan), jan);
        assert_eq!(earliest_expiry(10, jan, jun), jan);
        // Empty shelf: the incoming batch defines the date.
        assert_eq!(earliest_expiry(0, jan, jun), jun);
        assert_eq!(earliest_expiry(3, None, jun), jun);
        assert_eq!(earliest_expiry(3, jan, None), jan);
    }

    #[test]
    fn test_return_bound() {
        assert!(check_return_bound("P", 10, 4, 6).is_ok());
        assert!(matches!(
            check_return_bound("P", 10, 4, 7),
            Err(CoreError::ReturnExceedsOriginal { original: 10, .. })
        ));
    }

    #[test]
    fn test_sale_totals_clamp_discount() {
        let lines = vec![line(2, 1500, 1000, 0), line(1, 2000, 1200, 0)];
        let totals =
            HeaderTotals::compute(TransactionKind::Sale, &lines, Money::from_minor(500));
        assert_eq!(totals.total.minor(), 4500);
        assert_eq!(totals.profit.minor(), 1300);

        let totals =
            HeaderTotals::compute(TransactionKind::Sale, &lines, Money::from_minor(9000));
        assert_eq!(totals.total, Money::zero());
        assert_eq!(totals.profit, Money::zero());
    }

    #[test]
    fn test_opname_total_is_adjustment() {
        let lines = vec![line(8, 100, 100, 10)];
        let totals = HeaderTotals::compute(TransactionKind::Opname, &lines, Money::zero());
        assert_eq!(totals.total.minor(), -200);
    }

    #[test]
    fn test_purchase_total_ignores_discount() {
        let lines = vec![line(2, 12000, 0, 0)];
        let totals =
            HeaderTotals::compute(TransactionKind::Purchase, &lines, Money::from_minor(100));
        assert_eq!(totals.total.minor(), 24000);
    }

    #[test]
    fn test_reverse_effects() {
        let sale = LineStrategy::for_kind(TransactionKind::Sale);
        assert_eq!(sale.reverse_effect(), StockEffect::Increase);
        let opname = LineStrategy::for_kind(TransactionKind::Opname);
        assert_eq!(opname.merge, MergePolicy::Replace);
        assert_eq!(opname.reverse_effect(), StockEffect::Set);
    }
}
