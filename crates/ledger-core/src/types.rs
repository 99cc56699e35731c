//! # Domain Types
//!
//! Entities, enums and request shapes shared by every ledger operation.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │     Header      │   │    LineItem     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  unit_id (base) │   │  kind           │   │  header_id (FK) │       │
//! │  │  stock ≥ 0      │◄──│  branch / user  │◄──│  product / unit │       │
//! │  │  purchase_price │   │  total, profit  │   │  qty, base_qty  │       │
//! │  │  sales_price    │   │  origin_id      │   │  price, sub_tot │       │
//! │  │  expired_date   │   │  payment        │   │  qty_exist      │       │
//! │  └─────────────────┘   └────────┬────────┘   └─────────────────┘       │
//! │                                 │ upsert by header id                  │
//! │  ┌─────────────────┐   ┌────────▼────────┐   ┌─────────────────┐       │
//! │  │ UnitConversion  │   │TransactionReport│   │DailyProfitReport│       │
//! │  │ init → final ×n │   │ type/total/pay  │   │ (date,branch,   │       │
//! │  │ per branch      │   └─────────────────┘   │  user) buckets  │       │
//! │  └─────────────────┘                         └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Six transaction kinds share one header shape and one line shape; what
//! differs between them lives in [`crate::strategy`].

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::{CoreError, ValidationError};
use crate::money::Money;

// =============================================================================
// Transaction Kind
// =============================================================================

/// The six header/line variants the ledger knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum TransactionKind {
    Purchase,
    Sale,
    FirstStock,
    Opname,
    BuyReturn,
    SaleReturn,
}

impl TransactionKind {
    /// Every kind, in the order the cleanup job visits them.
    pub const ALL: [TransactionKind; 6] = [
        TransactionKind::Purchase,
        TransactionKind::Sale,
        TransactionKind::FirstStock,
        TransactionKind::Opname,
        TransactionKind::BuyReturn,
        TransactionKind::SaleReturn,
    ];

    /// Id prefix for headers of this kind.
    pub const fn header_prefix(&self) -> &'static str {
        match self {
            TransactionKind::Purchase => "PUR",
            TransactionKind::Sale => "SAL",
            TransactionKind::FirstStock => "FST",
            TransactionKind::Opname => "OPN",
            TransactionKind::BuyReturn => "BRT",
            TransactionKind::SaleReturn => "SRT",
        }
    }

    /// Id prefix for line items of this kind.
    pub const fn item_prefix(&self) -> &'static str {
        match self {
            TransactionKind::Purchase => "PIT",
            TransactionKind::Sale => "SIT",
            TransactionKind::FirstStock => "FSI",
            TransactionKind::Opname => "OPI",
            TransactionKind::BuyReturn => "BRI",
            TransactionKind::SaleReturn => "SRI",
        }
    }

    /// For return kinds, the kind of header being reversed.
    pub const fn origin_kind(&self) -> Option<TransactionKind> {
        match self {
            TransactionKind::BuyReturn => Some(TransactionKind::Purchase),
            TransactionKind::SaleReturn => Some(TransactionKind::Sale),
            _ => None,
        }
    }

    pub const fn is_return(&self) -> bool {
        self.origin_kind().is_some()
    }

    /// Which counterparty a header of this kind records, if any.
    pub const fn counterparty(&self) -> Option<Counterparty> {
        match self {
            TransactionKind::Purchase | TransactionKind::BuyReturn => Some(Counterparty::Supplier),
            TransactionKind::Sale | TransactionKind::SaleReturn => Some(Counterparty::Member),
            TransactionKind::FirstStock | TransactionKind::Opname => None,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Purchase => "purchase",
            TransactionKind::Sale => "sale",
            TransactionKind::FirstStock => "first_stock",
            TransactionKind::Opname => "opname",
            TransactionKind::BuyReturn => "buy_return",
            TransactionKind::SaleReturn => "sale_return",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TransactionKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| {
                ValidationError::InvalidFormat {
                    field: "kind".to_string(),
                    reason: format!("unknown transaction kind '{}'", s),
                }
                .into()
            })
    }
}

// =============================================================================
// Payment Status
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum PaymentStatus {
    #[default]
    PaidByCash,
    PaidByCredit,
    Unpaid,
    /// Stock-take headers carry this tag instead of a payment.
    Opname,
}

impl PaymentStatus {
    /// Payment tag used when the request leaves it empty.
    pub const fn default_for(kind: TransactionKind) -> Self {
        match kind {
            TransactionKind::Opname => PaymentStatus::Opname,
            _ => PaymentStatus::PaidByCash,
        }
    }
}

// =============================================================================
// Counterparty
// =============================================================================

/// The party on the other side of a header: goods come from a supplier
/// and go to a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Counterparty {
    Supplier,
    Member,
}

impl Counterparty {
    pub const fn field(&self) -> &'static str {
        match self {
            Counterparty::Supplier => "supplier_id",
            Counterparty::Member => "member_id",
        }
    }
}

// =============================================================================
// Subscription Type
// =============================================================================

/// Branch billing model. Only `Quota` interacts with the ledger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum SubscriptionType {
    #[default]
    Monthly,
    Quota,
}

// =============================================================================
// Master Data
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Branch {
    pub id: String,
    pub name: String,
    pub subscription_type: SubscriptionType,
    /// Remaining metered transactions (only meaningful for `Quota`).
    pub quota: i64,
    /// Walk-in member recorded on sales that name no member.
    pub default_member_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Unit {
    pub id: String,
    pub branch_id: String,
    pub name: String,
}

/// A product as the ledger sees it.
///
/// `stock` is always expressed in the base unit (`unit_id`) and is only
/// ever written through the stock primitives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    pub id: String,
    pub branch_id: String,
    pub name: String,
    /// Base unit.
    pub unit_id: String,
    pub stock: i64,
    /// Last-known cost per base unit.
    pub purchase_price: Money,
    pub sales_price: Money,
    #[ts(as = "Option<String>")]
    pub expired_date: Option<NaiveDate>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// "1 `init_id` unit = `value_conv` `final_id` units", scoped per product
/// and branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct UnitConversion {
    pub id: String,
    pub product_id: String,
    pub init_id: String,
    pub final_id: String,
    pub value_conv: i64,
    pub branch_id: String,
}

// =============================================================================
// Header & Line Item
// =============================================================================

/// Parent record of a purchase, sale, first-stock, opname or return.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Header {
    pub id: String,
    pub kind: TransactionKind,
    pub branch_id: String,
    pub user_id: String,
    #[ts(as = "String")]
    pub txn_date: NaiveDate,
    pub description: Option<String>,
    /// Header being reversed (returns only).
    pub origin_id: Option<String>,
    /// Purchases and buy returns.
    pub supplier_id: Option<String>,
    /// Sales and sale returns.
    pub member_id: Option<String>,
    /// Sale-level discount; zero for every other kind.
    pub discount: Money,
    /// Derived from live line items; never trusted from the client.
    pub total: Money,
    /// Sale profit estimate after discount; zero for every other kind.
    pub profit: Money,
    pub payment: PaymentStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// A per-product row under a header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct LineItem {
    pub id: String,
    pub header_id: String,
    pub product_id: String,
    /// Unit the quantity was entered in.
    pub unit_id: String,
    /// Quantity in `unit_id`.
    pub qty: i64,
    /// `qty` converted to the product's base unit (what stock moved by).
    pub base_qty: i64,
    /// Price per `unit_id`.
    pub price: Money,
    /// Product purchase price at entry; drives sale profit.
    pub cost_price: Money,
    pub sub_total: Money,
    /// Opname only: stock recorded before the count.
    pub qty_exist: i64,
    /// Opname only: `qty_exist × price`.
    pub sub_total_exist: Money,
    #[ts(as = "Option<String>")]
    pub expired_date: Option<NaiveDate>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl LineItem {
    /// Profit contributed by this line when it belongs to a sale.
    pub fn profit(&self) -> Money {
        (self.price - self.cost_price).multiply_quantity(self.qty)
    }
}

// =============================================================================
// Derived Reports
// =============================================================================

/// Denormalized ledger row, one per header id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct TransactionReport {
    pub id: String,
    pub transaction_type: TransactionKind,
    pub branch_id: String,
    pub user_id: String,
    pub total: Money,
    pub payment: PaymentStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// Sale totals and profit per (report date, branch, user).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct DailyProfitReport {
    pub id: String,
    #[ts(as = "String")]
    pub report_date: NaiveDate,
    pub branch_id: String,
    pub user_id: String,
    pub total_sales: Money,
    pub profit_estimate: Money,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Requests
// =============================================================================

/// Header fields supplied by the request layer.
///
/// Dates arrive as `YYYY-MM-DD` strings and are parsed by the engine so a
/// malformed date surfaces as `InvalidInput`.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewHeader {
    pub kind: TransactionKind,
    pub branch_id: String,
    pub user_id: String,
    /// Defaults to today's local date.
    #[serde(default)]
    pub txn_date: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Required for returns.
    #[serde(default)]
    pub origin_id: Option<String>,
    /// Purchases and buy returns; returns default to the origin's supplier.
    #[serde(default)]
    pub supplier_id: Option<String>,
    /// Sales and sale returns; a sale defaults to the branch's walk-in
    /// member, a return to the origin's member.
    #[serde(default)]
    pub member_id: Option<String>,
    #[serde(default)]
    pub discount: Option<Money>,
    #[serde(default)]
    pub payment: Option<PaymentStatus>,
}

impl NewHeader {
    /// Minimal header for `kind` (today, default payment, no discount).
    pub fn new(kind: TransactionKind, branch_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        NewHeader {
            kind,
            branch_id: branch_id.into(),
            user_id: user_id.into(),
            txn_date: None,
            description: None,
            origin_id: None,
            supplier_id: None,
            member_id: None,
            discount: None,
            payment: None,
        }
    }

    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.txn_date = Some(date.into());
        self
    }

    pub fn with_origin(mut self, origin_id: impl Into<String>) -> Self {
        self.origin_id = Some(origin_id.into());
        self
    }

    pub fn with_supplier(mut self, supplier_id: impl Into<String>) -> Self {
        self.supplier_id = Some(supplier_id.into());
        self
    }

    pub fn with_member(mut self, member_id: impl Into<String>) -> Self {
        self.member_id = Some(member_id.into());
        self
    }

    pub fn with_discount(mut self, discount: Money) -> Self {
        self.discount = Some(discount);
        self
    }

    pub fn with_payment(mut self, payment: PaymentStatus) -> Self {
        self.payment = Some(payment);
        self
    }
}

/// Editable header fields; `None` leaves the stored value alone.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct HeaderUpdate {
    #[serde(default)]
    pub txn_date: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Purchases only; returns keep their origin's counterparty.
    #[serde(default)]
    pub supplier_id: Option<String>,
    /// Sales only.
    #[serde(default)]
    pub member_id: Option<String>,
    #[serde(default)]
    pub discount: Option<Money>,
    #[serde(default)]
    pub payment: Option<PaymentStatus>,
}

/// One requested line.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewLineItem {
    pub product_id: String,
    /// Defaults to the product's base unit.
    #[serde(default)]
    pub unit_id: Option<String>,
    /// Quantity in `unit_id` (for opname: the counted quantity).
    pub qty: i64,
    /// Base-unit price for purchases and first stock; ignored by kinds whose
    /// price comes from the product or the origin line.
    #[serde(default)]
    pub price: Option<Money>,
    #[serde(default)]
    pub expired_date: Option<String>,
}

impl NewLineItem {
    pub fn new(product_id: impl Into<String>, qty: i64) -> Self {
        NewLineItem {
            product_id: product_id.into(),
            unit_id: None,
            qty,
            price: None,
            expired_date: None,
        }
    }

    pub fn in_unit(mut self, unit_id: impl Into<String>) -> Self {
        self.unit_id = Some(unit_id.into());
        self
    }

    pub fn at_price(mut self, price: Money) -> Self {
        self.price = Some(price);
        self
    }

    pub fn expiring(mut self, date: impl Into<String>) -> Self {
        self.expired_date = Some(date.into());
        self
    }
}

/// Edit of an existing line.
///
/// The line keeps its product and unit; stock is reversed for the old
/// quantity and re-applied for the new one.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LineItemUpdate {
    pub qty: i64,
    /// New base-unit price (purchases and first stock only).
    #[serde(default)]
    pub price: Option<Money>,
    /// New expiry; `None` keeps the recorded one.
    #[serde(default)]
    pub expired_date: Option<String>,
}

impl LineItemUpdate {
    pub fn qty(qty: i64) -> Self {
        LineItemUpdate {
            qty,
            price: None,
            expired_date: None,
        }
    }

    pub fn at_price(mut self, price: Money) -> Self {
        self.price = Some(price);
        self
    }
}

/// Header plus items created in one atomic call.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewTransaction {
    pub header: NewHeader,
    pub items: Vec<NewLineItem>,
}

/// A header together with its live lines.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct HeaderWithItems {
    pub header: Header,
    pub items: Vec<LineItem>,
}

/// New unit conversion definition.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewUnitConversion {
    pub product_id: String,
    pub init_id: String,
    pub final_id: String,
    pub value_conv: i64,
    pub branch_id: String,
}

/// A unit a product can be transacted in, priced from its purchase price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PricedUnit {
    pub unit_id: String,
    pub multiplier: i64,
    pub price: Money,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trips_through_str() {
        for kind in TransactionKind::ALL {
            assert_eq!(kind.as_str().parse::<TransactionKind>().unwrap(), kind);
        }
        assert!("refund".parse::<TransactionKind>().is_err());
    }

    #[test]
    fn test_origin_kinds() {
        assert_eq!(
            TransactionKind::BuyReturn.origin_kind(),
            Some(TransactionKind::Purchase)
        );
        assert_eq!(
            TransactionKind::SaleReturn.origin_kind(),
            Some(TransactionKind::Sale)
        );
        assert!(!TransactionKind::Opname.is_return());
    }

    #[test]
    fn test_counterparty_by_kind() {
        assert_eq!(
            TransactionKind::BuyReturn.counterparty(),
            Some(Counterparty::Supplier)
        );
        assert_eq!(TransactionKind::Sale.counterparty(), Some(Counterparty::Member));
        assert_eq!(TransactionKind::FirstStock.counterparty(), None);
        assert_eq!(Counterparty::Member.field(), "member_id");
    }

    #[test]
    fn test_default_payment() {
        assert_eq!(
            PaymentStatus::default_for(TransactionKind::Opname),
            PaymentStatus::Opname
        );
        assert_eq!(
            PaymentStatus::default_for(TransactionKind::Sale),
            PaymentStatus::PaidByCash
        );
    }

    #[test]
    fn test_new_line_item_deserializes_with_defaults() {
        let item: NewLineItem =
            serde_json::from_str(r#"{"product_id":"PRD-1","qty":2}"#).unwrap();
        assert_eq!(item.qty, 2);
        assert!(item.unit_id.is_none());
        assert!(item.price.is_none());
    }
}
