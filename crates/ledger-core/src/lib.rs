//! # ledger-core: Pure Rules for the Branch Inventory Ledger
//!
//! Everything the ledger decides without touching storage: money
//! arithmetic, per-kind line strategies, unit multipliers, header totals,
//! stock and return bounds, and input validation.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Branch Ledger Architecture                       │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │          Request layer (auth, routing, pagination)              │   │
//! │  │   supplies branch id, user id, parsed header + line items       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │        ledger-db: Ledger facade (one DB transaction/request)    │   │
//! │  │   create_header, create_item, update_item, delete_item, …       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ ledger-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │ strategy  │  │ validation│  │   │
//! │  │   │  Header   │  │   Money   │  │ per-kind  │  │  dates    │  │   │
//! │  │   │  LineItem │  │           │  │ totals    │  │  qty      │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Products, headers, lines, reports, request shapes
//! - [`money`] - Integer money
//! - [`strategy`] - Per-kind line behaviour and the arithmetic behind it
//! - [`validation`] - Quantity, amount and date checks
//! - [`clock`] - `Clock` and `IdGenerator` seams
//! - [`error`] - Domain error taxonomy
//!
//! ## Example Usage
//!
//! ```rust
//! use ledger_core::strategy::{HeaderTotals, LineStrategy, Multiplier, StockEffect};
//! use ledger_core::{Money, TransactionKind};
//!
//! let purchase = LineStrategy::for_kind(TransactionKind::Purchase);
//! assert_eq!(purchase.effect, StockEffect::Increase);
//!
//! // 2 boxes of 12 at a base price of 1000
//! let per_box = Multiplier::new(12);
//! assert_eq!(per_box.to_base_qty(2), 24);
//! assert_eq!(per_box.to_unit_price(Money::from_minor(1000)).minor(), 12000);
//!
//! let empty = HeaderTotals::compute(TransactionKind::Purchase, &[], Money::zero());
//! assert!(empty.total.is_zero());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod clock;
pub mod error;
pub mod money;
pub mod strategy;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use clock::{Clock, IdGenerator, ManualClock, PrefixedIds, SequentialIds, SystemClock};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use strategy::{HeaderTotals, LineStrategy, MergePolicy, Multiplier, PriceSource, StockEffect};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Largest quantity accepted on a single line.
///
/// Catches fat-finger entries (10000 instead of 100) before they move stock.
pub const MAX_LINE_QUANTITY: i64 = 1_000_000;

/// Largest amount, in minor units, a single line may carry (prices,
/// subtotals, discounts).
///
/// Keeps header totals summed over many lines inside `i64`.
pub const MAX_LINE_AMOUNT: i64 = 1_000_000_000_000_000;

/// Largest "1 unit = n base units" factor a conversion may declare.
pub const MAX_CONVERSION_VALUE: i64 = 100_000;

/// Default deployment offset from UTC, in hours (UTC+7).
pub const DEFAULT_UTC_OFFSET_HOURS: i32 = 7;

/// Default grace period before an item-less header counts as abandoned.
pub const DEFAULT_CLEANUP_GRACE_MINUTES: i64 = 120;

/// Id prefix for daily profit rows.
pub const DAILY_PROFIT_PREFIX: &str = "DPR";

/// Id prefix for unit conversion rows.
pub const UNIT_CONVERSION_PREFIX: &str = "UNC";
