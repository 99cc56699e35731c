//! # Repository Module
//!
//! SQL for every table the ledger touches.
//!
//! ## Two Access Paths
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  ledger engine (inside one sqlx::Transaction)                           │
//! │       │                                                                 │
//! │       │  product::fetch_product(&mut *tx, id)                           │
//! │       │  item::returned_qty(&mut *tx, origin, product, kind, None)      │
//! │       ▼                                                                 │
//! │  free functions over &mut SqliteConnection  (crate-private)            │
//! │                                                                         │
//! │  callers outside the engine                                             │
//! │       │                                                                 │
//! │       │  db.products().get_by_id(id)                                    │
//! │       │  db.reports().daily_profit(date, branch, user)                  │
//! │       ▼                                                                 │
//! │  *Repository structs holding the pool (reads, master-data inserts)      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`BranchRepository`] - Branch billing mode and quota
//! - [`UnitRepository`] - Units of measure
//! - [`ProductRepository`] - Product master data
//! - [`ConversionRepository`] - Unit conversion reads
//! - [`HeaderRepository`] - Transaction headers with their items
//! - [`ReportRepository`] - Transaction ledger and daily profit rows

pub mod branch;
pub mod conversion;
pub mod header;
pub mod item;
pub mod product;
pub mod report;
pub mod unit;

pub use branch::BranchRepository;
pub use conversion::ConversionRepository;
pub use header::HeaderRepository;
pub use product::ProductRepository;
pub use report::ReportRepository;
pub use unit::UnitRepository;
