//! # ledger-db: Storage and Transactional Engine for the Branch Ledger
//!
//! Everything that touches the database: connection pool, migrations,
//! repositories, and the ledger engine that moves stock, line items,
//! header totals and reports together inside one transaction.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Branch Ledger Data Flow                          │
//! │                                                                         │
//! │  Request layer (create sale, add line, ...)                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    ledger-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐    │   │
//! │  │   │    Ledger     │    │  Repositories │    │  Migrations  │    │   │
//! │  │   │  (ledger/)    │    │ (repository/) │    │  (embedded)  │    │   │
//! │  │   │               │    │               │    │              │    │   │
//! │  │   │ begin/commit  │───►│ header, item  │    │ 001_initial  │    │   │
//! │  │   │ line engine   │    │ product, ...  │    │  _schema.sql │    │   │
//! │  │   │ cleanup task  │    │ report        │    │              │    │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘    │   │
//! │  │           │                                                     │   │
//! │  │           ▼                                                     │   │
//! │  │   ledger-core rules (strategy, money, validation)               │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`config`] - TOML configuration with environment overrides
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Storage and ledger error types
//! - [`repository`] - SQL per table
//! - [`ledger`] - Transactional ledger engine and its facade
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ledger_db::{Database, LedgerConfig, Ledger};
//!
//! let config = LedgerConfig::load(None)?;
//! let db = Database::new(config.db_config()).await?;
//! let ledger = Ledger::from_config(&db, &config);
//!
//! let purchase = ledger.create_transaction(&request).await?;
//! let value = ledger.asset_value("BR-1").await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod ledger;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{ConfigError, LedgerConfig};
pub use error::{DbError, ErrorKind, ErrorResponse, LedgerError, LedgerResult};
pub use ledger::{spawn_cleanup_task, CleanupSummary, Ledger, LedgerOptions};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::{
    BranchRepository, ConversionRepository, HeaderRepository, ProductRepository,
    ReportRepository, UnitRepository,
};
