//! # Transactional Ledger Engine
//!
//! Stock, line items, header totals and derived reports, all moved inside
//! one database transaction per request.
//!
//! ## Call Graph
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Ledger (service.rs) ── begin ──► engine fn(&mut *tx, &ctx, ..) ──►     │
//! │                          commit on Ok / rollback on Err                 │
//! │                                                                         │
//! │  headers::create_header ──► quota::charge                               │
//! │          │                                                              │
//! │          ▼                                                              │
//! │  lines::create_item ──► conversion::resolve                             │
//! │          │          ──► returns::check_line (returns only)              │
//! │          │          ──► stock::{increase, decrease, set}                │
//! │          ▼                                                              │
//! │  recalc::recalculate ──► reports::sync_report                           │
//! │                      ──► reports::sync_daily_profit (sales)             │
//! │                                                                         │
//! │  cleanup::run ── one transaction per abandoned header                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Engine functions take `&mut SqliteConnection` and never open or commit
//! transactions themselves; only [`Ledger`] does.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::SqliteConnection;

use crate::error::LedgerResult;
use crate::repository::{header, product};
use ledger_core::{Clock, Header, IdGenerator, Product};

pub mod cleanup;
pub mod conversion;
pub mod headers;
pub mod lines;
pub mod quota;
pub mod recalc;
pub mod reports;
pub mod returns;
pub mod service;
pub mod stock;

#[cfg(test)]
pub(crate) mod fixtures;

pub use cleanup::CleanupSummary;
pub use service::{spawn_cleanup_task, Ledger, LedgerOptions};

/// Collaborators every engine call needs.
#[derive(Clone, Copy)]
pub struct LedgerContext<'a> {
    pub clock: &'a dyn Clock,
    pub ids: &'a dyn IdGenerator,
}

impl<'a> LedgerContext<'a> {
    pub fn new(clock: &'a dyn Clock, ids: &'a dyn IdGenerator) -> Self {
        LedgerContext { clock, ids }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn next_id(&self, prefix: &str) -> String {
        self.ids.next(prefix)
    }
}

pub(crate) async fn load_product(conn: &mut SqliteConnection, id: &str) -> LedgerResult<Product> {
    product::fetch_product(conn, id)
        .await?
        .ok_or_else(|| crate::LedgerError::not_found("Product", id))
}

pub(crate) async fn load_header(conn: &mut SqliteConnection, id: &str) -> LedgerResult<Header> {
    header::fetch_header(conn, id)
        .await?
        .ok_or_else(|| crate::LedgerError::not_found("Header", id))
}
