//! # Ledger Facade
//!
//! Public entry point for every ledger operation. Each call opens one
//! transaction, hands it to the engine and commits only on success:
//!
//! ```text
//! Ledger::create_item(header, line)
//!      │
//!      ├── tx = pool.begin()
//!      ├── lines::create_item(&mut *tx, &ctx, ..)
//!      │        Ok  ──► tx.commit()
//!      │        Err ──► tx.rollback(), error returned unchanged
//!      │
//!      └── header writes only: cleanup sweep after commit (if enabled)
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! let db = Database::new(DbConfig::new("ledger.db")).await?;
//! let ledger = db.ledger();
//!
//! let sale = ledger
//!     .create_header(&NewHeader::new(TransactionKind::Sale, "BR-1", "USR-1"))
//!     .await?;
//! ledger.create_item(&sale.id, &NewLineItem::new("PRD-1", 2)).await?;
//! ```

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::Duration;
use sqlx::{Sqlite, SqlitePool, Transaction};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use super::{cleanup, conversion, headers, lines, recalc, reports, returns, CleanupSummary, LedgerContext};
use crate::config::LedgerConfig;
use crate::error::LedgerResult;
use crate::pool::Database;
use ledger_core::{
    Clock, Header, HeaderUpdate, HeaderWithItems, IdGenerator, LineItem, LineItemUpdate, Money,
    NewHeader, NewLineItem, NewTransaction, NewUnitConversion, PrefixedIds, PricedUnit,
    SystemClock, TransactionReport, UnitConversion, DEFAULT_CLEANUP_GRACE_MINUTES,
    DEFAULT_UTC_OFFSET_HOURS,
};

/// Tunables for a [`Ledger`].
#[derive(Debug, Clone, Copy)]
pub struct LedgerOptions {
    /// Age after which an empty header is considered abandoned.
    pub cleanup_grace: Duration,
    /// Sweep abandoned headers after each header create/update.
    pub cleanup_after_writes: bool,
}

impl Default for LedgerOptions {
    fn default() -> Self {
        LedgerOptions {
            cleanup_grace: Duration::minutes(DEFAULT_CLEANUP_GRACE_MINUTES),
            cleanup_after_writes: true,
        }
    }
}

/// Transactional inventory ledger over one SQLite pool.
///
/// Cheap to clone; clones share the pool, clock and id generator.
#[derive(Clone)]
pub struct Ledger {
    pool: SqlitePool,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    options: LedgerOptions,
}

impl Ledger {
    /// Ledger with the system clock at the default offset and random ids.
    pub fn new(pool: SqlitePool) -> Self {
        Ledger {
            pool,
            clock: Arc::new(SystemClock::with_offset_hours(DEFAULT_UTC_OFFSET_HOURS)),
            ids: Arc::new(PrefixedIds),
            options: LedgerOptions::default(),
        }
    }

    /// Ledger configured from a loaded [`LedgerConfig`].
    pub fn from_config(db: &Database, config: &LedgerConfig) -> Self {
        Ledger::new(db.pool().clone())
            .with_clock(Arc::new(config.clock()))
            .with_options(LedgerOptions {
                cleanup_grace: config.cleanup_grace(),
                cleanup_after_writes: config.ledger.cleanup_after_writes,
            })
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_ids(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    pub fn with_options(mut self, options: LedgerOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> LedgerOptions {
        self.options
    }

    pub fn context(&self) -> LedgerContext<'_> {
        LedgerContext::new(self.clock.as_ref(), self.ids.as_ref())
    }

    // =========================================================================
    // Headers
    // =========================================================================

    pub async fn create_header(&self, request: &NewHeader) -> LedgerResult<Header> {
        let ctx = self.context();
        let mut tx = self.pool.begin().await?;
        let result = headers::create_header(&mut *tx, &ctx, request).await;
        let header = finish(tx, "create_header", result).await?;

        self.after_header_write().await;
        Ok(header)
    }

    pub async fn update_header(&self, header_id: &str, update: &HeaderUpdate) -> LedgerResult<Header> {
        let ctx = self.context();
        let mut tx = self.pool.begin().await?;
        let result = headers::update_header(&mut *tx, &ctx, header_id, update).await;
        let header = finish(tx, "update_header", result).await?;

        self.after_header_write().await;
        Ok(header)
    }

    /// Deletes a header and all its lines; returns the header as it was.
    pub async fn delete_header(&self, header_id: &str) -> LedgerResult<Header> {
        let ctx = self.context();
        let mut tx = self.pool.begin().await?;
        let result = headers::delete_header(&mut *tx, &ctx, header_id).await;
        finish(tx, "delete_header", result).await
    }

    /// Header and lines in one transaction; any failing line undoes all.
    pub async fn create_transaction(&self, request: &NewTransaction) -> LedgerResult<HeaderWithItems> {
        let ctx = self.context();
        let mut tx = self.pool.begin().await?;
        let result = headers::create_transaction(&mut *tx, &ctx, request).await;
        let created = finish(tx, "create_transaction", result).await?;

        self.after_header_write().await;
        Ok(created)
    }

    // =========================================================================
    // Line Items
    // =========================================================================

    pub async fn create_item(&self, header_id: &str, request: &NewLineItem) -> LedgerResult<LineItem> {
        let ctx = self.context();
        let mut tx = self.pool.begin().await?;
        let result = lines::create_item(&mut *tx, &ctx, header_id, request).await;
        finish(tx, "create_item", result).await
    }

    pub async fn update_item(&self, item_id: &str, update: &LineItemUpdate) -> LedgerResult<LineItem> {
        let ctx = self.context();
        let mut tx = self.pool.begin().await?;
        let result = lines::update_item(&mut *tx, &ctx, item_id, update).await;
        finish(tx, "update_item", result).await
    }

    /// Removes a line; returns its header with recalculated totals.
    pub async fn delete_item(&self, item_id: &str) -> LedgerResult<Header> {
        let ctx = self.context();
        let mut tx = self.pool.begin().await?;
        let result = lines::delete_item(&mut *tx, &ctx, item_id).await;
        finish(tx, "delete_item", result).await
    }

    // =========================================================================
    // Totals & Reports
    // =========================================================================

    /// Re-derives a header's totals from its lines and syncs its reports.
    pub async fn recalculate(&self, header_id: &str) -> LedgerResult<Header> {
        let ctx = self.context();
        let mut tx = self.pool.begin().await?;
        let result = recalc::recalculate(&mut *tx, &ctx, header_id).await;
        finish(tx, "recalculate", result).await
    }

    pub async fn sync_report(&self, header_id: &str) -> LedgerResult<TransactionReport> {
        let mut tx = self.pool.begin().await?;
        let result = reports::sync_report_by_id(&mut *tx, header_id).await;
        finish(tx, "sync_report", result).await
    }

    /// Σ stock × purchase price over the branch's products.
    pub async fn asset_value(&self, branch_id: &str) -> LedgerResult<Money> {
        let mut conn = self.pool.acquire().await?;
        reports::asset_value(&mut *conn, branch_id).await
    }

    /// Checks a prospective return without writing anything.
    pub async fn validate_return(
        &self,
        origin_id: &str,
        product_id: &str,
        qty: i64,
    ) -> LedgerResult<LineItem> {
        let mut conn = self.pool.acquire().await?;
        returns::validate_return(&mut *conn, origin_id, product_id, qty).await
    }

    // =========================================================================
    // Unit Conversions
    // =========================================================================

    pub async fn create_conversion(&self, request: &NewUnitConversion) -> LedgerResult<UnitConversion> {
        let ctx = self.context();
        let mut tx = self.pool.begin().await?;
        let result = conversion::create_conversion(&mut *tx, &ctx, request).await;
        finish(tx, "create_conversion", result).await
    }

    pub async fn update_conversion(&self, id: &str, value_conv: i64) -> LedgerResult<UnitConversion> {
        let mut tx = self.pool.begin().await?;
        let result = conversion::update_conversion(&mut *tx, id, value_conv).await;
        finish(tx, "update_conversion", result).await
    }

    pub async fn delete_conversion(&self, id: &str) -> LedgerResult<()> {
        let mut tx = self.pool.begin().await?;
        let result = conversion::delete_conversion(&mut *tx, id).await;
        finish(tx, "delete_conversion", result).await
    }

    pub async fn list_conversions(&self, product_id: &str) -> LedgerResult<Vec<UnitConversion>> {
        let mut conn = self.pool.acquire().await?;
        conversion::list_conversions(&mut *conn, product_id).await
    }

    pub async fn priced_units(&self, product_id: &str) -> LedgerResult<Vec<PricedUnit>> {
        let mut conn = self.pool.acquire().await?;
        conversion::priced_units(&mut *conn, product_id).await
    }

    // =========================================================================
    // Cleanup
    // =========================================================================

    /// Sweeps headers left empty past the configured grace period.
    pub async fn cleanup(&self) -> LedgerResult<CleanupSummary> {
        self.cleanup_older_than(self.options.cleanup_grace).await
    }

    pub async fn cleanup_older_than(&self, grace: Duration) -> LedgerResult<CleanupSummary> {
        let ctx = self.context();
        cleanup::run(&self.pool, &ctx, grace).await
    }

    /// Runs after the header transaction has committed; a failed sweep
    /// never fails the write that triggered it.
    async fn after_header_write(&self) {
        if !self.options.cleanup_after_writes {
            return;
        }
        if let Err(err) = self.cleanup().await {
            warn!(error = %err, "Cleanup after header write failed");
        }
    }
}

/// Commits `tx` if `result` is `Ok`, otherwise rolls it back and hands
/// the error back unchanged.
pub(crate) async fn finish<T>(
    tx: Transaction<'static, Sqlite>,
    operation: &str,
    result: LedgerResult<T>,
) -> LedgerResult<T> {
    match result {
        Ok(value) => {
            tx.commit().await?;
            info!(operation, "Ledger transaction committed");
            Ok(value)
        }
        Err(err) => {
            warn!(operation, code = err.kind().code(), error = %err, "Ledger transaction rolled back");
            if let Err(rollback) = tx.rollback().await {
                error!(operation, error = %rollback, "Rollback failed");
            }
            Err(err)
        }
    }
}

/// Runs [`Ledger::cleanup`] every `every` until the handle is aborted.
pub fn spawn_cleanup_task(ledger: Ledger, every: StdDuration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(interval_secs = every.as_secs(), "Cleanup task started");

        loop {
            ticker.tick().await;
            if let Err(err) = ledger.cleanup().await {
                warn!(error = %err, "Scheduled cleanup failed");
            }
        }
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::ledger::fixtures::{Fixture, BOX_UNIT};
    use ledger_core::{SubscriptionType, TransactionKind};

    #[tokio::test]
    async fn test_purchase_in_box_units() {
        let fx = Fixture::new().await;
        let purchase = fx
            .purchase(&[NewLineItem::new(&fx.product_id, 2).in_unit(BOX_UNIT)])
            .await;

        let line = &purchase.items[0];
        assert_eq!(line.unit_id, BOX_UNIT);
        assert_eq!(line.base_qty, 24);
        assert_eq!(line.price.minor(), 12_000);
        assert_eq!(line.sub_total.minor(), 24_000);
        assert_eq!(purchase.header.total.minor(), 24_000);
        assert_eq!(fx.stock(&fx.product_id).await, 24);

        let report = fx.db.reports().transaction_report(&purchase.header.id).await.unwrap().unwrap();
        assert_eq!(report.total.minor(), 24_000);
        assert_eq!(report.transaction_type, TransactionKind::Purchase);
    }

    #[tokio::test]
    async fn test_oversold_sale_leaves_nothing_behind() {
        let fx = Fixture::new().await;
        let ledger = fx.ledger();
        fx.restock(&fx.product_id, 5).await;

        let request = NewTransaction {
            header: NewHeader::new(TransactionKind::Sale, &fx.branch_id, &fx.user_id),
            items: vec![NewLineItem::new(&fx.product_id, 6)],
        };
        let err = ledger.create_transaction(&request).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientStock);

        assert_eq!(fx.stock(&fx.product_id).await, 5);
        let sales = fx.db.headers().list(&fx.branch_id, TransactionKind::Sale).await.unwrap();
        assert!(sales.is_empty());
        assert!(fx.db.reports().transaction_reports(&fx.branch_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cumulative_returns_bounded_by_purchase() {
        let fx = Fixture::new().await;
        let ledger = fx.ledger();
        let purchase = fx.purchase(&[NewLineItem::new(&fx.product_id, 10)]).await;

        let first = ledger
            .create_transaction(&NewTransaction {
                header: NewHeader::new(TransactionKind::BuyReturn, &fx.branch_id, &fx.user_id)
                    .with_origin(&purchase.header.id),
                items: vec![NewLineItem::new(&fx.product_id, 4)],
            })
            .await
            .unwrap();
        assert_eq!(first.items[0].price.minor(), 1000);
        assert_eq!(first.header.total.minor(), 4000);
        assert_eq!(fx.stock(&fx.product_id).await, 6);

        let err = ledger
            .create_transaction(&NewTransaction {
                header: NewHeader::new(TransactionKind::BuyReturn, &fx.branch_id, &fx.user_id)
                    .with_origin(&purchase.header.id),
                items: vec![NewLineItem::new(&fx.product_id, 7)],
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ReturnExceedsOriginal);
        assert_eq!(fx.stock(&fx.product_id).await, 6);

        // Editing the first return may use its own share of the bound.
        let edited = ledger
            .update_item(&first.items[0].id, &LineItemUpdate::qty(10))
            .await
            .unwrap();
        assert_eq!(edited.qty, 10);
        assert_eq!(fx.stock(&fx.product_id).await, 0);
    }

    #[tokio::test]
    async fn test_buy_return_follows_origin_box_unit() {
        let fx = Fixture::new().await;
        let ledger = fx.ledger();
        let purchase = fx
            .purchase(&[NewLineItem::new(&fx.product_id, 2).in_unit(BOX_UNIT)])
            .await;
        assert_eq!(fx.stock(&fx.product_id).await, 24);

        let buy_return = |qty: i64| NewTransaction {
            header: NewHeader::new(TransactionKind::BuyReturn, &fx.branch_id, &fx.user_id)
                .with_origin(&purchase.header.id),
            items: vec![NewLineItem::new(&fx.product_id, qty)],
        };

        let first = ledger.create_transaction(&buy_return(1)).await.unwrap();
        let line = &first.items[0];
        assert_eq!(line.unit_id, BOX_UNIT);
        assert_eq!(line.base_qty, 12);
        assert_eq!(line.price.minor(), 12_000);
        assert_eq!(first.header.total.minor(), 12_000);
        assert_eq!(fx.stock(&fx.product_id).await, 12);

        let err = ledger.create_transaction(&buy_return(2)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ReturnExceedsOriginal);
        assert_eq!(fx.stock(&fx.product_id).await, 12);
    }

    #[tokio::test]
    async fn test_sale_return_restores_stock_at_sale_price() {
        let fx = Fixture::new().await;
        let ledger = fx.ledger();
        fx.restock(&fx.product_id, 10).await;
        let sale = fx.sale(&[NewLineItem::new(&fx.product_id, 3)]).await;

        let refund = ledger
            .create_transaction(&NewTransaction {
                header: NewHeader::new(TransactionKind::SaleReturn, &fx.branch_id, &fx.user_id)
                    .with_origin(&sale.header.id),
                items: vec![NewLineItem::new(&fx.product_id, 2)],
            })
            .await
            .unwrap();

        assert_eq!(refund.items[0].price.minor(), 1500);
        assert_eq!(refund.header.total.minor(), 3000);
        assert_eq!(fx.stock(&fx.product_id).await, 9);

        ledger.delete_header(&refund.header.id).await.unwrap();
        assert_eq!(fx.stock(&fx.product_id).await, 7);
    }

    #[tokio::test]
    async fn test_daily_profit_accumulates_per_bucket() {
        let fx = Fixture::new().await;
        let ledger = fx.ledger();
        fx.purchase(&[
            NewLineItem::new(&fx.product_id, 10).at_price(Money::from_minor(1500)),
            NewLineItem::new(&fx.second_product_id, 10),
        ])
        .await;
        fx.db
            .products()
            .set_sales_price(&fx.product_id, Money::from_minor(2500))
            .await
            .unwrap();

        let today = fx.clock.today();
        let reports = fx.db.reports();
        assert!(reports.daily_profit(today, &fx.branch_id, &fx.user_id).await.unwrap().is_none());

        let first = fx.sale(&[NewLineItem::new(&fx.product_id, 2)]).await;
        assert_eq!(first.header.total.minor(), 5000);
        assert_eq!(first.header.profit.minor(), 2000);

        let bucket = reports.daily_profit(today, &fx.branch_id, &fx.user_id).await.unwrap().unwrap();
        assert_eq!((bucket.total_sales.minor(), bucket.profit_estimate.minor()), (5000, 2000));

        let second = fx.sale(&[NewLineItem::new(&fx.second_product_id, 1)]).await;
        assert_eq!(second.header.total.minor(), 3000);
        assert_eq!(second.header.profit.minor(), 1000);

        let bucket = reports.daily_profit(today, &fx.branch_id, &fx.user_id).await.unwrap().unwrap();
        assert_eq!((bucket.total_sales.minor(), bucket.profit_estimate.minor()), (8000, 3000));

        // Edits correct the bucket instead of adding to it.
        ledger
            .update_item(&second.items[0].id, &LineItemUpdate::qty(2))
            .await
            .unwrap();
        ledger.recalculate(&second.header.id).await.unwrap();
        let bucket = reports.daily_profit(today, &fx.branch_id, &fx.user_id).await.unwrap().unwrap();
        assert_eq!((bucket.total_sales.minor(), bucket.profit_estimate.minor()), (11_000, 4000));

        // Moving a sale to another day moves its share with it.
        let moved = ledger
            .update_header(
                &second.header.id,
                &HeaderUpdate {
                    txn_date: Some("2026-03-01".to_string()),
                    ..HeaderUpdate::default()
                },
            )
            .await
            .unwrap();
        let bucket = reports.daily_profit(today, &fx.branch_id, &fx.user_id).await.unwrap().unwrap();
        assert_eq!(bucket.total_sales.minor(), 5000);
        let other = reports
            .daily_profit(moved.txn_date, &fx.branch_id, &fx.user_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(other.total_sales.minor(), 6000);

        ledger.delete_header(&first.header.id).await.unwrap();
        assert!(reports.daily_profit(today, &fx.branch_id, &fx.user_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_abandoned_header_swept_after_next_write() {
        let fx = Fixture::new().await;
        let ledger = fx.ledger();

        let abandoned = ledger
            .create_header(&NewHeader::new(TransactionKind::Sale, &fx.branch_id, &fx.user_id))
            .await
            .unwrap();
        let kept = fx.purchase(&[NewLineItem::new(&fx.product_id, 1)]).await;

        fx.clock.advance(Duration::minutes(DEFAULT_CLEANUP_GRACE_MINUTES + 1));
        ledger
            .create_header(&NewHeader::new(TransactionKind::Purchase, &fx.branch_id, &fx.user_id))
            .await
            .unwrap();

        let headers = fx.db.headers();
        assert!(headers.get_by_id(&abandoned.id).await.unwrap().is_none());
        assert!(fx.db.reports().transaction_report(&abandoned.id).await.unwrap().is_none());
        assert!(headers.get_by_id(&kept.header.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_quota_is_refunded_by_rollback() {
        let fx = Fixture::new().await;
        let ledger = fx.ledger();
        fx.db
            .branches()
            .set_subscription(&fx.branch_id, SubscriptionType::Quota, 1)
            .await
            .unwrap();

        let oversold = NewTransaction {
            header: NewHeader::new(TransactionKind::Sale, &fx.branch_id, &fx.user_id),
            items: vec![NewLineItem::new(&fx.product_id, 1)],
        };
        let err = ledger.create_transaction(&oversold).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientStock);

        fx.purchase(&[NewLineItem::new(&fx.product_id, 1)]).await;
        let err = ledger
            .create_header(&NewHeader::new(TransactionKind::Sale, &fx.branch_id, &fx.user_id))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::QuotaExceeded);
        assert_eq!(err.to_response().code.code(), "QUOTA_EXCEEDED");
    }

    #[tokio::test]
    async fn test_recalculate_and_sync_are_idempotent() {
        let fx = Fixture::new().await;
        let ledger = fx.ledger();
        let purchase = fx
            .purchase(&[
                NewLineItem::new(&fx.product_id, 3),
                NewLineItem::new(&fx.second_product_id, 2),
            ])
            .await;

        let once = ledger.recalculate(&purchase.header.id).await.unwrap();
        let twice = ledger.recalculate(&purchase.header.id).await.unwrap();
        assert_eq!(once.total, twice.total);
        assert_eq!(once.total.minor(), 7000);

        let a = ledger.sync_report(&purchase.header.id).await.unwrap();
        let b = ledger.sync_report(&purchase.header.id).await.unwrap();
        assert_eq!(a.total, b.total);
        assert_eq!(a.created_at, b.created_at);
        assert_eq!(fx.db.reports().transaction_reports(&fx.branch_id).await.unwrap().len(), 1);
        assert_eq!(fx.stock(&fx.product_id).await, 3);
    }

    #[tokio::test]
    async fn test_asset_value_and_conversion_crud() {
        let fx = Fixture::new().await;
        let ledger = fx.ledger();
        fx.purchase(&[
            NewLineItem::new(&fx.product_id, 1).in_unit(BOX_UNIT),
            NewLineItem::new(&fx.second_product_id, 2),
        ])
        .await;

        let value = ledger.asset_value(&fx.branch_id).await.unwrap();
        assert_eq!(value.minor(), 12 * 1000 + 2 * 2000);

        let units = ledger.priced_units(&fx.product_id).await.unwrap();
        assert_eq!(units.len(), 2);
        assert_eq!(units[1].price.minor(), 12_000);

        let updated = ledger.update_conversion(&fx.box_conversion_id, 10).await.unwrap();
        assert_eq!(updated.value_conv, 10);
        ledger.delete_conversion(&fx.box_conversion_id).await.unwrap();
        assert!(ledger.list_conversions(&fx.product_id).await.unwrap().is_empty());

        let err = ledger.delete_conversion(&fx.box_conversion_id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_cleanup_task_runs_on_interval() {
        let fx = Fixture::new().await;
        let ledger = fx.ledger().with_options(LedgerOptions {
            cleanup_grace: Duration::minutes(1),
            cleanup_after_writes: false,
        });
        let abandoned = ledger
            .create_header(&NewHeader::new(TransactionKind::Opname, &fx.branch_id, &fx.user_id))
            .await
            .unwrap();
        fx.clock.advance(Duration::minutes(2));

        let handle = spawn_cleanup_task(ledger.clone(), StdDuration::from_millis(10));
        let mut gone = false;
        for _ in 0..50 {
            tokio::time::sleep(StdDuration::from_millis(10)).await;
            if fx.db.headers().get_by_id(&abandoned.id).await.unwrap().is_none() {
                gone = true;
                break;
            }
        }
        handle.abort();
        assert!(gone);
    }
}
