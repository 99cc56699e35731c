//! # Report Synchronizer
//!
//! Keeps the two derived aggregates in step with their source headers,
//! inside the same transaction as the write that changed them.
//!
//! ```text
//! TransactionReport   upsert by header id; copies the header's
//!                     timestamps; type/branch/user/created_at are
//!                     written once, total/payment/updated_at follow
//!                     the header
//!
//! DailyProfitReport   recomputed from the sale headers in its
//!                     (date, branch, user) bucket:
//!                       total_sales     = Σ sale.total
//!                       profit_estimate = Σ sale.profit
//!                     a bucket with no sales left is removed
//! ```

use chrono::NaiveDate;
use sqlx::SqliteConnection;
use tracing::debug;

use super::{load_header, LedgerContext};
use crate::error::{LedgerError, LedgerResult};
use crate::repository::{header, product, report};
use ledger_core::{DailyProfitReport, Header, Money, TransactionReport, DAILY_PROFIT_PREFIX};

/// Upserts the ledger row for `header`.
pub async fn sync_report(
    conn: &mut SqliteConnection,
    header: &Header,
) -> LedgerResult<TransactionReport> {
    let row = TransactionReport {
        id: header.id.clone(),
        transaction_type: header.kind,
        branch_id: header.branch_id.clone(),
        user_id: header.user_id.clone(),
        total: header.total,
        payment: header.payment,
        created_at: header.created_at,
        updated_at: header.updated_at,
    };
    report::upsert_transaction_report(conn, &row).await?;

    debug!(header_id = %header.id, total = %header.total, "Transaction report synced");

    report::fetch_transaction_report(conn, &header.id)
        .await?
        .ok_or_else(|| LedgerError::not_found("TransactionReport", &header.id))
}

/// Reloads `header_id` and upserts its ledger row.
pub async fn sync_report_by_id(
    conn: &mut SqliteConnection,
    header_id: &str,
) -> LedgerResult<TransactionReport> {
    let header = load_header(conn, header_id).await?;
    sync_report(conn, &header).await
}

/// Drops the ledger row for `header_id`, if any.
pub async fn delete_report(conn: &mut SqliteConnection, header_id: &str) -> LedgerResult<bool> {
    let removed = report::delete_transaction_report(conn, header_id).await?;
    Ok(removed > 0)
}

/// Rebuilds one daily profit bucket from its sale headers.
///
/// ## Returns
/// * `Ok(Some(row))` - the bucket after the write
/// * `Ok(None)` - no sales remain; the bucket row was removed
pub async fn sync_daily_profit(
    conn: &mut SqliteConnection,
    ctx: &LedgerContext<'_>,
    date: NaiveDate,
    branch_id: &str,
    user_id: &str,
) -> LedgerResult<Option<DailyProfitReport>> {
    let bucket = header::sale_bucket(conn, date, branch_id, user_id).await?;

    if bucket.sales == 0 {
        let removed = report::delete_daily_profit(conn, date, branch_id, user_id).await?;
        if removed > 0 {
            debug!(%date, branch_id = %branch_id, user_id = %user_id, "Daily profit bucket emptied");
        }
        return Ok(None);
    }

    let now = ctx.now();
    let row = DailyProfitReport {
        id: ctx.next_id(DAILY_PROFIT_PREFIX),
        report_date: date,
        branch_id: branch_id.to_string(),
        user_id: user_id.to_string(),
        total_sales: bucket.total,
        profit_estimate: bucket.profit,
        created_at: now,
        updated_at: now,
    };
    report::upsert_daily_profit(conn, &row).await?;

    debug!(
        %date,
        branch_id = %branch_id,
        user_id = %user_id,
        sales = bucket.sales,
        total = %bucket.total,
        profit = %bucket.profit,
        "Daily profit synced"
    );

    Ok(report::fetch_daily_profit(conn, date, branch_id, user_id).await?)
}

/// Σ stock × purchase price across the branch's products.
pub async fn asset_value(conn: &mut SqliteConnection, branch_id: &str) -> LedgerResult<Money> {
    Ok(product::branch_asset_value(conn, branch_id).await?)
}
