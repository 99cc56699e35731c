//! # Header Recalculation
//!
//! Re-derives a header's total (and sale profit) from its live lines,
//! writes it back, then syncs the reports that depend on it. Calling it
//! twice with no line change in between yields the same totals.

use sqlx::SqliteConnection;
use tracing::debug;

use super::{load_header, reports, LedgerContext};
use crate::error::LedgerResult;
use crate::repository::{header, item};
use ledger_core::{Header, HeaderTotals, TransactionKind};

pub async fn recalculate(
    conn: &mut SqliteConnection,
    ctx: &LedgerContext<'_>,
    header_id: &str,
) -> LedgerResult<Header> {
    let mut header = load_header(conn, header_id).await?;
    let lines = item::list_for_header(conn, header_id).await?;

    let totals = HeaderTotals::compute(header.kind, &lines, header.discount);
    let now = ctx.now();
    header::write_totals(conn, header_id, totals.total, totals.profit, now).await?;

    header.total = totals.total;
    header.profit = totals.profit;
    header.updated_at = now;

    debug!(
        header_id = %header_id,
        kind = %header.kind,
        lines = lines.len(),
        total = %header.total,
        "Header recalculated"
    );

    reports::sync_report(conn, &header).await?;
    if header.kind == TransactionKind::Sale {
        reports::sync_daily_profit(conn, ctx, header.txn_date, &header.branch_id, &header.user_id)
            .await?;
    }

    Ok(header)
}
