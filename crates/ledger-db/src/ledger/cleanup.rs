//! # Abandoned Header Cleanup
//!
//! A header that was opened but never received a line within the grace
//! period is removed, together with its report row.
//!
//! ```text
//! for kind in TransactionKind::ALL
//!   ids = headers of kind, created_at < now - grace, no lines
//!   for id in ids
//!     begin ─► re-check (still empty, not referenced) ─► drop report
//!           ─► drop header ─► rebuild daily bucket (sales) ─► commit
//! ```
//!
//! Each header gets its own transaction; one failure is logged and the
//! sweep moves on.

use chrono::Duration;
use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use super::{reports, service::finish, LedgerContext};
use crate::error::LedgerResult;
use crate::repository::{header, item};
use ledger_core::TransactionKind;

/// Outcome of one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CleanupSummary {
    /// Candidates found by the scan.
    pub scanned: usize,
    pub deleted: usize,
    /// Gained a line or a referencing return since the scan.
    pub skipped: usize,
    pub failed: usize,
}

/// Removes every header older than `grace` that still has no lines.
pub async fn run(
    pool: &SqlitePool,
    ctx: &LedgerContext<'_>,
    grace: Duration,
) -> LedgerResult<CleanupSummary> {
    let cutoff = ctx.now() - grace;
    let mut summary = CleanupSummary::default();

    for kind in TransactionKind::ALL {
        // Connection goes back to the pool before any transaction opens.
        let ids = {
            let mut conn = pool.acquire().await?;
            header::orphan_ids(&mut conn, kind, cutoff).await?
        };

        for id in ids {
            summary.scanned += 1;

            let mut tx = pool.begin().await?;
            let result = purge_orphan(&mut *tx, ctx, &id).await;
            match finish(tx, "cleanup", result).await {
                Ok(true) => summary.deleted += 1,
                Ok(false) => summary.skipped += 1,
                Err(err) => {
                    summary.failed += 1;
                    warn!(header_id = %id, error = %err, "Failed to remove abandoned header");
                }
            }
        }
    }

    if summary.scanned > 0 {
        info!(
            scanned = summary.scanned,
            deleted = summary.deleted,
            skipped = summary.skipped,
            failed = summary.failed,
            %cutoff,
            "Abandoned header cleanup finished"
        );
    } else {
        debug!(%cutoff, "No abandoned headers");
    }

    Ok(summary)
}

/// Deletes `header_id` if it is still empty and unreferenced.
///
/// ## Returns
/// * `Ok(true)` - the header and its report row were removed
/// * `Ok(false)` - left in place (gone already, has lines, or referenced)
pub async fn purge_orphan(
    conn: &mut SqliteConnection,
    ctx: &LedgerContext<'_>,
    header_id: &str,
) -> LedgerResult<bool> {
    let Some(target) = header::fetch_header(conn, header_id).await? else {
        return Ok(false);
    };

    if item::count_for_header(conn, header_id).await? > 0 {
        debug!(header_id = %header_id, "Header gained lines, keeping it");
        return Ok(false);
    }
    if header::count_returns_against(conn, header_id).await? > 0 {
        debug!(header_id = %header_id, "Header referenced by a return, keeping it");
        return Ok(false);
    }

    reports::delete_report(conn, header_id).await?;
    header::delete_header(conn, header_id).await?;

    if target.kind == TransactionKind::Sale {
        reports::sync_daily_profit(conn, ctx, target.txn_date, &target.branch_id, &target.user_id)
            .await?;
    }

    debug!(header_id = %header_id, kind = %target.kind, "Abandoned header removed");
    Ok(true)
}
