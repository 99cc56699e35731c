//! # Report Repository
//!
//! Storage for the two derived aggregates. Both writes are idempotent
//! upserts keyed on the aggregate's natural key:
//!
//! ```text
//! transaction_reports   ON CONFLICT (id)                          header id
//! daily_profit_reports  ON CONFLICT (report_date, branch_id, user_id)
//! ```

use chrono::NaiveDate;
use sqlx::{SqliteConnection, SqlitePool};

use crate::error::DbResult;
use ledger_core::{DailyProfitReport, TransactionReport};

const TRANSACTION_REPORT_COLUMNS: &str =
    "id, transaction_type, branch_id, user_id, total, payment, created_at, updated_at";

const DAILY_PROFIT_COLUMNS: &str =
    "id, report_date, branch_id, user_id, total_sales, profit_estimate, created_at, updated_at";

/// Inserts the row, or refreshes total, payment and updated_at if the id
/// already exists. Type, branch, user and created_at are never rewritten.
pub(crate) async fn upsert_transaction_report(
    conn: &mut SqliteConnection,
    report: &TransactionReport,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO transaction_reports (
            id, transaction_type, branch_id, user_id, total, payment, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        ON CONFLICT (id) DO UPDATE SET
            total = excluded.total,
            payment = excluded.payment,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(&report.id)
    .bind(report.transaction_type)
    .bind(&report.branch_id)
    .bind(&report.user_id)
    .bind(report.total)
    .bind(report.payment)
    .bind(report.created_at)
    .bind(report.updated_at)
    .execute(conn)
    .await?;

    Ok(())
}

/// Removes the row for `id`. Missing rows are not an error.
pub(crate) async fn delete_transaction_report(conn: &mut SqliteConnection, id: &str) -> DbResult<u64> {
    let result = sqlx::query("DELETE FROM transaction_reports WHERE id = ?1")
        .bind(id)
        .execute(conn)
        .await?;

    Ok(result.rows_affected())
}

pub(crate) async fn fetch_transaction_report(
    conn: &mut SqliteConnection,
    id: &str,
) -> DbResult<Option<TransactionReport>> {
    let report = sqlx::query_as::<_, TransactionReport>(&format!(
        "SELECT {} FROM transaction_reports WHERE id = ?1",
        TRANSACTION_REPORT_COLUMNS
    ))
    .bind(id)
    .fetch_optional(conn)
    .await?;

    Ok(report)
}

/// Writes the bucket totals, replacing whatever the bucket held.
pub(crate) async fn upsert_daily_profit(
    conn: &mut SqliteConnection,
    report: &DailyProfitReport,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO daily_profit_reports (
            id, report_date, branch_id, user_id, total_sales, profit_estimate, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        ON CONFLICT (report_date, branch_id, user_id) DO UPDATE SET
            total_sales = excluded.total_sales,
            profit_estimate = excluded.profit_estimate,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(&report.id)
    .bind(report.report_date)
    .bind(&report.branch_id)
    .bind(&report.user_id)
    .bind(report.total_sales)
    .bind(report.profit_estimate)
    .bind(report.created_at)
    .bind(report.updated_at)
    .execute(conn)
    .await?;

    Ok(())
}

pub(crate) async fn delete_daily_profit(
    conn: &mut SqliteConnection,
    date: NaiveDate,
    branch_id: &str,
    user_id: &str,
) -> DbResult<u64> {
    let result = sqlx::query(
        "DELETE FROM daily_profit_reports WHERE report_date = ?1 AND branch_id = ?2 AND user_id = ?3",
    )
    .bind(date)
    .bind(branch_id)
    .bind(user_id)
    .execute(conn)
    .await?;

    Ok(result.rows_affected())
}

pub(crate) async fn fetch_daily_profit(
    conn: &mut SqliteConnection,
    date: NaiveDate,
    branch_id: &str,
    user_id: &str,
) -> DbResult<Option<DailyProfitReport>> {
    let report = sqlx::query_as::<_, DailyProfitReport>(&format!(
        "SELECT {} FROM daily_profit_reports \
         WHERE report_date = ?1 AND branch_id = ?2 AND user_id = ?3",
        DAILY_PROFIT_COLUMNS
    ))
    .bind(date)
    .bind(branch_id)
    .bind(user_id)
    .fetch_optional(conn)
    .await?;

    Ok(report)
}

/// Read access to the derived reports.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    pub async fn transaction_report(&self, header_id: &str) -> DbResult<Option<TransactionReport>> {
        let mut conn = self.pool.acquire().await?;
        fetch_transaction_report(&mut conn, header_id).await
    }

    /// Every ledger row for a branch, oldest first.
    pub async fn transaction_reports(&self, branch_id: &str) -> DbResult<Vec<TransactionReport>> {
        let reports = sqlx::query_as::<_, TransactionReport>(&format!(
            "SELECT {} FROM transaction_reports WHERE branch_id = ?1 ORDER BY created_at, id",
            TRANSACTION_REPORT_COLUMNS
        ))
        .bind(branch_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(reports)
    }

    pub async fn daily_profit(
        &self,
        date: NaiveDate,
        branch_id: &str,
        user_id: &str,
    ) -> DbResult<Option<DailyProfitReport>> {
        let mut conn = self.pool.acquire().await?;
        fetch_daily_profit(&mut conn, date, branch_id, user_id).await
    }

    /// Daily rows for a branch within `[from, to]`, all users.
    pub async fn daily_profits(
        &self,
        branch_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> DbResult<Vec<DailyProfitReport>> {
        let reports = sqlx::query_as::<_, DailyProfitReport>(&format!(
            "SELECT {} FROM daily_profit_reports \
             WHERE branch_id = ?1 AND report_date BETWEEN ?2 AND ?3 \
             ORDER BY report_date, user_id",
            DAILY_PROFIT_COLUMNS
        ))
        .bind(branch_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(reports)
    }
}
