//! # Header Repository
//!
//! One table serves all six transaction kinds; `kind` discriminates.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use super::item;
use crate::error::{DbError, DbResult};
use ledger_core::{Header, HeaderWithItems, Money, TransactionKind};

const HEADER_COLUMNS: &str = "id, kind, branch_id, user_id, txn_date, description, origin_id, \
                              supplier_id, member_id, discount, total, profit, payment, \
                              created_at, updated_at";

pub(crate) async fn insert_header(conn: &mut SqliteConnection, header: &Header) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO ledger_headers (
            id, kind, branch_id, user_id, txn_date, description, origin_id,
            supplier_id, member_id, discount, total, profit, payment, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
        "#,
    )
    .bind(&header.id)
    .bind(header.kind)
    .bind(&header.branch_id)
    .bind(&header.user_id)
    .bind(header.txn_date)
    .bind(&header.description)
    .bind(&header.origin_id)
    .bind(&header.supplier_id)
    .bind(&header.member_id)
    .bind(header.discount)
    .bind(header.total)
    .bind(header.profit)
    .bind(header.payment)
    .bind(header.created_at)
    .bind(header.updated_at)
    .execute(conn)
    .await?;

    Ok(())
}

pub(crate) async fn fetch_header(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Header>> {
    let header = sqlx::query_as::<_, Header>(&format!(
        "SELECT {} FROM ledger_headers WHERE id = ?1",
        HEADER_COLUMNS
    ))
    .bind(id)
    .fetch_optional(conn)
    .await?;

    Ok(header)
}

pub(crate) async fn write_totals(
    conn: &mut SqliteConnection,
    id: &str,
    total: Money,
    profit: Money,
    now: DateTime<Utc>,
) -> DbResult<()> {
    let result = sqlx::query(
        "UPDATE ledger_headers SET total = ?2, profit = ?3, updated_at = ?4 WHERE id = ?1",
    )
    .bind(id)
    .bind(total)
    .bind(profit)
    .bind(now)
    .execute(conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Header", id));
    }

    Ok(())
}

/// Persists the editable fields of `header`.
pub(crate) async fn write_fields(conn: &mut SqliteConnection, header: &Header) -> DbResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE ledger_headers SET
            txn_date = ?2,
            description = ?3,
            discount = ?4,
            payment = ?5,
            updated_at = ?6,
            supplier_id = ?7,
            member_id = ?8
        WHERE id = ?1
        "#,
    )
    .bind(&header.id)
    .bind(header.txn_date)
    .bind(&header.description)
    .bind(header.discount)
    .bind(header.payment)
    .bind(header.updated_at)
    .bind(&header.supplier_id)
    .bind(&header.member_id)
    .execute(conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Header", &header.id));
    }

    Ok(())
}

pub(crate) async fn delete_header(conn: &mut SqliteConnection, id: &str) -> DbResult<()> {
    let result = sqlx::query("DELETE FROM ledger_headers WHERE id = ?1")
        .bind(id)
        .execute(conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Header", id));
    }

    Ok(())
}

/// Number of return headers that reference `origin_id`.
pub(crate) async fn count_returns_against(conn: &mut SqliteConnection, origin_id: &str) -> DbResult<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM ledger_headers WHERE origin_id = ?1")
        .bind(origin_id)
        .fetch_one(conn)
        .await?;

    Ok(count)
}

/// Ids of `kind` headers created before `cutoff` that have no line items.
pub(crate) async fn orphan_ids(
    conn: &mut SqliteConnection,
    kind: TransactionKind,
    cutoff: DateTime<Utc>,
) -> DbResult<Vec<String>> {
    let ids = sqlx::query_scalar::<_, String>(
        r#"
        SELECT h.id FROM ledger_headers h
        WHERE h.kind = ?1
          AND h.created_at < ?2
          AND NOT EXISTS (SELECT 1 FROM ledger_items i WHERE i.header_id = h.id)
        ORDER BY h.created_at
        "#,
    )
    .bind(kind)
    .bind(cutoff)
    .fetch_all(conn)
    .await?;

    Ok(ids)
}

/// Sale headers in one (date, branch, user) bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, sqlx::FromRow)]
pub(crate) struct SaleBucket {
    pub sales: i64,
    pub total: Money,
    pub profit: Money,
}

pub(crate) async fn sale_bucket(
    conn: &mut SqliteConnection,
    date: NaiveDate,
    branch_id: &str,
    user_id: &str,
) -> DbResult<SaleBucket> {
    let bucket = sqlx::query_as::<_, SaleBucket>(
        r#"
        SELECT
            COUNT(*) AS sales,
            COALESCE(SUM(total), 0) AS total,
            COALESCE(SUM(profit), 0) AS profit
        FROM ledger_headers
        WHERE kind = ?1 AND txn_date = ?2 AND branch_id = ?3 AND user_id = ?4
        "#,
    )
    .bind(TransactionKind::Sale)
    .bind(date)
    .bind(branch_id)
    .bind(user_id)
    .fetch_one(conn)
    .await?;

    Ok(bucket)
}

/// Read access to headers outside a ledger transaction.
#[derive(Debug, Clone)]
pub struct HeaderRepository {
    pool: SqlitePool,
}

impl HeaderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        HeaderRepository { pool }
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Header>> {
        let mut conn = self.pool.acquire().await?;
        fetch_header(&mut conn, id).await
    }

    /// Header plus its live lines.
    pub async fn get_with_items(&self, id: &str) -> DbResult<Option<HeaderWithItems>> {
        let mut conn = self.pool.acquire().await?;
        let Some(header) = fetch_header(&mut conn, id).await? else {
            return Ok(None);
        };
        let items = item::list_for_header(&mut conn, id).await?;
        Ok(Some(HeaderWithItems { header, items }))
    }

    /// Headers of one kind for a branch, newest first.
    pub async fn list(&self, branch_id: &str, kind: TransactionKind) -> DbResult<Vec<Header>> {
        debug!(branch_id = %branch_id, kind = %kind, "Listing headers");

        let headers = sqlx::query_as::<_, Header>(&format!(
            "SELECT {} FROM ledger_headers WHERE branch_id = ?1 AND kind = ?2 \
             ORDER BY txn_date DESC, created_at DESC",
            HEADER_COLUMNS
        ))
        .bind(branch_id)
        .bind(kind)
        .fetch_all(&self.pool)
        .await?;

        Ok(headers)
    }

    /// Headers of `kind` dated within `[from, to]`.
    pub async fn list_between(
        &self,
        branch_id: &str,
        kind: TransactionKind,
        from: NaiveDate,
        to: NaiveDate,
    ) -> DbResult<Vec<Header>> {
        let headers = sqlx::query_as::<_, Header>(&format!(
            "SELECT {} FROM ledger_headers \
             WHERE branch_id = ?1 AND kind = ?2 AND txn_date BETWEEN ?3 AND ?4 \
             ORDER BY txn_date, created_at",
            HEADER_COLUMNS
        ))
        .bind(branch_id)
        .bind(kind)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(headers)
    }
}
