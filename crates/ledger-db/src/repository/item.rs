//! # Line Item Repository

use sqlx::SqliteConnection;

use crate::error::{DbError, DbResult};
use ledger_core::{LineItem, TransactionKind};

const ITEM_COLUMNS: &str = "id, header_id, product_id, unit_id, qty, base_qty, price, cost_price, \
                            sub_total, qty_exist, sub_total_exist, expired_date, created_at, updated_at";

pub(crate) async fn insert_item(conn: &mut SqliteConnection, item: &LineItem) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO ledger_items (
            id, header_id, product_id, unit_id, qty, base_qty, price, cost_price,
            sub_total, qty_exist, sub_total_exist, expired_date, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
        "#,
    )
    .bind(&item.id)
    .bind(&item.header_id)
    .bind(&item.product_id)
    .bind(&item.unit_id)
    .bind(item.qty)
    .bind(item.base_qty)
    .bind(item.price)
    .bind(item.cost_price)
    .bind(item.sub_total)
    .bind(item.qty_exist)
    .bind(item.sub_total_exist)
    .bind(item.expired_date)
    .bind(item.created_at)
    .bind(item.updated_at)
    .execute(conn)
    .await?;

    Ok(())
}

/// Rewrites every mutable column of an existing line.
pub(crate) async fn write_item(conn: &mut SqliteConnection, item: &LineItem) -> DbResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE ledger_items SET
            unit_id = ?2,
            qty = ?3,
            base_qty = ?4,
            price = ?5,
            cost_price = ?6,
            sub_total = ?7,
            qty_exist = ?8,
            sub_total_exist = ?9,
            expired_date = ?10,
            updated_at = ?11
        WHERE id = ?1
        "#,
    )
    .bind(&item.id)
    .bind(&item.unit_id)
    .bind(item.qty)
    .bind(item.base_qty)
    .bind(item.price)
    .bind(item.cost_price)
    .bind(item.sub_total)
    .bind(item.qty_exist)
    .bind(item.sub_total_exist)
    .bind(item.expired_date)
    .bind(item.updated_at)
    .execute(conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("LineItem", &item.id));
    }

    Ok(())
}

pub(crate) async fn fetch_item(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<LineItem>> {
    let item = sqlx::query_as::<_, LineItem>(&format!(
        "SELECT {} FROM ledger_items WHERE id = ?1",
        ITEM_COLUMNS
    ))
    .bind(id)
    .fetch_optional(conn)
    .await?;

    Ok(item)
}

/// The line for `product_id` under `header_id`, if one exists.
pub(crate) async fn find_for_product(
    conn: &mut SqliteConnection,
    header_id: &str,
    product_id: &str,
) -> DbResult<Option<LineItem>> {
    let item = sqlx::query_as::<_, LineItem>(&format!(
        "SELECT {} FROM ledger_items WHERE header_id = ?1 AND product_id = ?2 \
         ORDER BY created_at LIMIT 1",
        ITEM_COLUMNS
    ))
    .bind(header_id)
    .bind(product_id)
    .fetch_optional(conn)
    .await?;

    Ok(item)
}

pub(crate) async fn list_for_header(
    conn: &mut SqliteConnection,
    header_id: &str,
) -> DbResult<Vec<LineItem>> {
    let items = sqlx::query_as::<_, LineItem>(&format!(
        "SELECT {} FROM ledger_items WHERE header_id = ?1 ORDER BY created_at, id",
        ITEM_COLUMNS
    ))
    .bind(header_id)
    .fetch_all(conn)
    .await?;

    Ok(items)
}

pub(crate) async fn delete_item(conn: &mut SqliteConnection, id: &str) -> DbResult<()> {
    let result = sqlx::query("DELETE FROM ledger_items WHERE id = ?1")
        .bind(id)
        .execute(conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("LineItem", id));
    }

    Ok(())
}

/// Σ qty of `product_id` already returned against `origin_id`.
///
/// ## Arguments
/// * `return_kind` - `BuyReturn` for purchases, `SaleReturn` for sales
/// * `excluding` - A line to leave out (the one being edited)
pub(crate) async fn returned_qty(
    conn: &mut SqliteConnection,
    origin_id: &str,
    product_id: &str,
    return_kind: TransactionKind,
    excluding: Option<&str>,
) -> DbResult<i64> {
    let qty: i64 = sqlx::query_scalar(
        r#"
        SELECT COALESCE(SUM(i.qty), 0)
        FROM ledger_items i
        JOIN ledger_headers h ON h.id = i.header_id
        WHERE h.origin_id = ?1
          AND h.kind = ?2
          AND i.product_id = ?3
          AND (?4 IS NULL OR i.id <> ?4)
        "#,
    )
    .bind(origin_id)
    .bind(return_kind)
    .bind(product_id)
    .bind(excluding)
    .fetch_one(conn)
    .await?;

    Ok(qty)
}

pub(crate) async fn count_for_header(conn: &mut SqliteConnection, header_id: &str) -> DbResult<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM ledger_items WHERE header_id = ?1")
        .bind(header_id)
        .fetch_one(conn)
        .await?;

    Ok(count)
}
